use super::types::{CellValue, DataType};
use super::utils::is_date_string;

/// Classifies one cell by its representation. Text is tested for
/// date-parseability and otherwise stays `string`; numeric-looking text is
/// never coerced to `number`.
pub fn classify_value(value: &CellValue) -> DataType {
    match value {
        CellValue::Null => DataType::Null,
        CellValue::String(s) if is_date_string(s) => DataType::Date,
        CellValue::String(_) => DataType::String,
        CellValue::Date(_) => DataType::Date,
        CellValue::Number(_) => DataType::Number,
        CellValue::Bool(_) => DataType::Boolean,
        CellValue::Array(_) => DataType::Array,
        CellValue::Object(_) => DataType::Object,
    }
}

/// Most frequent classification across `values`, nulls included. On a tie
/// the type that appeared first in the column wins. An empty column is `null`.
pub fn infer_column_type<'a, I>(values: I) -> DataType
where
    I: IntoIterator<Item = &'a CellValue>,
{
    // (type, count) in first-seen order
    let mut tally: Vec<(DataType, usize)> = Vec::new();
    for value in values {
        let data_type = classify_value(value);
        match tally.iter_mut().find(|(t, _)| *t == data_type) {
            Some((_, count)) => *count += 1,
            None => tally.push((data_type, 1)),
        }
    }

    let mut best: Option<(DataType, usize)> = None;
    for (data_type, count) in tally {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((data_type, count)),
        }
    }

    best.map_or(DataType::Null, |(data_type, _)| data_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn classifies_every_variant() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(classify_value(&CellValue::Null), DataType::Null);
        assert_eq!(classify_value(&CellValue::Number(3.5)), DataType::Number);
        assert_eq!(classify_value(&CellValue::Bool(true)), DataType::Boolean);
        assert_eq!(classify_value(&s("hello")), DataType::String);
        assert_eq!(classify_value(&s("2024-01-02")), DataType::Date);
        assert_eq!(classify_value(&CellValue::Date(date)), DataType::Date);
        assert_eq!(classify_value(&CellValue::Array(vec![])), DataType::Array);
        assert_eq!(classify_value(&CellValue::Object(IndexMap::new())), DataType::Object);
    }

    #[test]
    fn numeric_text_is_not_coerced() {
        assert_eq!(classify_value(&s("42.5")), DataType::String);
        // a bare year parses as a date
        assert_eq!(classify_value(&s("2023")), DataType::Date);
    }

    #[test]
    fn picks_the_most_frequent_type() {
        let values = vec![
            CellValue::Number(1.0),
            s("a"),
            CellValue::Number(2.0),
            CellValue::Null,
        ];
        assert_eq!(infer_column_type(&values), DataType::Number);
    }

    #[test]
    fn nulls_can_dominate() {
        let values = vec![CellValue::Null, CellValue::Null, s("x")];
        assert_eq!(infer_column_type(&values), DataType::Null);
    }

    #[test]
    fn ties_go_to_the_first_seen_type() {
        let values = vec![s("a"), CellValue::Number(1.0), CellValue::Number(2.0), s("b")];
        assert_eq!(infer_column_type(&values), DataType::String);

        let values = vec![CellValue::Bool(true), s("a")];
        assert_eq!(infer_column_type(&values), DataType::Boolean);
    }

    #[test]
    fn empty_column_is_null() {
        let values: Vec<CellValue> = Vec::new();
        assert_eq!(infer_column_type(&values), DataType::Null);
    }

    #[test]
    fn inferred_type_has_maximal_frequency() {
        let columns = vec![
            vec![s("x"), CellValue::Null, CellValue::Number(1.0), CellValue::Number(4.0), s("y"), s("z")],
            vec![CellValue::Bool(false), CellValue::Bool(true), CellValue::Null],
            vec![s("2024-01-01"), s("nope"), s("2024-02-01")],
        ];
        for column in columns {
            let inferred = infer_column_type(&column);
            let freq = |t: DataType| column.iter().filter(|v| classify_value(v) == t).count();
            let best = freq(inferred);
            assert!(best > 0);
            for other in column.iter().map(classify_value) {
                assert!(best >= freq(other));
            }
        }
    }
}
