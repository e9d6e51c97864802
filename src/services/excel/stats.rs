use super::types::{CellValue, ColumnStatistics, DataType, TypedStatistics};
use super::utils::parse_date;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Descriptive statistics for one column. Everything beyond `count` and
/// `nullCount` is computed over non-null values only.
pub fn compute_statistics<'a, I>(values: I, data_type: DataType) -> ColumnStatistics
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let mut count = 0;
    let mut non_null: Vec<&CellValue> = Vec::new();
    for value in values {
        count += 1;
        if !value.is_null() {
            non_null.push(value);
        }
    }

    let mut statistics = ColumnStatistics {
        count,
        null_count: count - non_null.len(),
        unique_count: None,
        typed: None,
    };

    if non_null.is_empty() {
        return statistics;
    }

    let distinct: HashSet<String> = non_null.iter().map(|v| v.group_key()).collect();
    statistics.unique_count = Some(distinct.len());

    statistics.typed = match data_type {
        DataType::Number => number_statistics(&non_null),
        DataType::String => string_statistics(&non_null),
        DataType::Date => date_statistics(&non_null),
        DataType::Boolean
        | DataType::Object
        | DataType::Array
        | DataType::Null
        | DataType::Mixed => None,
    };

    statistics
}

fn number_statistics(values: &[&CellValue]) -> Option<TypedStatistics> {
    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| match v {
            CellValue::Number(n) => Some(*n),
            _ => None,
        })
        .collect();
    if numbers.is_empty() {
        return None;
    }

    // every non-null value is in the divisor; non-numbers contribute 0
    let n = values.len() as f64;
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = numbers.iter().sum();
    let mean = sum / n;

    // population variance
    let variance = (values.len() >= 2).then(|| {
        values
            .iter()
            .map(|v| match v {
                CellValue::Number(x) => (x - mean).powi(2),
                _ => mean.powi(2),
            })
            .sum::<f64>()
            / n
    });

    Some(TypedStatistics::Number {
        min,
        max,
        sum,
        mean,
        variance,
        std_dev: variance.map(f64::sqrt),
    })
}

fn string_statistics(values: &[&CellValue]) -> Option<TypedStatistics> {
    let texts: Vec<String> = values.iter().map(|v| v.to_string()).collect();

    let min_length = texts.iter().map(|t| t.chars().count()).min()?;
    let max_length = texts.iter().map(|t| t.chars().count()).max()?;

    // occurrence counts in first-seen order
    let mut occurrences: IndexMap<&str, usize> = IndexMap::new();
    for text in &texts {
        *occurrences.entry(text.as_str()).or_insert(0) += 1;
    }

    let mut most_common: Option<(&str, usize)> = None;
    for (text, seen) in occurrences {
        if most_common.map_or(true, |(_, best)| seen > best) {
            most_common = Some((text, seen));
        }
    }

    Some(TypedStatistics::String {
        min_length,
        max_length,
        most_common: most_common.map(|(text, _)| text.to_string())?,
    })
}

fn date_statistics(values: &[&CellValue]) -> Option<TypedStatistics> {
    let dates: Vec<NaiveDateTime> = values
        .iter()
        .filter_map(|v| match v {
            CellValue::Date(d) => Some(*d),
            CellValue::String(s) => parse_date(s),
            _ => None,
        })
        .collect();

    Some(TypedStatistics::Date {
        min: dates.iter().min().copied()?,
        max: dates.iter().max().copied()?,
    })
}
