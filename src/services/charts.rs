use crate::error::AppError;
use crate::services::excel::{CellValue, ColumnDescriptor, Row};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Rows considered per chart unless the request says otherwise. Aggregates
/// only reflect this prefix of the sheet.
pub const DEFAULT_ROW_LIMIT: usize = 1000;

const PALETTE: [&str; 10] = [
    "rgba(54, 162, 235, 0.6)",
    "rgba(255, 99, 132, 0.6)",
    "rgba(75, 192, 192, 0.6)",
    "rgba(255, 206, 86, 0.6)",
    "rgba(153, 102, 255, 0.6)",
    "rgba(255, 159, 64, 0.6)",
    "rgba(199, 199, 199, 0.6)",
    "rgba(83, 102, 255, 0.6)",
    "rgba(40, 159, 64, 0.6)",
    "rgba(210, 99, 132, 0.6)",
];

fn color(index: usize) -> String {
    PALETTE[index % PALETTE.len()].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
    Scatter,
    Table,
    Doughnut,
    Area,
}

impl ChartType {
    /// Case-insensitive; anything unrecognized is treated as a bar chart.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "line" => ChartType::Line,
            "pie" => ChartType::Pie,
            "scatter" => ChartType::Scatter,
            "table" => ChartType::Table,
            "doughnut" => ChartType::Doughnut,
            "area" => ChartType::Area,
            _ => ChartType::Bar,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartRequest {
    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub group_by: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Colors {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: Colors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Colors>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: CellValue,
    pub y: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterDataset {
    pub label: String,
    pub data: Vec<Point>,
    pub background_color: Colors,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartSeries {
    Categorical {
        labels: Vec<CellValue>,
        datasets: Vec<Dataset>,
    },
    Scatter {
        datasets: Vec<ScatterDataset>,
    },
}

/// Reshapes processed rows into chart-ready series. Rows are truncated to the
/// request limit before any aggregation happens.
pub fn format_chart_data(
    rows: &[Row],
    columns: &[ColumnDescriptor],
    request: &ChartRequest,
) -> Result<ChartSeries, AppError> {
    let x_axis = non_empty(&request.x_axis).ok_or(AppError::MissingAxis("xAxis"))?;
    let y_axis = non_empty(&request.y_axis);
    let group_by = non_empty(&request.group_by);

    if request.chart_type == ChartType::Scatter && y_axis.is_none() {
        return Err(AppError::MissingAxis("yAxis"));
    }

    for axis in [Some(x_axis), y_axis, group_by].into_iter().flatten() {
        if !columns.iter().any(|c| c.name == axis) {
            return Err(AppError::InvalidChartRequest(format!("Unknown column: {}", axis)));
        }
    }

    let limit = request.limit.unwrap_or(DEFAULT_ROW_LIMIT);
    if limit == 0 {
        return Err(AppError::InvalidChartRequest("limit must be at least 1".to_string()));
    }
    let rows = &rows[..rows.len().min(limit)];

    tracing::debug!(
        "Formatting {:?} chart over {} rows (x: {}, y: {:?}, group: {:?})",
        request.chart_type,
        rows.len(),
        x_axis,
        y_axis,
        group_by
    );

    let series = match request.chart_type {
        ChartType::Pie | ChartType::Doughnut => pie_series(rows, x_axis, y_axis),
        ChartType::Scatter => scatter_series(rows, x_axis, y_axis.unwrap_or_default()),
        ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Table => match group_by {
            Some(group_by) => grouped_series(rows, x_axis, y_axis, group_by),
            None => simple_series(rows, x_axis, y_axis),
        },
    };

    Ok(series)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn value<'a>(row: &'a Row, column: &str) -> Option<&'a CellValue> {
    row.get(column).filter(|v| !v.is_null())
}

/// Contribution of one row: its `y` value coerced to a number (non-numeric
/// counts as 0), or 1 when counting.
fn measure(row: &Row, y_axis: Option<&str>) -> f64 {
    match y_axis {
        Some(y) => row.get(y).and_then(CellValue::as_f64).unwrap_or(0.0),
        None => 1.0,
    }
}

fn dataset_label(y_axis: Option<&str>) -> String {
    y_axis.unwrap_or("Count").to_string()
}

/// Sums per distinct `x` value in first-encountered order.
fn aggregate(rows: &[Row], x_axis: &str, y_axis: Option<&str>) -> IndexMap<String, (CellValue, f64)> {
    let mut totals: IndexMap<String, (CellValue, f64)> = IndexMap::new();
    for row in rows {
        let Some(x) = value(row, x_axis) else { continue };
        let entry = totals
            .entry(x.group_key())
            .or_insert_with(|| (x.clone(), 0.0));
        entry.1 += measure(row, y_axis);
    }
    totals
}

fn pie_series(rows: &[Row], x_axis: &str, y_axis: Option<&str>) -> ChartSeries {
    let totals = aggregate(rows, x_axis, y_axis);
    let colors = (0..totals.len()).map(color).collect();
    let (labels, data) = totals.into_values().unzip();

    ChartSeries::Categorical {
        labels,
        datasets: vec![Dataset {
            label: dataset_label(y_axis),
            data,
            background_color: Colors::Many(colors),
            border_color: None,
        }],
    }
}

fn simple_series(rows: &[Row], x_axis: &str, y_axis: Option<&str>) -> ChartSeries {
    let mut totals: Vec<(CellValue, f64)> = aggregate(rows, x_axis, y_axis).into_values().collect();
    totals.sort_by(|a, b| compare_labels(&a.0, &b.0));
    let (labels, data) = totals.into_iter().unzip();

    ChartSeries::Categorical {
        labels,
        datasets: vec![Dataset {
            label: dataset_label(y_axis),
            data,
            background_color: Colors::Single(color(0)),
            border_color: Some(Colors::Single(color(0))),
        }],
    }
}

fn grouped_series(rows: &[Row], x_axis: &str, y_axis: Option<&str>, group_by: &str) -> ChartSeries {
    let mut x_values: IndexMap<String, CellValue> = IndexMap::new();
    let mut groups: IndexMap<String, (CellValue, HashMap<String, f64>)> = IndexMap::new();

    for row in rows {
        let (Some(x), Some(group)) = (value(row, x_axis), value(row, group_by)) else {
            continue;
        };
        let x_key = x.group_key();
        x_values.entry(x_key.clone()).or_insert_with(|| x.clone());

        let (_, sums) = groups
            .entry(group.group_key())
            .or_insert_with(|| (group.clone(), HashMap::new()));
        *sums.entry(x_key).or_insert(0.0) += measure(row, y_axis);
    }

    let mut x_sorted: Vec<(String, CellValue)> = x_values.into_iter().collect();
    x_sorted.sort_by(|a, b| compare_labels(&a.1, &b.1));

    let datasets = groups
        .into_values()
        .enumerate()
        .map(|(idx, (group, sums))| Dataset {
            label: group.to_string(),
            data: x_sorted
                .iter()
                .map(|(key, _)| sums.get(key).copied().unwrap_or(0.0))
                .collect(),
            background_color: Colors::Single(color(idx)),
            border_color: Some(Colors::Single(color(idx))),
        })
        .collect();

    ChartSeries::Categorical {
        labels: x_sorted.into_iter().map(|(_, label)| label).collect(),
        datasets,
    }
}

fn scatter_series(rows: &[Row], x_axis: &str, y_axis: &str) -> ChartSeries {
    let data = rows
        .iter()
        .filter_map(|row| {
            Some(Point {
                x: value(row, x_axis)?.clone(),
                y: value(row, y_axis)?.clone(),
            })
        })
        .collect();

    ChartSeries::Scatter {
        datasets: vec![ScatterDataset {
            label: format!("{} vs {}", x_axis, y_axis),
            data,
            background_color: Colors::Single(color(0)),
        }],
    }
}

/// Natural label order: numbers numerically, dates chronologically, anything
/// else by its text. Numbers sort before dates, dates before the rest.
fn compare_labels(a: &CellValue, b: &CellValue) -> Ordering {
    fn rank(v: &CellValue) -> u8 {
        match v {
            CellValue::Number(_) => 0,
            CellValue::Date(_) => 1,
            _ => 2,
        }
    }

    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Date(x), CellValue::Date(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::process_rows;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn sheet(headers: &[&str], rows: Vec<Vec<CellValue>>) -> (Vec<Row>, Vec<ColumnDescriptor>) {
        let processed = process_rows(
            "Sheet1",
            headers.iter().map(|h| h.to_string()).collect(),
            rows,
        );
        (processed.data, processed.columns)
    }

    fn request(chart_type: ChartType, x: &str, y: Option<&str>, group: Option<&str>) -> ChartRequest {
        ChartRequest {
            chart_type,
            x_axis: Some(x.to_string()),
            y_axis: y.map(str::to_string),
            group_by: group.map(str::to_string),
            limit: None,
        }
    }

    fn categorical(series: ChartSeries) -> (Vec<CellValue>, Vec<Dataset>) {
        match series {
            ChartSeries::Categorical { labels, datasets } => (labels, datasets),
            other => panic!("expected categorical series, got {:?}", other),
        }
    }

    fn region_sales() -> (Vec<Row>, Vec<ColumnDescriptor>) {
        sheet(
            &["Region", "Amount"],
            vec![
                vec![s("North"), n(500.0)],
                vec![s("South"), n(300.0)],
                vec![s("North"), n(200.0)],
            ],
        )
    }

    #[test]
    fn pie_sums_in_first_encountered_order() {
        let (rows, columns) = region_sales();
        let req = request(ChartType::Pie, "region", Some("amount"), None);

        let (labels, datasets) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels, vec![s("North"), s("South")]);
        assert_eq!(datasets[0].data, vec![700.0, 300.0]);
        assert_eq!(datasets[0].background_color, Colors::Many(vec![color(0), color(1)]));
    }

    #[test]
    fn doughnut_counts_when_no_y_axis() {
        let (rows, columns) = sheet(
            &["Fruit"],
            vec![vec![s("pear")], vec![s("apple")], vec![CellValue::Null], vec![s("pear")]],
        );
        let req = request(ChartType::Doughnut, "fruit", None, None);

        let (labels, datasets) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels, vec![s("pear"), s("apple")]);
        assert_eq!(datasets[0].data, vec![2.0, 1.0]);
        assert_eq!(datasets[0].label, "Count");
    }

    #[test]
    fn bar_labels_are_sorted() {
        let (rows, columns) = sheet(
            &["Region", "Amount"],
            vec![
                vec![s("West"), n(1.0)],
                vec![s("East"), n(2.0)],
                vec![s("West"), s("n/a")],
                vec![s("Central"), s("4")],
            ],
        );
        let req = request(ChartType::Bar, "region", Some("amount"), None);

        let (labels, datasets) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels, vec![s("Central"), s("East"), s("West")]);
        // non-numeric y counts as 0, numeric text is coerced
        assert_eq!(datasets[0].data, vec![4.0, 2.0, 1.0]);
        assert_eq!(datasets[0].label, "amount");
    }

    #[test]
    fn numeric_labels_sort_numerically() {
        let (rows, columns) = sheet(
            &["Year"],
            vec![vec![n(10.0)], vec![n(9.0)], vec![n(100.0)], vec![n(9.0)]],
        );
        let req = request(ChartType::Line, "year", None, None);

        let (labels, datasets) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels, vec![n(9.0), n(10.0), n(100.0)]);
        assert_eq!(datasets[0].data, vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn nan_labels_sort_last() {
        let (rows, columns) = sheet(
            &["Score"],
            vec![vec![n(2.0)], vec![n(f64::NAN)], vec![n(1.0)]],
        );
        let req = request(ChartType::Bar, "score", None, None);

        let (labels, _) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels[..2], [n(1.0), n(2.0)]);
        assert!(matches!(labels[2], CellValue::Number(x) if x.is_nan()));
    }

    #[test]
    fn grouped_series_align_to_sorted_x_values() {
        let (rows, columns) = sheet(
            &["Quarter", "Region", "Amount"],
            vec![
                vec![s("Q2"), s("North"), n(10.0)],
                vec![s("Q1"), s("South"), n(5.0)],
                vec![s("Q1"), s("North"), n(7.0)],
                vec![s("Q2"), s("North"), n(1.0)],
                vec![s("Q3"), s("South"), n(2.0)],
            ],
        );
        let req = request(ChartType::Area, "quarter", Some("amount"), Some("region"));

        let (labels, datasets) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels, vec![s("Q1"), s("Q2"), s("Q3")]);
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].label, "North");
        assert_eq!(datasets[0].data, vec![7.0, 11.0, 0.0]);
        assert_eq!(datasets[1].label, "South");
        assert_eq!(datasets[1].data, vec![5.0, 0.0, 2.0]);
        assert_eq!(datasets[1].background_color, Colors::Single(color(1)));
    }

    #[test]
    fn scatter_emits_pairs_in_row_order() {
        let (rows, columns) = sheet(
            &["Height", "Weight"],
            vec![
                vec![n(170.0), n(65.0)],
                vec![n(180.0), CellValue::Null],
                vec![n(160.0), n(55.0)],
            ],
        );
        let req = request(ChartType::Scatter, "height", Some("weight"), None);

        match format_chart_data(&rows, &columns, &req).unwrap() {
            ChartSeries::Scatter { datasets } => {
                assert_eq!(datasets[0].label, "height vs weight");
                assert_eq!(
                    datasets[0].data,
                    vec![
                        Point { x: n(170.0), y: n(65.0) },
                        Point { x: n(160.0), y: n(55.0) },
                    ]
                );
            }
            other => panic!("expected scatter series, got {:?}", other),
        }
    }

    #[test]
    fn scatter_without_y_axis_is_rejected() {
        let (rows, columns) = region_sales();
        let req = request(ChartType::Scatter, "region", None, None);
        let err = format_chart_data(&rows, &columns, &req).unwrap_err();
        assert!(matches!(err, AppError::MissingAxis("yAxis")));
    }

    #[test]
    fn missing_or_unknown_axes_are_rejected() {
        let (rows, columns) = region_sales();

        let mut req = request(ChartType::Bar, "region", None, None);
        req.x_axis = None;
        assert!(matches!(
            format_chart_data(&rows, &columns, &req),
            Err(AppError::MissingAxis("xAxis"))
        ));

        let req = request(ChartType::Bar, "Region", None, None);
        assert!(matches!(
            format_chart_data(&rows, &columns, &req),
            Err(AppError::InvalidChartRequest(_))
        ));

        let req = request(ChartType::Bar, "region", None, Some("country"));
        assert!(matches!(
            format_chart_data(&rows, &columns, &req),
            Err(AppError::InvalidChartRequest(_))
        ));
    }

    #[test]
    fn limit_truncates_before_aggregating() {
        let (rows, columns) = region_sales();
        let mut req = request(ChartType::Pie, "region", Some("amount"), None);
        req.limit = Some(2);

        let (labels, datasets) = categorical(format_chart_data(&rows, &columns, &req).unwrap());
        assert_eq!(labels, vec![s("North"), s("South")]);
        assert_eq!(datasets[0].data, vec![500.0, 300.0]);

        req.limit = Some(0);
        assert!(format_chart_data(&rows, &columns, &req).is_err());
    }

    #[test]
    fn unknown_chart_types_fall_back_to_bar() {
        assert_eq!(ChartType::parse("PIE"), ChartType::Pie);
        assert_eq!(ChartType::parse("radar"), ChartType::Bar);
        assert_eq!(ChartType::parse("table"), ChartType::Table);
    }

    #[test]
    fn series_serialize_chart_ready() {
        let (rows, columns) = region_sales();
        let req = request(ChartType::Bar, "region", Some("amount"), None);
        let json = serde_json::to_value(format_chart_data(&rows, &columns, &req).unwrap()).unwrap();

        assert_eq!(json["labels"], serde_json::json!(["North", "South"]));
        assert_eq!(json["datasets"][0]["data"], serde_json::json!([700.0, 300.0]));
        assert!(json["datasets"][0]["backgroundColor"].is_string());
    }
}
