use bytes::Bytes;
use calamine::Data;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Where a workbook comes from: a file already on disk or an in-memory upload.
#[derive(Debug, Clone)]
pub enum SheetSource {
    Path(PathBuf),
    Bytes(Bytes),
}

impl SheetSource {
    /// Identifier used in logs and error context.
    pub fn describe(&self) -> String {
        match self {
            SheetSource::Path(path) => path.display().to_string(),
            SheetSource::Bytes(bytes) => format!("<{} byte buffer>", bytes.len()),
        }
    }
}

/// A single cell after it has been read out of a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(NaiveDateTime),
    Array(Vec<CellValue>),
    Object(IndexMap<String, CellValue>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null or an empty string; used for blank-row detection.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Loose numeric coercion: numbers as-is, booleans as 1/0, numeric text parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// A key that is equal for two values exactly when the values are equal
    /// by kind and content. Used for distinct counts and grouping.
    pub fn group_key(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Bool(b) => format!("b:{}", b),
            // -0.0 + 0.0 is 0.0, so both zeros share a key
            CellValue::Number(n) => format!("n:{}", n + 0.0),
            CellValue::String(s) => format!("s:{}", s),
            CellValue::Date(d) => format!("d:{}", d.format(DATE_FORMAT)),
            CellValue::Array(_) | CellValue::Object(_) => {
                format!("j:{}", serde_json::Value::from(self.clone()))
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            CellValue::Array(_) | CellValue::Object(_) => {
                write!(f, "{}", serde_json::Value::from(self.clone()))
            }
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Null,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::String(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(date) => CellValue::Date(date),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::String(e.to_string()),
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Null, CellValue::Number),
            serde_json::Value::String(s) => CellValue::String(s),
            serde_json::Value::Array(items) => {
                CellValue::Array(items.into_iter().map(CellValue::from).collect())
            }
            serde_json::Value::Object(map) => CellValue::Object(
                map.into_iter().map(|(k, v)| (k, CellValue::from(v))).collect(),
            ),
        }
    }
}

impl From<CellValue> for serde_json::Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(b),
            CellValue::Number(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            CellValue::String(s) => serde_json::Value::String(s),
            CellValue::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
            CellValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            CellValue::Object(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, serde_json::Value::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) => serializer.serialize_unit(),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
            CellValue::Array(items) => items.serialize(serializer),
            CellValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(CellValue::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
    Object,
    Array,
    Null,
    Mixed,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Object => "object",
            DataType::Array => "array",
            DataType::Null => "null",
            DataType::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

/// Type-specific part of a column's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedStatistics {
    #[serde(rename_all = "camelCase")]
    Number {
        min: f64,
        max: f64,
        sum: f64,
        mean: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        variance: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        std_dev: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    String {
        min_length: usize,
        max_length: usize,
        most_common: String,
    },
    Date {
        min: NaiveDateTime,
        max: NaiveDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStatistics {
    pub count: usize,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<usize>,
    #[serde(flatten)]
    pub typed: Option<TypedStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub original_name: String,
    pub data_type: DataType,
    pub statistics: ColumnStatistics,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub empty_rows: usize,
    pub data_types: BTreeMap<DataType, usize>,
}

/// One data row keyed by sanitized column name, in column order.
pub type Row = IndexMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSheet {
    pub sheet_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub data: Vec<Row>,
    pub row_count: usize,
    pub summary: SheetSummary,
}

impl ProcessedSheet {
    pub fn empty(sheet_name: &str) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            columns: Vec::new(),
            data: Vec::new(),
            row_count: 0,
            summary: SheetSummary::default(),
        }
    }
}

/// Header row plus the first few raw rows, with no inference applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPreview {
    pub sheet_name: String,
    pub sheet_names: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub total_rows: usize,
}
