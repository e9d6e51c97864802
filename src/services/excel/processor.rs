use super::analyzer::infer_column_type;
use super::stats::compute_statistics;
use super::types::*;
use super::utils::clean_column_name;
use crate::error::AppError;
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, ErrorKind};

static NULL_CELL: CellValue = CellValue::Null;

/// A worksheet read into an explicit header list plus positional rows.
struct SheetGrid {
    sheet_name: String,
    sheet_names: Vec<String>,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

pub struct ExcelProcessor;

impl ExcelProcessor {
    /// Sheet names in the workbook's declared order.
    pub fn sheet_names(&self, source: &SheetSource) -> Result<Vec<String>, AppError> {
        let bytes = read_source(source)?;
        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::processing(source.describe(), "", format!("Failed to open workbook: {}", e)))?;
        Ok(workbook.sheet_names())
    }

    /// Full parse of one sheet: type inference, statistics, sanitized column
    /// names and re-keyed rows. Uses the first sheet when `sheet_name` is `None`.
    pub fn process(&self, source: &SheetSource, sheet_name: Option<&str>) -> Result<ProcessedSheet, AppError> {
        let start = std::time::Instant::now();
        tracing::info!("Processing {} (requested sheet: {:?})", source.describe(), sheet_name);

        let grid = read_grid(source, sheet_name)?;
        tracing::info!(
            "Read sheet {} with {} data rows and {} columns",
            grid.sheet_name,
            grid.rows.len(),
            grid.headers.len()
        );

        let processed = process_rows(&grid.sheet_name, grid.headers, grid.rows);
        tracing::info!(
            "Sheet {} processed in {:?}: {} rows, {} empty",
            processed.sheet_name,
            start.elapsed(),
            processed.row_count,
            processed.summary.empty_rows
        );

        Ok(processed)
    }

    /// Header row and the first `max_rows` raw rows, without inference.
    pub fn preview(&self, source: &SheetSource, sheet_name: Option<&str>, max_rows: usize) -> Result<SheetPreview, AppError> {
        let grid = read_grid(source, sheet_name)?;
        let total_rows = grid.rows.len();

        Ok(SheetPreview {
            sheet_name: grid.sheet_name,
            sheet_names: grid.sheet_names,
            columns: grid.headers,
            rows: grid.rows.into_iter().take(max_rows).collect(),
            total_rows,
        })
    }
}

/// Builds a `ProcessedSheet` from headers and positional rows. Short rows are
/// padded with nulls.
pub fn process_rows(sheet_name: &str, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> ProcessedSheet {
    if rows.is_empty() {
        tracing::warn!("Sheet {} has no data rows", sheet_name);
        return ProcessedSheet::empty(sheet_name);
    }

    let analyses: Vec<(DataType, ColumnStatistics)> = (0..headers.len())
        .into_par_iter()
        .map(|idx| {
            let values: Vec<&CellValue> = rows
                .iter()
                .map(|row| row.get(idx).unwrap_or(&NULL_CELL))
                .collect();
            let data_type = infer_column_type(values.iter().copied());
            let statistics = compute_statistics(values.iter().copied(), data_type);
            (data_type, statistics)
        })
        .collect();

    // sanitized names must be assigned in header order
    let mut existing_names = HashSet::new();
    let columns: Vec<ColumnDescriptor> = headers
        .iter()
        .zip(analyses)
        .map(|(header, (data_type, statistics))| {
            let name = clean_column_name(header, &mut existing_names);
            tracing::debug!("Column {:?} -> {} ({})", header, name, data_type);
            ColumnDescriptor {
                name,
                original_name: header.clone(),
                data_type,
                nullable: statistics.null_count > 0,
                statistics,
            }
        })
        .collect();

    let empty_rows = rows
        .iter()
        .filter(|row| row.iter().all(CellValue::is_blank))
        .count();

    let mut data_types = BTreeMap::new();
    for column in &columns {
        *data_types.entry(column.data_type).or_insert(0) += 1;
    }

    let data: Vec<Row> = rows
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            columns
                .iter()
                .map(|column| (column.name.clone(), cells.next().unwrap_or(CellValue::Null)))
                .collect()
        })
        .collect();

    ProcessedSheet {
        sheet_name: sheet_name.to_string(),
        row_count: data.len(),
        summary: SheetSummary {
            row_count: data.len(),
            column_count: columns.len(),
            empty_rows,
            data_types,
        },
        columns,
        data,
    }
}

fn read_source(source: &SheetSource) -> Result<Bytes, AppError> {
    match source {
        SheetSource::Bytes(bytes) => Ok(bytes.clone()),
        SheetSource::Path(path) => match std::fs::read(path) {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::FileNotFound(path.display().to_string()))
            }
            Err(e) => Err(AppError::Io(e)),
        },
    }
}

fn read_grid(source: &SheetSource, sheet_name: Option<&str>) -> Result<SheetGrid, AppError> {
    let bytes = read_source(source)?;
    let file = source.describe();
    let requested = sheet_name.unwrap_or_default();

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        AppError::processing(&file, requested, format!("Failed to open workbook: {}", e))
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet_name {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.to_string(),
        Some(name) => return Err(AppError::SheetNotFound(name.to_string())),
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| AppError::processing(&file, "", "Workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::processing(&file, &sheet_name, format!("Failed to read worksheet: {}", e)))?;

    let (headers, rows) = split_header(&range);

    Ok(SheetGrid {
        sheet_name,
        sheet_names,
        headers,
        rows,
    })
}

/// First row of the used range becomes the header list; every later row is
/// kept, blank ones included, with one cell per header.
fn split_header(range: &Range<Data>) -> (Vec<String>, Vec<Vec<CellValue>>) {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row),
        None => return (Vec::new(), Vec::new()),
    };

    let data = rows
        .map(|row| {
            (0..headers.len())
                .map(|idx| row.get(idx).map(CellValue::from).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    (headers, data)
}

fn header_names(header_row: &[Data]) -> Vec<String> {
    let mut empty_headers = 0;
    header_row
        .iter()
        .map(|cell| {
            let text = match cell {
                Data::Empty => String::new(),
                other => other.to_string().trim().to_string(),
            };
            if !text.is_empty() {
                return text;
            }
            let placeholder = match empty_headers {
                0 => "__EMPTY".to_string(),
                n => format!("__EMPTY_{}", n),
            };
            empty_headers += 1;
            placeholder
        })
        .collect()
}
