use axum::{
    extract::{Multipart, Path, Query, State},
    http::Method,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    models::*,
    services::{
        charts::{format_chart_data, ChartRequest, ChartSeries, ChartType},
        excel::{ExcelProcessor, ProcessedSheet, Row, SheetPreview, SheetSource},
        pagination::{paginate, Page, PageParams, DATA_PAGE_LIMIT, TABLE_PAGE_LIMIT},
    },
    AppState,
};

const SUPPORTED_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/files", post(upload_file))
        .route("/files/:file_id", delete(delete_file))
        .route("/files/:file_id/sheets", get(list_sheets))
        .route("/files/:file_id/preview", get(preview_sheet))
        .route("/files/:file_id/parse", post(parse_sheet))
        .route("/files/:file_id/data", get(sheet_data))
        .route("/files/:file_id/analyze", get(analyze_sheet))
        .route("/files/:file_id/table", get(table_view))
        .route("/files/:file_id/chart", get(chart_data))
        .layer(cors)
}

/// Runs blocking engine work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Worker task failed: {}", e)))?
}

fn upload_path(state: &AppState, file_id: &str) -> Result<PathBuf, AppError> {
    let valid = !file_id.is_empty()
        && file_id != "."
        && file_id != ".."
        && !file_id.contains(['/', '\\']);
    if !valid {
        return Err(AppError::InvalidInput(format!("Invalid file id: {}", file_id)));
    }
    Ok(state.config.upload_dir.join(file_id))
}

/// Returns the stored sheet for this file, processing it first if needed.
/// The boolean is true when the result came from the store.
async fn load_sheet(
    state: &AppState,
    file_id: &str,
    sheet: Option<String>,
) -> Result<(Arc<ProcessedSheet>, bool), AppError> {
    let source = SheetSource::Path(upload_path(state, file_id)?);

    let sheet_name = match sheet {
        Some(name) => name,
        None => {
            let source = source.clone();
            let names = blocking(move || ExcelProcessor.sheet_names(&source)).await?;
            names.into_iter().next().ok_or_else(|| {
                AppError::processing(file_id, "", "Workbook contains no sheets")
            })?
        }
    };

    if let Some(stored) = state.store.get(file_id, &sheet_name) {
        tracing::debug!("Using stored result for {} / {}", file_id, sheet_name);
        return Ok((stored, true));
    }

    let requested = sheet_name.clone();
    let processed = blocking(move || ExcelProcessor.process(&source, Some(&requested))).await?;
    tracing::info!(
        "Parsed {} / {}: {} rows, {} columns",
        file_id,
        sheet_name,
        processed.row_count,
        processed.columns.len()
    );

    Ok((state.store.insert(file_id, processed), false))
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            tracing::warn!("Rejected upload {} with unsupported extension", original_name);
            return Err(AppError::InvalidInput(format!(
                "Unsupported file type: {}",
                original_name
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        if bytes.len() > state.config.max_file_size {
            return Err(AppError::PayloadTooLarge(state.config.max_file_size));
        }

        // only workbooks that open are written to disk
        let preview_rows = state.config.preview_rows;
        let source = SheetSource::Bytes(bytes.clone());
        let preview = blocking(move || ExcelProcessor.preview(&source, None, preview_rows)).await?;

        let file_id = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        tokio::fs::write(upload_path(&state, &file_id)?, &bytes).await?;
        tracing::info!(
            "Stored upload {} as {} ({}KB)",
            original_name,
            file_id,
            bytes.len() / 1024
        );

        return Ok(Json(UploadResponse {
            file_id,
            original_name,
            sheet_names: preview.sheet_names.clone(),
            preview,
        }));
    }

    Err(AppError::InvalidInput("No file provided".to_string()))
}

async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let path = upload_path(&state, &file_id)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::FileNotFound(file_id));
        }
        Err(e) => return Err(AppError::Io(e)),
    }
    state.store.invalidate_file(&file_id);
    tracing::info!("Deleted upload {} and its stored sheets", file_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sheets(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<SheetListResponse>, AppError> {
    let source = SheetSource::Path(upload_path(&state, &file_id)?);
    let sheet_names = blocking(move || ExcelProcessor.sheet_names(&source)).await?;
    Ok(Json(SheetListResponse { file_id, sheet_names }))
}

async fn preview_sheet(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<SheetPreview>, AppError> {
    let source = SheetSource::Path(upload_path(&state, &file_id)?);
    let rows = query.rows.unwrap_or(state.config.preview_rows);
    let preview = blocking(move || ExcelProcessor.preview(&source, query.sheet.as_deref(), rows)).await?;
    Ok(Json(preview))
}

async fn parse_sheet(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<Value>, AppError> {
    let (sheet, cached) = load_sheet(&state, &file_id, query.sheet).await?;
    Ok(Json(json!({
        "fileId": file_id,
        "cached": cached,
        "sheet": &*sheet,
    })))
}

async fn sheet_data(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Row>>, AppError> {
    let params = PageParams::from_query(query.page.as_deref(), query.limit.as_deref(), DATA_PAGE_LIMIT);
    let (sheet, _) = load_sheet(&state, &file_id, query.sheet).await?;
    Ok(Json(paginate(&sheet.data, params)))
}

async fn analyze_sheet(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let params = PageParams::from_query(query.page.as_deref(), query.limit.as_deref(), DATA_PAGE_LIMIT);
    let (sheet, _) = load_sheet(&state, &file_id, query.sheet).await?;
    Ok(Json(json!({
        "sheetName": sheet.sheet_name,
        "columns": sheet.columns,
        "summary": sheet.summary,
        "rowCount": sheet.row_count,
        "data": paginate(&sheet.data, params),
    })))
}

async fn table_view(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let params = PageParams::from_query(query.page.as_deref(), query.limit.as_deref(), TABLE_PAGE_LIMIT);
    let (sheet, _) = load_sheet(&state, &file_id, query.sheet).await?;
    let columns: Vec<TableColumn> = sheet
        .columns
        .iter()
        .map(|c| TableColumn {
            name: c.name.clone(),
            original_name: c.original_name.clone(),
        })
        .collect();
    Ok(Json(json!({
        "columns": columns,
        "rows": paginate(&sheet.data, params),
    })))
}

async fn chart_data(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartSeries>, AppError> {
    let request = ChartRequest {
        chart_type: query.chart_type.as_deref().map(ChartType::parse).unwrap_or_default(),
        x_axis: query.x_axis,
        y_axis: query.y_axis,
        group_by: query.group_by,
        limit: Some(query.limit.unwrap_or(state.config.chart_row_limit)),
    };
    // reject a bad request before touching the file
    if request.x_axis.as_deref().map_or(true, |x| x.trim().is_empty()) {
        return Err(AppError::MissingAxis("xAxis"));
    }

    let (sheet, _) = load_sheet(&state, &file_id, query.sheet).await?;
    let series = format_chart_data(&sheet.data, &sheet.columns, &request)?;
    Ok(Json(series))
}
