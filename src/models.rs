use serde::{Deserialize, Serialize};

use crate::services::excel::SheetPreview;

#[derive(Debug, Default, Deserialize)]
pub struct SheetQuery {
    pub sheet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub sheet: Option<String>,
    pub rows: Option<usize>,
}

/// `page`/`limit` stay raw so malformed values fall back to defaults instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub sheet: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartQuery {
    pub sheet: Option<String>,
    pub chart_type: Option<String>,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub group_by: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub original_name: String,
    pub sheet_names: Vec<String>,
    pub preview: SheetPreview,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetListResponse {
    pub file_id: String,
    pub sheet_names: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub name: String,
    pub original_name: String,
}
