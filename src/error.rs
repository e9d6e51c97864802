use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
    #[error("Missing required chart parameter: {0}")]
    MissingAxis(&'static str),
    #[error("Invalid chart request: {0}")]
    InvalidChartRequest(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("File exceeds the maximum upload size of {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Failed to process {file} (sheet: {sheet}): {message}")]
    Processing {
        file: String,
        sheet: String,
        message: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn processing(file: impl Into<String>, sheet: impl Into<String>, message: impl ToString) -> Self {
        AppError::Processing {
            file: file.into(),
            sheet: sheet.into(),
            message: message.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::FileNotFound(_) | AppError::SheetNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingAxis(_)
            | AppError::InvalidChartRequest(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Processing { .. } | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Processing { file, sheet, message } => {
                tracing::error!(file = %file, sheet = %sheet, "Sheet processing failed: {}", message);
                "Failed to process file".to_string()
            }
            AppError::Io(err) => {
                tracing::error!("IO failure while serving request: {}", err);
                "Failed to read file".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
