//! Spreadsheet ingestion and analytics: column type inference, per-column
//! statistics, safe column naming, chart-ready reshaping and pagination,
//! plus a thin HTTP layer around them.

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

pub use error::AppError;

// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: services::store::SheetStore,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let store = services::store::SheetStore::new(config.cache_capacity);
        Self { config, store }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .merge(routes::routes())
        .merge(routes::sheets::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
