use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use sheet_analytics::{app, config, logging, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Uploads stored in {}", config.upload_dir.display());

    // Build our application state
    let state = Arc::new(AppState::new(config));
    let app = app(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
