use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::str::FromStr;

use crate::services::charts::DEFAULT_ROW_LIMIT;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
    pub preview_rows: usize,
    pub chart_row_limit: usize,
    pub cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            upload_dir: PathBuf::from("uploads"),
            max_file_size: 10 * 1024 * 1024, // 10MB
            preview_rows: 10,
            chart_row_limit: DEFAULT_ROW_LIMIT,
            cache_capacity: 256,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads overrides from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port)?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_file_size: env_or("MAX_FILE_SIZE", defaults.max_file_size)?,
            preview_rows: env_or("PREVIEW_ROWS", defaults.preview_rows)?,
            chart_row_limit: env_or("CHART_ROW_LIMIT", defaults.chart_row_limit)?,
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    Config::from_env()
}
