//! Upload client: configuration and the orchestrating [`Uploader`]

pub mod config;
pub mod uploader;

pub use config::{ClientConfig, LogLevel};
pub use uploader::{UploadReport, Uploader};

use crate::error::{Result, UploadError};
use std::time::Duration;

/// HTTP client shared by the signing call and the storage PUTs
///
/// Idle connections are not kept, so each request's connection is released
/// once its response is dropped.
pub(crate) fn http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| UploadError::config_error(format!("Failed to create HTTP client: {}", e)))
}

/// Initialize `env_logger` at the configured level unless `RUST_LOG` overrides it
pub fn init_logging(level: Option<LogLevel>) {
    let level = level.unwrap_or_default();
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string()),
    )
    .try_init();
}
