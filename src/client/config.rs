//! Client configuration

use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path of the signing endpoint, relative to the signing base URL
pub const SIGN_PATH: &str = "sts-direct-sign";

/// Default base URL of the signing backend
pub const DEFAULT_SIGNING_BASE_URL: &str = "http://127.0.0.1:3000";

/// Files at least this large go through the supervised transfer in auto mode
pub const DEFAULT_SUPERVISED_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Log level for the client and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" => Ok(LogLevel::Off),
            other => Err(UploadError::config_error(format!(
                "unknown log level: {}",
                other
            ))),
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Configuration for an [`crate::Uploader`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the signing backend (default: http://127.0.0.1:3000)
    #[serde(rename = "signing-base-url")]
    pub signing_base_url: String,

    /// Scheme used for storage PUTs (default: https)
    #[serde(rename = "storage-scheme")]
    pub storage_scheme: String,

    /// Application-private staging directory (default: <tmp>/cos-direct-upload/cache)
    #[serde(rename = "staging-dir", skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    /// Size in bytes from which auto mode picks the supervised transfer (default: 4 MiB)
    #[serde(rename = "supervised-threshold")]
    pub supervised_threshold: u64,

    /// Request timeout in seconds; unset leaves the HTTP stack default in place
    #[serde(rename = "timeout-secs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Log level (default: info)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signing_base_url: DEFAULT_SIGNING_BASE_URL.to_string(),
            storage_scheme: "https".to_string(),
            staging_dir: None,
            supervised_threshold: DEFAULT_SUPERVISED_THRESHOLD,
            timeout_secs: None,
            log_level: Some(LogLevel::Info),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from `COS_SIGN_URL`, `COS_STORAGE_SCHEME`, `COS_STAGING_DIR`
    /// and `COS_LOG_LEVEL`, falling back to defaults for unset variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("COS_SIGN_URL") {
            config.signing_base_url = url;
        }
        if let Ok(scheme) = std::env::var("COS_STORAGE_SCHEME") {
            config.storage_scheme = scheme;
        }
        if let Ok(dir) = std::env::var("COS_STAGING_DIR") {
            config.staging_dir = Some(PathBuf::from(dir));
        }
        if let Ok(level) = std::env::var("COS_LOG_LEVEL") {
            config.log_level = Some(level.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the signing backend base URL
    pub fn signing_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.signing_base_url = url.into();
        self
    }

    /// Set the storage scheme
    pub fn storage_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.storage_scheme = scheme.into();
        self
    }

    /// Set the staging directory
    pub fn staging_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.staging_dir = Some(path.into());
        self
    }

    /// Set the auto-mode threshold in bytes
    pub fn supervised_threshold(mut self, bytes: u64) -> Self {
        self.supervised_threshold = bytes;
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Full URL of the signing endpoint
    pub fn sign_url(&self) -> String {
        format!("{}/{}", self.signing_base_url.trim_end_matches('/'), SIGN_PATH)
    }

    /// Staging directory, with the default applied
    pub fn resolved_staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir()
                .join("cos-direct-upload")
                .join("cache")
        })
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.signing_base_url).map_err(|e| {
            UploadError::config_error(format!(
                "invalid signing base URL {}: {}",
                self.signing_base_url, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(UploadError::config_error(format!(
                "signing base URL must be http or https, got {}",
                base.scheme()
            )));
        }

        if !matches!(self.storage_scheme.as_str(), "http" | "https") {
            return Err(UploadError::config_error(format!(
                "storage scheme must be http or https, got {}",
                self.storage_scheme
            )));
        }

        if self.timeout_secs == Some(0) {
            return Err(UploadError::config_error(
                "timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Convert the configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(UploadError::from)
    }

    /// Create a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(UploadError::from)
    }
}
