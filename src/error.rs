//! Error handling for direct uploads
//!
//! This module defines the error types shared by the signing client, the
//! transfer executors and the upload orchestrator, and the fieldless
//! [`FailureKind`] reported through [`crate::TransferOutcome`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

/// Error types that can occur while obtaining credentials or transferring a file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Network or connectivity failure, including timeouts
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Non-success HTTP status from the signing backend or the storage endpoint
    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },

    /// The signing backend answered with a failing application code
    #[error("Signing backend error {code}: {message}")]
    Application { code: i64, message: String },

    /// The signing payload could not be parsed or lacks a required field
    #[error("Malformed signing response: {message}")]
    MalformedResponse { message: String },

    /// Copying the file into the staging area failed
    #[error("Staging failed: {message}")]
    Staging { message: String },

    /// The storage-side PUT or the supervised task reported failure
    #[error("Transfer failed: {detail}")]
    TransferFailed { detail: String },

    /// The source file could not be opened or read
    #[error("File access error: {path} - {message}")]
    FileAccess { path: String, message: String },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The upload state machine was driven along an edge it does not have
    #[error("Invalid upload state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Coarse classification of a failed upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    HttpStatus,
    Application,
    MalformedResponse,
    Staging,
    TransferFailed,
    FileAccess,
    InvalidParameter,
    Config,
    InvalidTransition,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Transport => "transport",
            FailureKind::HttpStatus => "http_status",
            FailureKind::Application => "application",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Staging => "staging",
            FailureKind::TransferFailed => "transfer_failed",
            FailureKind::FileAccess => "file_access",
            FailureKind::InvalidParameter => "invalid_parameter",
            FailureKind::Config => "config",
            FailureKind::InvalidTransition => "invalid_transition",
        };
        f.write_str(name)
    }
}

impl UploadError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        UploadError::Transport {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    pub fn http_status(status: u16) -> Self {
        UploadError::HttpStatus { status }
    }

    /// Create a new application error
    pub fn application(code: i64, message: impl Into<String>) -> Self {
        UploadError::Application {
            code,
            message: message.into(),
        }
    }

    /// Create a new malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        UploadError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new staging error
    pub fn staging(message: impl Into<String>) -> Self {
        UploadError::Staging {
            message: message.into(),
        }
    }

    /// Create a new transfer failure
    pub fn transfer_failed(detail: impl Into<String>) -> Self {
        UploadError::TransferFailed {
            detail: detail.into(),
        }
    }

    /// Create a new file access error
    pub fn file_access(path: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::FileAccess {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        UploadError::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid transition error
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        UploadError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// The coarse failure kind reported to sinks
    pub fn kind(&self) -> FailureKind {
        match self {
            UploadError::Transport { .. } => FailureKind::Transport,
            UploadError::HttpStatus { .. } => FailureKind::HttpStatus,
            UploadError::Application { .. } => FailureKind::Application,
            UploadError::MalformedResponse { .. } => FailureKind::MalformedResponse,
            UploadError::Staging { .. } => FailureKind::Staging,
            UploadError::TransferFailed { .. } => FailureKind::TransferFailed,
            UploadError::FileAccess { .. } => FailureKind::FileAccess,
            UploadError::InvalidParameter { .. } => FailureKind::InvalidParameter,
            UploadError::Config { .. } => FailureKind::Config,
            UploadError::InvalidTransition { .. } => FailureKind::InvalidTransition,
        }
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::config_error(format!("JSON error: {}", err))
    }
}
