//! Transfer modes, progress, receipts and the caller-facing sink
//!
//! [`UploadOptions`] selects the [`UploadMode`] and an optional [`UploadSink`];
//! every attempt ends in one [`TransferOutcome`].

use crate::error::{FailureKind, UploadError};
use crate::upload::task::TaskState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How the file bytes reach the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Whole file read into memory and sent in one PUT
    Buffered,
    /// Staged copy handed to a transfer task that reports progress
    Supervised,
    /// Supervised for files at or above the configured threshold, buffered otherwise
    #[default]
    Auto,
}

impl UploadMode {
    /// Resolve `Auto` against a file size; concrete modes are returned unchanged
    pub fn resolve(self, size_bytes: u64, supervised_threshold: u64) -> UploadMode {
        match self {
            UploadMode::Auto if size_bytes >= supervised_threshold => UploadMode::Supervised,
            UploadMode::Auto => UploadMode::Buffered,
            mode => mode,
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadMode::Buffered => write!(f, "buffered"),
            UploadMode::Supervised => write!(f, "supervised"),
            UploadMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for UploadMode {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buffered" => Ok(UploadMode::Buffered),
            "supervised" => Ok(UploadMode::Supervised),
            "auto" => Ok(UploadMode::Auto),
            other => Err(UploadError::invalid_parameter(
                "mode",
                format!("unknown upload mode: {}", other),
            )),
        }
    }
}

/// Progress of a supervised transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
    /// Fraction in `0.0..=1.0`; zero while the total is unknown
    pub percentage: f64,
}

impl UploadProgress {
    pub fn new(bytes_sent: u64, total_bytes: u64) -> Self {
        let percentage = if total_bytes > 0 {
            bytes_sent as f64 / total_bytes as f64
        } else {
            0.0
        };

        Self {
            bytes_sent,
            total_bytes,
            percentage: percentage.min(1.0),
        }
    }
}

impl fmt::Display for UploadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({:.0}%)",
            bytesize::ByteSize::b(self.bytes_sent),
            bytesize::ByteSize::b(self.total_bytes),
            self.percentage * 100.0
        )
    }
}

/// Details of a finished upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub object_key: String,
    pub url: String,
    pub size: u64,
    pub mode: UploadMode,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl UploadReceipt {
    pub fn new(object_key: String, url: String, size: u64, mode: UploadMode) -> Self {
        Self {
            object_key,
            url,
            size,
            mode,
            duration_ms: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Terminal value of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success(UploadReceipt),
    Failure { kind: FailureKind, detail: String },
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success(_))
    }

    pub fn receipt(&self) -> Option<&UploadReceipt> {
        match self {
            TransferOutcome::Success(receipt) => Some(receipt),
            TransferOutcome::Failure { .. } => None,
        }
    }
}

impl From<&UploadError> for TransferOutcome {
    fn from(err: &UploadError) -> Self {
        TransferOutcome::Failure {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

/// Caller-supplied receiver of progress and the single terminal notification
///
/// Callbacks may run on any thread and must not block for long.
pub trait UploadSink: Send + Sync {
    fn on_progress(&self, progress: UploadProgress);

    /// One call per task state in a supervised terminal batch
    fn on_task_state(&self, _state: &TaskState) {}

    fn on_success(&self, receipt: &UploadReceipt);

    fn on_failure(&self, kind: FailureKind, detail: &str);
}

#[derive(Clone, Default)]
pub struct UploadOptions {
    pub mode: UploadMode,
    pub sink: Option<Arc<dyn UploadSink>>,
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("mode", &self.mode)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn UploadSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_progress() {
        let progress = UploadProgress::new(512, 1024);
        assert_eq!(progress.bytes_sent, 512);
        assert_eq!(progress.total_bytes, 1024);
        assert_eq!(progress.percentage, 0.5);
    }

    #[test]
    fn test_upload_progress_percentage() {
        // Zero total never divides
        let progress = UploadProgress::new(500, 0);
        assert_eq!(progress.percentage, 0.0);

        let progress = UploadProgress::new(0, 0);
        assert_eq!(progress.percentage, 0.0);

        // Capped at 1.0
        let progress = UploadProgress::new(1500, 1000);
        assert_eq!(progress.percentage, 1.0);
    }

    #[test]
    fn test_upload_progress_display() {
        let text = UploadProgress::new(1, 4).to_string();
        assert!(text.ends_with("(25%)"), "{}", text);
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(UploadMode::Auto.resolve(10, 100), UploadMode::Buffered);
        assert_eq!(UploadMode::Auto.resolve(100, 100), UploadMode::Supervised);
        assert_eq!(UploadMode::Buffered.resolve(1000, 100), UploadMode::Buffered);
        assert_eq!(UploadMode::Supervised.resolve(0, 100), UploadMode::Supervised);
    }

    #[test]
    fn test_mode_parsing_and_serialization() {
        assert_eq!("Supervised".parse::<UploadMode>().unwrap(), UploadMode::Supervised);
        assert!("chunked".parse::<UploadMode>().is_err());

        let json = serde_json::to_string(&UploadMode::Buffered).unwrap();
        assert_eq!(json, "\"buffered\"");
        assert_eq!(UploadMode::default(), UploadMode::Auto);
    }

    #[test]
    fn test_outcome_from_error() {
        let outcome = TransferOutcome::from(&UploadError::staging("disk full"));
        assert_eq!(
            outcome,
            TransferOutcome::Failure {
                kind: FailureKind::Staging,
                detail: "Staging failed: disk full".to_string(),
            }
        );
        assert!(!outcome.is_success());
        assert!(outcome.receipt().is_none());
    }

    #[test]
    fn test_upload_receipt() {
        let receipt = UploadReceipt::new(
            "k1.jpg".to_string(),
            "https://x.cos.region.com/k1.jpg".to_string(),
            1024,
            UploadMode::Buffered,
        )
        .duration_ms(25);

        assert_eq!(receipt.duration_ms, 25);
        assert!(TransferOutcome::Success(receipt).is_success());
    }

    #[test]
    fn test_upload_options() {
        let options = UploadOptions::new().mode(UploadMode::Supervised);
        assert_eq!(options.mode, UploadMode::Supervised);
        assert!(options.sink.is_none());
        assert_eq!(
            format!("{:?}", options),
            "UploadOptions { mode: Supervised, sink: false }"
        );
    }
}
