//! Transfer of file bytes to object storage
//!
//! This module provides the buffered and supervised transfer modes, the
//! staging area used by supervised transfers, and the per-attempt state
//! machine driven by [`crate::Uploader`].

pub mod buffered;
pub mod executor;
pub mod staging;
pub mod state;
pub mod supervised;
pub mod task;
pub mod types;

pub use executor::{storage_headers, TransferExecutor};
pub use staging::StagingArea;
pub use state::{UploadAttempt, UploadState};
pub use task::{HttpTaskManager, TaskFile, TaskManager, TaskRequest, TaskState};
pub use types::{TransferOutcome, UploadMode, UploadOptions, UploadProgress, UploadReceipt, UploadSink};
