//! Direct uploads to object storage with short-lived credentials
//!
//! A signing backend mints a credential bundle scoped to one object key; the
//! file bytes then go straight to the bucket, either in one buffered PUT or
//! through a supervised transfer task that reports progress.

pub mod callback;
pub mod client;
pub mod credential;
pub mod error;
pub mod media;
pub mod types;
pub mod upload;

pub use callback::{task_channel, TaskCompletion, TaskNotifier, TaskTerminal};

pub use client::{init_logging, ClientConfig, LogLevel, UploadReport, Uploader};

pub use credential::CredentialClient;

pub use error::{FailureKind, Result, UploadError};

pub use media::{
    file_extension, select_media, FsMediaInfo, MediaInfo, MediaInfoProvider, MediaPicker,
    PathPicker,
};

pub use types::{CredentialBundle, MediaFile, MediaLocator};

pub use upload::{
    HttpTaskManager, StagingArea, TaskFile, TaskManager, TaskRequest, TaskState,
    TransferExecutor, TransferOutcome, UploadMode, UploadOptions, UploadProgress, UploadReceipt,
    UploadSink, UploadState,
};
