//! Supervised transfer tasks
//!
//! A [`TaskManager`] is the platform mechanism that performs a supervised
//! transfer and reports back through a [`TaskNotifier`]. [`HttpTaskManager`]
//! is the built-in mechanism: it streams a staged file with a PUT and reports
//! progress per chunk.

use crate::callback::TaskNotifier;
use crate::error::{Result, UploadError};
use crate::types::MediaLocator;
use crate::upload::staging::StagingArea;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use tokio_util::io::ReaderStream;

/// Default read size of the streaming body
pub const DEFAULT_TASK_CHUNK_SIZE: usize = 64 * 1024;

/// Per-file state delivered with a terminal notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub path: String,
    /// HTTP status of the PUT, or 0 when no response was received
    pub response_code: u16,
    pub message: String,
    /// Set when the transfer never got a response (timeout, refused or reset connection)
    pub transport_error: bool,
}

impl TaskState {
    pub fn new(path: impl Into<String>, response_code: u16, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            response_code,
            message: message.into(),
            transport_error: false,
        }
    }

    /// A state for a transfer that failed below HTTP
    pub fn transport(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            transport_error: true,
            ..Self::new(path, 0, message)
        }
    }
}

/// A file entry of a task request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFile {
    /// Name reported to the storage side
    pub file_name: String,
    pub locator: MediaLocator,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Everything a transfer mechanism needs to run one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub files: Vec<TaskFile>,
}

impl TaskRequest {
    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The mechanism that runs supervised transfers
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Whether file locators must point into the staging area
    fn requires_staging(&self) -> bool {
        true
    }

    /// Start a transfer
    ///
    /// Returning `Ok` means the task was accepted; its progress and its
    /// terminal notification arrive later through `notifier`.
    async fn submit(&self, request: TaskRequest, notifier: TaskNotifier) -> Result<()>;
}

/// Streams staged files to the storage endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpTaskManager {
    http: reqwest::Client,
    staging: StagingArea,
    chunk_size: usize,
}

impl HttpTaskManager {
    pub fn new(http: reqwest::Client, staging: StagingArea) -> Self {
        Self {
            http,
            staging,
            chunk_size: DEFAULT_TASK_CHUNK_SIZE,
        }
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }
}

#[async_trait]
impl TaskManager for HttpTaskManager {
    async fn submit(&self, request: TaskRequest, notifier: TaskNotifier) -> Result<()> {
        let file = match request.files.as_slice() {
            [file] => file.clone(),
            files => {
                return Err(UploadError::invalid_parameter(
                    "files",
                    format!("expected exactly one file, got {}", files.len()),
                ))
            }
        };

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| UploadError::invalid_parameter("method", e.to_string()))?;
        let path = self.staging.resolve(&file.locator)?;
        let source = tokio::fs::File::open(&path)
            .await
            .map_err(|e| UploadError::file_access(path.display().to_string(), e.to_string()))?;
        let total = source
            .metadata()
            .await
            .map_err(|e| UploadError::file_access(path.display().to_string(), e.to_string()))?
            .len();

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let progress = notifier.clone();
        let mut sent = 0u64;
        let stream = ReaderStream::with_capacity(source, self.chunk_size).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                progress.progress(sent, total);
            }
            chunk
        });
        let builder = builder
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream));

        let task_path = file.locator.to_string();
        log::debug!(
            "task {}: {} {} ({} bytes)",
            notifier.task_id(),
            request.method,
            request.url,
            total
        );

        tokio::spawn(async move {
            match builder.send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    notifier.complete(vec![TaskState::new(task_path, 200, "upload succeeded")]);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    let message = if body.is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        format!("HTTP {}: {}", status, body)
                    };
                    notifier.fail(vec![TaskState::new(task_path, status, message)]);
                }
                // A failing body stream is a local read error, not a network one.
                Err(e) if e.is_timeout() || e.is_connect() || !e.is_body() => {
                    notifier.fail(vec![TaskState::transport(task_path, e.to_string())]);
                }
                Err(e) => {
                    notifier.fail(vec![TaskState::new(task_path, 0, e.to_string())]);
                }
            }
        });

        Ok(())
    }
}
