//! Supervised transfer: a staged file handed to a [`TaskManager`]

use crate::callback::{task_channel, TaskTerminal};
use crate::error::{Result, UploadError};
use crate::media::guess_content_type;
use crate::types::{CredentialBundle, MediaFile};
use crate::upload::executor::storage_headers;
use crate::upload::task::{TaskFile, TaskManager, TaskRequest, TaskState};
use crate::upload::types::{UploadMode, UploadReceipt, UploadSink};
use std::sync::Arc;
use std::time::Instant;

/// Submit the transfer and wait for its first terminal notification
///
/// Progress and per-state notifications are forwarded to `sink` while the
/// task runs.
pub async fn send_supervised(
    manager: &dyn TaskManager,
    file: &MediaFile,
    credential: CredentialBundle,
    scheme: &str,
    sink: Option<Arc<dyn UploadSink>>,
) -> Result<UploadReceipt> {
    if manager.requires_staging() && !file.locator().is_staged() {
        return Err(UploadError::invalid_parameter(
            "locator",
            format!("supervised transfer needs a staged file, got {}", file.locator()),
        ));
    }

    let start_time = Instant::now();
    let url = credential.object_url(scheme);
    let object_key = credential.object_key().to_string();
    let request = TaskRequest {
        url: url.clone(),
        method: "PUT".to_string(),
        headers: storage_headers(&credential),
        files: vec![TaskFile {
            file_name: file.display_name().to_string(),
            locator: file.locator().clone(),
            content_type: guess_content_type(file.display_name()),
            size_bytes: file.size_bytes(),
        }],
    };
    drop(credential);

    let (notifier, completion) = task_channel(sink);
    let task_id = notifier.task_id();
    manager
        .submit(request, notifier)
        .await
        .map_err(|e| UploadError::transfer_failed(format!("task submission failed: {}", e)))?;

    log::debug!("task {}: submitted PUT {}", task_id, url);

    match completion.await {
        TaskTerminal::Complete(states) => {
            log::debug!("task {}: completed ({} states)", task_id, states.len());
            Ok(
                UploadReceipt::new(object_key, url, file.size_bytes(), UploadMode::Supervised)
                    .duration_ms(start_time.elapsed().as_millis() as u64),
            )
        }
        TaskTerminal::Fail(states) if is_transport_failure(&states) => {
            Err(UploadError::transport(describe(&states)))
        }
        TaskTerminal::Fail(states) => Err(UploadError::transfer_failed(describe(&states))),
        TaskTerminal::Abandoned => Err(UploadError::transfer_failed(
            "transfer task ended without a terminal notification",
        )),
    }
}

/// Every failed state of the batch ended without an HTTP response
fn is_transport_failure(states: &[TaskState]) -> bool {
    !states.is_empty() && states.iter().all(|state| state.transport_error)
}

fn describe(states: &[TaskState]) -> String {
    if states.is_empty() {
        return "transfer task failed".to_string();
    }

    states
        .iter()
        .map(|state| {
            if state.response_code == 0 {
                format!("{}: {}", state.path, state.message)
            } else {
                format!("{}: [{}] {}", state.path, state.response_code, state.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
