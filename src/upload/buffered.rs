//! Buffered transfer: the whole file in one PUT

use crate::error::{Result, UploadError};
use crate::types::{CredentialBundle, MediaFile};
use crate::upload::executor::storage_headers;
use crate::upload::types::{UploadMode, UploadReceipt};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncReadExt;

/// Read the file into memory and PUT it with an exact `Content-Length`
///
/// Only HTTP 200 counts as success. No progress is reported.
pub async fn send_buffered(
    http: &reqwest::Client,
    file: &MediaFile,
    credential: CredentialBundle,
    scheme: &str,
) -> Result<UploadReceipt> {
    let start_time = Instant::now();
    let path = file.locator().to_path()?;
    let bytes = read_whole_file(&path).await?;
    let size = bytes.len() as u64;
    let url = credential.object_url(scheme);

    log::debug!("PUT {} ({} bytes, buffered)", url, size);

    let mut request = http.put(&url);
    for (name, value) in storage_headers(&credential) {
        request = request.header(name, value);
    }

    let response = request
        .header(CONTENT_LENGTH, size)
        .body(bytes)
        .send()
        .await
        .map_err(|e| UploadError::transport(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        log::warn!("storage PUT to {} answered HTTP {}", url, status.as_u16());
        return Err(UploadError::http_status(status.as_u16()));
    }

    Ok(
        UploadReceipt::new(credential.object_key().to_string(), url, size, UploadMode::Buffered)
            .duration_ms(start_time.elapsed().as_millis() as u64),
    )
}

/// The handle is closed when `file` drops, on success and on every error.
async fn read_whole_file(path: &Path) -> Result<Vec<u8>> {
    let display = || path.display().to_string();

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| UploadError::file_access(display(), e.to_string()))?;
    let expected = file
        .metadata()
        .await
        .map_err(|e| UploadError::file_access(display(), e.to_string()))?
        .len();

    let mut buffer = Vec::with_capacity(expected as usize);
    file.read_to_end(&mut buffer)
        .await
        .map_err(|e| UploadError::file_access(display(), e.to_string()))?;

    Ok(buffer)
}
