//! Transfer executor
//!
//! Sends one file to `{scheme}://{host}/{object_key}` using a credential
//! bundle, either buffered or through a supervised task.

use crate::error::{Result, UploadError};
use crate::types::{CredentialBundle, MediaFile};
use crate::upload::task::TaskManager;
use crate::upload::types::{UploadMode, UploadReceipt, UploadSink};
use crate::upload::{buffered, supervised};
use std::sync::Arc;

/// Content type sent with every storage PUT
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Header carrying the temporary security token
pub const SECURITY_TOKEN_HEADER: &str = "x-cos-security-token";

/// Headers required on every storage PUT, in both modes
pub fn storage_headers(credential: &CredentialBundle) -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_string(), OCTET_STREAM.to_string()),
        (
            "Authorization".to_string(),
            credential.authorization().to_string(),
        ),
        (
            SECURITY_TOKEN_HEADER.to_string(),
            credential.security_token().to_string(),
        ),
        ("Host".to_string(), credential.host().to_string()),
    ]
}

#[derive(Clone)]
pub struct TransferExecutor {
    http: reqwest::Client,
    scheme: String,
    task_manager: Arc<dyn TaskManager>,
}

impl TransferExecutor {
    pub fn new(
        http: reqwest::Client,
        scheme: impl Into<String>,
        task_manager: Arc<dyn TaskManager>,
    ) -> Self {
        Self {
            http,
            scheme: scheme.into(),
            task_manager,
        }
    }

    /// Whether supervised transfers need the file staged first
    pub fn requires_staging(&self) -> bool {
        self.task_manager.requires_staging()
    }

    /// Send a file, consuming the credential bundle
    ///
    /// `mode` must already be resolved; progress reaches `sink` only in
    /// supervised mode, and terminal notifications are left to the caller.
    pub async fn send(
        &self,
        file: &MediaFile,
        credential: CredentialBundle,
        mode: UploadMode,
        sink: Option<Arc<dyn UploadSink>>,
    ) -> Result<UploadReceipt> {
        match mode {
            UploadMode::Buffered => {
                buffered::send_buffered(&self.http, file, credential, &self.scheme).await
            }
            UploadMode::Supervised => {
                supervised::send_supervised(
                    self.task_manager.as_ref(),
                    file,
                    credential,
                    &self.scheme,
                    sink,
                )
                .await
            }
            UploadMode::Auto => Err(UploadError::invalid_parameter(
                "mode",
                "auto mode must be resolved before the transfer",
            )),
        }
    }
}

impl std::fmt::Debug for TransferExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferExecutor")
            .field("scheme", &self.scheme)
            .field("requires_staging", &self.requires_staging())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::staging::StagingArea;
    use crate::upload::task::HttpTaskManager;

    #[test]
    fn test_storage_headers() {
        let bundle = CredentialBundle::new("x.cos.region.com", "k1.jpg", "auth1", "tok1");
        let headers = storage_headers(&bundle);

        let expected = [
            ("Content-Type", "application/octet-stream"),
            ("Authorization", "auth1"),
            ("x-cos-security-token", "tok1"),
            ("Host", "x.cos.region.com"),
        ];
        assert_eq!(headers.len(), expected.len());
        for ((name, value), (expected_name, expected_value)) in headers.iter().zip(expected) {
            assert_eq!(name, expected_name);
            assert_eq!(value, expected_value);
        }
    }

    #[tokio::test]
    async fn test_auto_mode_is_rejected() {
        let http = reqwest::Client::new();
        let manager = Arc::new(HttpTaskManager::new(http.clone(), StagingArea::new("/tmp")));
        let executor = TransferExecutor::new(http, "https", manager);

        let file = MediaFile::new("/tmp/a.jpg", "a.jpg", 1);
        let bundle = CredentialBundle::new("h", "k", "a", "t");
        let err = executor
            .send(&file, bundle, UploadMode::Auto, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter { .. }));
    }
}
