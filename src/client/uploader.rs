//! Upload orchestration
//!
//! An [`Uploader`] fetches a fresh credential bundle for every upload, stages
//! the file when the supervised mechanism needs it, runs the transfer and
//! reports the terminal outcome exactly once.

use crate::client::config::ClientConfig;
use crate::client::http_client;
use crate::credential::CredentialClient;
use crate::error::{Result, UploadError};
use crate::types::{CredentialBundle, MediaFile};
use crate::upload::executor::TransferExecutor;
use crate::upload::staging::StagingArea;
use crate::upload::state::{UploadAttempt, UploadState};
use crate::upload::task::{HttpTaskManager, TaskManager};
use crate::upload::types::{TransferOutcome, UploadMode, UploadOptions, UploadReceipt, UploadSink};
use std::sync::Arc;
use uuid::Uuid;

/// Everything known about one finished attempt
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub attempt_id: Uuid,
    pub final_state: UploadState,
    pub history: Vec<UploadState>,
    pub outcome: TransferOutcome,
    pub error: Option<UploadError>,
}

/// Direct-upload client
///
/// Uploads share no mutable state; concurrent calls on one `Uploader` each
/// own their credential bundle, file handle and staged copy.
#[derive(Debug, Clone)]
pub struct Uploader {
    config: ClientConfig,
    credentials: CredentialClient,
    executor: TransferExecutor,
    staging: StagingArea,
}

impl Uploader {
    /// Create an uploader using the built-in HTTP task mechanism
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = http_client(&config)?;
        let staging = StagingArea::new(config.resolved_staging_dir());
        let manager = Arc::new(HttpTaskManager::new(http, staging));
        Self::with_task_manager(config, manager)
    }

    /// Create an uploader with a custom supervised-transfer mechanism
    pub fn with_task_manager(config: ClientConfig, manager: Arc<dyn TaskManager>) -> Result<Self> {
        config.validate()?;
        let http = http_client(&config)?;

        Ok(Self {
            credentials: CredentialClient::new(&config)?,
            executor: TransferExecutor::new(http, config.storage_scheme.clone(), manager),
            staging: StagingArea::new(config.resolved_staging_dir()),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Upload a file and return its terminal outcome
    pub async fn upload(&self, file: &MediaFile, options: UploadOptions) -> TransferOutcome {
        self.upload_report(file, options).await.outcome
    }

    /// Upload a file and return the full attempt report
    ///
    /// The sink, if any, receives exactly one `on_success` or `on_failure`.
    pub async fn upload_report(&self, file: &MediaFile, options: UploadOptions) -> UploadReport {
        let mut attempt = UploadAttempt::new();
        let sink = options.sink.clone();

        log::info!(
            "upload {}: {} ({} bytes, {} mode)",
            attempt.id(),
            file.display_name(),
            file.size_bytes(),
            options.mode
        );

        let result = self.run(&mut attempt, file, options).await;

        let outcome = match &result {
            Ok(receipt) => {
                log::info!("upload {}: stored as {}", attempt.id(), receipt.object_key);
                if let Some(sink) = sink.as_ref() {
                    sink.on_success(receipt);
                }
                TransferOutcome::Success(receipt.clone())
            }
            Err(e) => {
                log::warn!("upload {}: failed in {}: {}", attempt.id(), attempt.state(), e);
                if let Some(sink) = sink.as_ref() {
                    sink.on_failure(e.kind(), &e.to_string());
                }
                TransferOutcome::from(e)
            }
        };

        UploadReport {
            attempt_id: attempt.id(),
            final_state: attempt.state(),
            history: attempt.history().to_vec(),
            outcome,
            error: result.err(),
        }
    }

    async fn run(
        &self,
        attempt: &mut UploadAttempt,
        file: &MediaFile,
        options: UploadOptions,
    ) -> Result<UploadReceipt> {
        attempt.advance(UploadState::FetchingCredential)?;

        let credential = match self
            .credentials
            .fetch_signature(&file.signing_extension())
            .await
        {
            Ok(credential) => credential,
            Err(e) => {
                attempt.advance(UploadState::after_signing_error(&e))?;
                return Err(e);
            }
        };

        attempt.advance(UploadState::CredentialReady)?;
        attempt.advance(UploadState::Transferring)?;

        let mode = options
            .mode
            .resolve(file.size_bytes(), self.config.supervised_threshold);
        let result = self.transfer(file, credential, mode, options.sink).await;

        attempt.advance(if result.is_ok() {
            UploadState::Succeeded
        } else {
            UploadState::TransferFailed
        })?;
        result
    }

    async fn transfer(
        &self,
        file: &MediaFile,
        credential: CredentialBundle,
        mode: UploadMode,
        sink: Option<Arc<dyn UploadSink>>,
    ) -> Result<UploadReceipt> {
        if mode != UploadMode::Supervised || !self.executor.requires_staging() {
            return self.executor.send(file, credential, mode, sink).await;
        }

        // A failed copy ends the attempt before any progress or PUT.
        let staged = self.staging.stage(file).await?;
        let result = self.executor.send(&staged, credential, mode, sink).await;
        self.staging.release(&staged).await;
        result
    }
}
