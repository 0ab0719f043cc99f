//! Signing request implementation

use crate::client::config::ClientConfig;
use crate::client::http_client;
use crate::credential::types::SignResponse;
use crate::error::{Result, UploadError};
use crate::types::CredentialBundle;
use reqwest::StatusCode;

/// Client for the `sts-direct-sign` endpoint
///
/// Every call issues exactly one request; nothing is retried or cached.
#[derive(Debug, Clone)]
pub struct CredentialClient {
    http: reqwest::Client,
    sign_url: String,
}

impl CredentialClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http: http_client(config)?,
            sign_url: config.sign_url(),
        })
    }

    pub fn sign_url(&self) -> &str {
        &self.sign_url
    }

    /// Fetch a credential bundle for a file with the given extension
    ///
    /// # Errors
    ///
    /// - `Transport` if the request cannot be sent or the body cannot be read
    /// - `HttpStatus` for any status other than 200
    /// - `Application` when the envelope carries a non-zero code
    /// - `MalformedResponse` when the body is not a complete envelope
    pub async fn fetch_signature(&self, extension: &str) -> Result<CredentialBundle> {
        log::debug!("requesting upload signature for ext={:?}", extension);

        // The response owns the connection; it is dropped on every path out of
        // this function, and the client keeps no idle connections.
        let response = self
            .http
            .get(&self.sign_url)
            .query(&[("ext", extension)])
            .send()
            .await
            .map_err(|e| UploadError::transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            log::warn!("signing backend answered HTTP {}", status.as_u16());
            return Err(UploadError::http_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UploadError::transport(e.to_string()))?;

        let bundle = SignResponse::from_slice(&body)?
            .into_bundle()
            .inspect_err(|e| log::warn!("signing failed: {}", e))?;

        log::info!("received upload signature for key {}", bundle.object_key());
        Ok(bundle)
    }
}
