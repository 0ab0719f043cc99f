//! Wire types of the signing endpoint

use crate::error::{Result, UploadError};
use crate::types::CredentialBundle;
use serde::{Deserialize, Serialize};

/// `{code, message?, data?}` envelope returned by the signing backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SignData>,
}

/// Credential fields inside a successful envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignData {
    pub cos_host: Option<String>,
    pub cos_key: Option<String>,
    pub authorization: Option<String>,
    pub security_token: Option<String>,
}

impl SignResponse {
    /// Parse a response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| UploadError::malformed(format!("invalid JSON body: {}", e)))
    }

    /// Validate the envelope and extract the credential bundle
    ///
    /// `code == 0` is success; any other code is an application error. A
    /// success without all four credential fields is malformed.
    pub fn into_bundle(self) -> Result<CredentialBundle> {
        let code = self
            .code
            .ok_or_else(|| UploadError::malformed("missing field: code"))?;

        if code != 0 {
            return Err(UploadError::application(
                code,
                self.message.unwrap_or_default(),
            ));
        }

        let data = self
            .data
            .ok_or_else(|| UploadError::malformed("missing field: data"))?;

        Ok(CredentialBundle::new(
            required(data.cos_host, "cosHost")?,
            required(data.cos_key, "cosKey")?,
            required(data.authorization, "authorization")?,
            required(data.security_token, "securityToken")?,
        ))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(UploadError::malformed(format!("missing field: data.{}", field))),
    }
}
