//! Core value types for direct uploads

use crate::error::{Result, UploadError};
use crate::media::file_extension;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Locator prefix of files copied into the application-private staging area
pub const STAGED_LOCATOR_PREFIX: &str = "internal://cache/";

/// Opaque reference to file content
///
/// A locator is either a plain filesystem path, a `file://` URI, or a staged
/// locator of the form `internal://cache/<name>` that only resolves against a
/// staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaLocator(String);

impl MediaLocator {
    /// Creates a new locator from a string without validation
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Creates the staged locator for a file name inside the staging area
    pub fn staged(file_name: &str) -> Self {
        Self(format!("{}{}", STAGED_LOCATOR_PREFIX, file_name))
    }

    /// Returns the locator as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the locator and returns the inner String
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this locator points into the staging area
    pub fn is_staged(&self) -> bool {
        self.0.starts_with(STAGED_LOCATOR_PREFIX)
    }

    /// File name inside the staging area, for staged locators
    pub fn staged_name(&self) -> Option<&str> {
        self.0
            .strip_prefix(STAGED_LOCATOR_PREFIX)
            .filter(|name| !name.is_empty())
    }

    /// Resolves a native locator to a filesystem path
    ///
    /// Staged locators are rejected here; they are resolved by the staging area.
    pub fn to_path(&self) -> Result<PathBuf> {
        if self.is_staged() {
            return Err(UploadError::invalid_parameter(
                "locator",
                format!("staged locator {} has no native path", self.0),
            ));
        }

        if self.0.starts_with("file://") {
            let url = url::Url::parse(&self.0).map_err(|e| {
                UploadError::invalid_parameter("locator", format!("invalid file URI: {}", e))
            })?;
            return url.to_file_path().map_err(|_| {
                UploadError::invalid_parameter(
                    "locator",
                    format!("file URI {} is not a local path", self.0),
                )
            });
        }

        if self.0.is_empty() {
            return Err(UploadError::invalid_parameter(
                "locator",
                "Locator cannot be empty",
            ));
        }

        Ok(PathBuf::from(&self.0))
    }
}

impl Display for MediaLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MediaLocator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MediaLocator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&Path> for MediaLocator {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

/// A file selected for upload
///
/// Produced by the media collaborators and immutable once constructed; staging
/// yields a new `MediaFile` with a rewritten locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    locator: MediaLocator,
    display_name: String,
    size_bytes: u64,
}

impl MediaFile {
    pub fn new(
        locator: impl Into<MediaLocator>,
        display_name: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            locator: locator.into(),
            display_name: display_name.into(),
            size_bytes,
        }
    }

    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Lower-cased extension used to ask the signing backend for an object key
    pub fn signing_extension(&self) -> String {
        file_extension(&self.display_name).to_lowercase()
    }

    /// Same file, addressed through another locator
    pub fn with_locator(&self, locator: MediaLocator) -> Self {
        Self {
            locator,
            display_name: self.display_name.clone(),
            size_bytes: self.size_bytes,
        }
    }
}

/// Short-lived credentials scoped to a single object key
///
/// A bundle is consumed by exactly one transfer; it is deliberately neither
/// `Clone` nor `Serialize`.
#[derive(PartialEq, Eq)]
pub struct CredentialBundle {
    host: String,
    object_key: String,
    authorization: String,
    security_token: String,
}

impl CredentialBundle {
    pub fn new(
        host: impl Into<String>,
        object_key: impl Into<String>,
        authorization: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            object_key: object_key.into(),
            authorization: authorization.into(),
            security_token: security_token.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn security_token(&self) -> &str {
        &self.security_token
    }

    /// `{scheme}://{host}/{object_key}`, concatenated as-is
    pub fn object_url(&self, scheme: &str) -> String {
        format!("{}://{}/{}", scheme, self.host, self.object_key)
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("host", &self.host)
            .field("object_key", &self.object_key)
            .field("authorization", &"<redacted>")
            .field("security_token", &"<redacted>")
            .finish()
    }
}
