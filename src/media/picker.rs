//! Picker and media-info collaborators

use crate::error::{Result, UploadError};
use crate::types::{MediaFile, MediaLocator};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Display metadata for a located file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub display_name: String,
    pub size_bytes: u64,
}

/// Source of the file to upload
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Returns zero or one selected locator
    async fn pick(&self) -> Result<Option<MediaLocator>>;
}

/// Looks up display name and size for a locator
#[async_trait]
pub trait MediaInfoProvider: Send + Sync {
    /// Returns `None` when the locator does not resolve to a file
    async fn media_info(&self, locator: &MediaLocator) -> Result<Option<MediaInfo>>;
}

/// A picker that always selects a fixed path, or nothing
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    path: Option<PathBuf>,
}

impl PathPicker {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn empty() -> Self {
        Self { path: None }
    }
}

#[async_trait]
impl MediaPicker for PathPicker {
    async fn pick(&self) -> Result<Option<MediaLocator>> {
        Ok(self.path.as_deref().map(MediaLocator::from))
    }
}

/// Media info backed by filesystem metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMediaInfo;

#[async_trait]
impl MediaInfoProvider for FsMediaInfo {
    async fn media_info(&self, locator: &MediaLocator) -> Result<Option<MediaInfo>> {
        let path = locator.to_path()?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(UploadError::file_access(
                    path.display().to_string(),
                    e.to_string(),
                ))
            }
        };

        if !metadata.is_file() {
            return Ok(None);
        }

        let display_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Ok(None),
        };

        Ok(Some(MediaInfo {
            display_name,
            size_bytes: metadata.len(),
        }))
    }
}

/// Runs the picker and resolves its selection into a [`MediaFile`]
///
/// Nothing selected, or a selection whose info cannot be found, is `Ok(None)`.
pub async fn select_media(
    picker: &dyn MediaPicker,
    info: &dyn MediaInfoProvider,
) -> Result<Option<MediaFile>> {
    let locator = match picker.pick().await? {
        Some(locator) => locator,
        None => {
            log::debug!("no media selected");
            return Ok(None);
        }
    };

    match info.media_info(&locator).await? {
        Some(info) => Ok(Some(MediaFile::new(
            locator,
            info.display_name,
            info.size_bytes,
        ))),
        None => {
            log::warn!("no media info found for {}", locator);
            Ok(None)
        }
    }
}
