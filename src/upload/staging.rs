//! Application-private staging area
//!
//! Supervised transfers only accept `internal://cache/<name>` locators. Files
//! are copied here first under a collision-free name; a copy only becomes
//! visible under that name once it is complete.

use crate::error::{Result, UploadError};
use crate::types::{MediaFile, MediaLocator};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy a file into the staging area and return it under its staged locator
    ///
    /// On failure nothing is left behind under the staged name.
    pub async fn stage(&self, file: &MediaFile) -> Result<MediaFile> {
        let source = file
            .locator()
            .to_path()
            .map_err(|e| UploadError::staging(e.to_string()))?;
        let root = self.root.clone();
        let staged_name = staged_file_name(file.display_name());
        let target = root.join(&staged_name);

        log::debug!("staging {} as {}", source.display(), target.display());

        tokio::task::spawn_blocking(move || copy_into(&root, &source, &target))
            .await
            .map_err(|e| UploadError::staging(format!("staging task failed: {}", e)))?
            .map_err(|e| UploadError::staging(e.to_string()))?;

        Ok(file.with_locator(MediaLocator::staged(&staged_name)))
    }

    /// Filesystem path behind a staged locator
    pub fn resolve(&self, locator: &MediaLocator) -> Result<PathBuf> {
        let name = locator.staged_name().ok_or_else(|| {
            UploadError::invalid_parameter(
                "locator",
                format!("{} is not a staged locator", locator),
            )
        })?;

        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(UploadError::invalid_parameter(
                "locator",
                format!("{} escapes the staging area", locator),
            ));
        }

        Ok(self.root.join(name))
    }

    /// Remove a staged copy once its transfer is over
    pub async fn release(&self, staged: &MediaFile) {
        let path = match self.resolve(staged.locator()) {
            Ok(path) => path,
            Err(_) => return,
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("failed to remove staged file {}: {}", path.display(), e);
        }
    }
}

fn copy_into(root: &Path, source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(root)?;

    let mut input = fs::File::open(source)?;
    // Dropped (and deleted) on every error path before the rename below.
    let mut staged = NamedTempFile::new_in(root)?;
    io::copy(&mut input, staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    staged.persist_noclobber(target).map_err(|e| e.error)?;
    Ok(())
}

/// `<stem>-<uuid>.<ext>` derived from a display name
pub fn staged_file_name(display_name: &str) -> String {
    let sanitized: String = display_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let unique = Uuid::new_v4().simple();

    match sanitized.rfind('.') {
        Some(index) if index > 0 => format!(
            "{}-{}{}",
            &sanitized[..index],
            unique,
            &sanitized[index..]
        ),
        _ if sanitized.is_empty() => unique.to_string(),
        _ => format!("{}-{}", sanitized, unique),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_staged_file_names_are_unique() {
        let first = staged_file_name("photo.jpg");
        let second = staged_file_name("photo.jpg");

        assert_ne!(first, second);
        assert!(first.starts_with("photo-"));
        assert!(first.ends_with(".jpg"));
    }

    #[test]
    fn test_staged_file_name_sanitizes() {
        let name = staged_file_name("../my photo.png");
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
        assert!(name.ends_with(".png"));

        let name = staged_file_name("README");
        assert!(name.starts_with("README-"));

        let name = staged_file_name(".hidden");
        assert!(name.starts_with(".hidden-"));
    }

    #[tokio::test]
    async fn test_stage_copies_and_rewrites_locator() {
        let source_dir = tempdir().unwrap();
        let staging_dir = tempdir().unwrap();
        let source = write_file(source_dir.path(), "clip.mp4", b"movie bytes");

        let area = StagingArea::new(staging_dir.path().join("cache"));
        let file = MediaFile::new(source.as_path(), "clip.mp4", 11);
        let staged = area.stage(&file).await.unwrap();

        assert!(staged.locator().is_staged());
        assert_eq!(staged.display_name(), "clip.mp4");
        let path = area.resolve(staged.locator()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"movie bytes");

        area.release(&staged).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_stage_missing_source_leaves_nothing() {
        let staging_dir = tempdir().unwrap();
        let area = StagingArea::new(staging_dir.path());
        let file = MediaFile::new("/definitely/not/here.jpg", "here.jpg", 1);

        let err = area.stage(&file).await.unwrap_err();
        assert!(matches!(err, UploadError::Staging { .. }));
        assert_eq!(fs::read_dir(staging_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_stage_into_unusable_root_fails() {
        let dir = tempdir().unwrap();
        let source = write_file(dir.path(), "a.jpg", b"a");
        let blocker = write_file(dir.path(), "blocker", b"not a directory");

        let area = StagingArea::new(blocker.join("cache"));
        let err = area
            .stage(&MediaFile::new(source.as_path(), "a.jpg", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Staging { .. }));
    }

    #[test]
    fn test_resolve_rejects_foreign_locators() {
        let area = StagingArea::new("/tmp/staging");
        assert!(area.resolve(&MediaLocator::new("/tmp/a.jpg")).is_err());
        assert!(area
            .resolve(&MediaLocator::new("internal://cache/../etc/passwd"))
            .is_err());
        assert_eq!(
            area.resolve(&MediaLocator::staged("a-1.jpg")).unwrap(),
            PathBuf::from("/tmp/staging/a-1.jpg")
        );
    }
}
