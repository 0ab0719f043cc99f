//! Media selection and file-name helpers
//!
//! The picker and media-info lookups are external collaborators; this module
//! defines their seams and a filesystem-backed implementation.

pub mod picker;

pub use picker::{select_media, FsMediaInfo, MediaInfo, MediaInfoProvider, MediaPicker, PathPicker};

/// Extension used to derive the storage key
///
/// Returns the substring after the last `.`; a name without any `.` is
/// returned unchanged.
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) => &file_name[index + 1..],
        None => file_name,
    }
}

/// Content type guessed from a file name, falling back to octet-stream
pub fn guess_content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
