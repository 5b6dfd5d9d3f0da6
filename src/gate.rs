//! Pre-flight checks on an upload, run before any byte is read.

use crate::config::ViewerConfig;
use crate::error::ArchiveError;

/// The only archive extension the viewer accepts.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// What is known about an upload before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub size: u64,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

fn has_archive_extension(name: &str) -> bool {
    let ext = ARCHIVE_EXTENSION.len();
    name.len() > ext
        && name.is_char_boundary(name.len() - ext)
        && name[name.len() - ext..].eq_ignore_ascii_case(ARCHIVE_EXTENSION)
}

/// Accept or reject `candidate` on name and size alone.
pub fn check_upload(candidate: &UploadCandidate, config: &ViewerConfig) -> Result<(), ArchiveError> {
    if !has_archive_extension(&candidate.name) {
        return Err(ArchiveError::UnsupportedFormat(format!(
            "{} is not a ZIP archive (expected a {} file)",
            candidate.name, ARCHIVE_EXTENSION
        )));
    }

    if candidate.size > config.max_archive_size {
        return Err(ArchiveError::SizeExceeded(format!(
            "{} is {} bytes, the limit is {} bytes",
            candidate.name, candidate.size, config.max_archive_size
        )));
    }

    Ok(())
}
