//! Closed error taxonomy of the archive pipeline.
//!
//! Every stage (gate, chunked read, decode, projection, content retrieval)
//! reports exactly one [`ArchiveError`]. The presentation layer matches on
//! [`ErrorKind`] exhaustively.

use std::fmt;
use thiserror::Error;

/// Failure surfaced to the caller of an upload or content lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("{0}")]
    SizeExceeded(String),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Corrupt(String),

    #[error("{0}")]
    Empty(String),

    #[error("{0}")]
    Unknown(String),
}

/// Discriminant of [`ArchiveError`] without its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SizeExceeded,
    UnsupportedFormat,
    Corrupt,
    Empty,
    Unknown,
}

/// How the presentation layer should tint an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, nothing went wrong with the input itself.
    Notice,
    /// Pre-flight rejection; the input was never decoded.
    Rejection,
    /// Hard failure during read or decode.
    Failure,
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::SizeExceeded(_) => ErrorKind::SizeExceeded,
            ArchiveError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ArchiveError::Corrupt(_) => ErrorKind::Corrupt,
            ArchiveError::Empty(_) => ErrorKind::Empty,
            ArchiveError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind().severity()
    }

    pub fn message(&self) -> &str {
        match self {
            ArchiveError::SizeExceeded(m)
            | ArchiveError::UnsupportedFormat(m)
            | ArchiveError::Corrupt(m)
            | ArchiveError::Empty(m)
            | ArchiveError::Unknown(m) => m,
        }
    }

    /// Wrap a low-level parse failure.
    pub(crate) fn corrupt(err: anyhow::Error) -> Self {
        ArchiveError::Corrupt(format!("archive is corrupt: {err:#}"))
    }
}

impl ErrorKind {
    pub fn severity(self) -> Severity {
        match self {
            ErrorKind::Empty => Severity::Notice,
            ErrorKind::SizeExceeded | ErrorKind::UnsupportedFormat => Severity::Rejection,
            ErrorKind::Corrupt | ErrorKind::Unknown => Severity::Failure,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::SizeExceeded => "size",
            ErrorKind::UnsupportedFormat => "format",
            ErrorKind::Corrupt => "corrupt",
            ErrorKind::Empty => "empty",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

impl From<anyhow::Error> for ArchiveError {
    fn from(err: anyhow::Error) -> Self {
        ArchiveError::Unknown(format!("{err:#}"))
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Unknown(err.to_string())
    }
}
