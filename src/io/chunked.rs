//! Sequential chunked reads with progress reporting.

use super::ReadAt;
use crate::error::ArchiveError;
use crate::ticket::UploadTicket;

/// Byte counters for the read phase of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.loaded as f64 * 100.0 / self.total as f64
        }
    }

    /// True once every byte of the source has been read.
    pub fn is_complete(&self) -> bool {
        self.loaded == self.total
    }
}

/// Reads a whole source into memory, one fixed-size chunk at a time.
pub struct ChunkedReader {
    chunk_size: usize,
}

impl ChunkedReader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read every byte of `source`.
    ///
    /// `on_progress` runs after each chunk with a non-decreasing `loaded`;
    /// the last call reports `loaded == total`. Stops with an error as
    /// soon as `ticket` is superseded.
    pub async fn read_all<R, F>(
        &self,
        source: &R,
        ticket: &UploadTicket,
        mut on_progress: F,
    ) -> Result<Vec<u8>, ArchiveError>
    where
        R: ReadAt + ?Sized,
        F: FnMut(UploadProgress),
    {
        let total = source.size();
        let capacity = usize::try_from(total).map_err(|_| {
            ArchiveError::SizeExceeded(format!("{total} bytes do not fit in memory"))
        })?;

        let mut buffer = vec![0u8; capacity];
        if total == 0 {
            on_progress(UploadProgress::new(0, 0));
            return Ok(buffer);
        }

        let mut loaded = 0usize;
        while loaded < capacity {
            if !ticket.is_current() {
                return Err(ArchiveError::Unknown("upload superseded".to_string()));
            }

            let end = (loaded + self.chunk_size).min(capacity);
            source
                .read_exact_at(loaded as u64, &mut buffer[loaded..end])
                .await
                .map_err(|e| {
                    ArchiveError::Unknown(format!("failed to read upload at byte {loaded}: {e:#}"))
                })?;
            loaded = end;

            on_progress(UploadProgress::new(loaded as u64, total));
        }

        tracing::debug!(total, chunk_size = self.chunk_size, "read phase complete");
        Ok(buffer)
    }
}
