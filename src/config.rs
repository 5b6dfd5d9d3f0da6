/// Largest archive accepted by the upload gate (500 MiB).
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 500 * 1024 * 1024;

/// Chunk size used when reading an upload (2 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Largest entry that may be previewed in place (10 MiB).
pub const DEFAULT_PREVIEW_LIMIT: u64 = 10 * 1024 * 1024;

/// Largest decompressed size of a single entry (500 MiB).
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 500 * 1024 * 1024;

/// Largest decompressed size of a whole archive (2 GiB).
pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Limits applied by a [`ViewerSession`](crate::ViewerSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Uploads strictly larger than this are rejected before reading.
    pub max_archive_size: u64,
    /// Bytes requested from the source per read.
    pub chunk_size: usize,
    /// Entries strictly larger than this are not served for preview.
    pub preview_limit: u64,
    /// Entries declaring a larger decompressed size fail the upload.
    pub max_entry_size: u64,
    /// Bound on the summed decompressed size of all entries.
    pub max_total_size: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
        }
    }
}

impl ViewerConfig {
    pub fn with_max_archive_size(mut self, max_archive_size: u64) -> Self {
        self.max_archive_size = max_archive_size;
        self
    }

    /// Set the read chunk size. Zero is clamped to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_preview_limit(mut self, preview_limit: u64) -> Self {
        self.preview_limit = preview_limit;
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    pub fn with_max_total_size(mut self, max_total_size: u64) -> Self {
        self.max_total_size = max_total_size;
        self
    }
}
