//! Session-scoped viewer state.
//!
//! A [`ViewerSession`] holds the current listing, the read progress of the
//! upload in flight and the last error. Every upload takes a fresh
//! [`UploadTicket`]; only results carrying the latest ticket are published,
//! and publishing replaces the previous listing and releases its content.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ViewerConfig;
use crate::content::ContentStore;
use crate::error::ArchiveError;
use crate::gate::{UploadCandidate, check_upload};
use crate::io::{ChunkedReader, ReadAt, UploadProgress};
use crate::listing::{ArchiveEntry, ArchiveStats, EntryKind, EntryProjector, Listing};
use crate::ticket::{Generation, UploadTicket};
use crate::zip::ArchiveDecoder;

#[derive(Default)]
struct SessionState {
    listing: Option<Listing>,
    progress: Option<UploadProgress>,
    error: Option<ArchiveError>,
}

/// Point-in-time copy of what the presentation layer shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingSnapshot {
    pub entries: Vec<ArchiveEntry>,
    /// `None` until an upload has been published.
    pub stats: Option<ArchiveStats>,
    /// `Some` only while an upload is in its read phase.
    pub progress: Option<UploadProgress>,
    pub error: Option<ArchiveError>,
}

impl ListingSnapshot {
    pub fn find(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }
}

/// Result of handing a pipeline result to [`ViewerSession::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The listing is now current.
    Published(ArchiveStats),
    /// The upload failed; the error is now current and no listing is shown.
    Failed(ArchiveError),
    /// A newer upload started meanwhile; the result was discarded.
    Superseded,
}

pub struct ViewerSession {
    config: ViewerConfig,
    store: ContentStore,
    generation: Generation,
    state: Mutex<SessionState>,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            store: ContentStore::new(),
            generation: Generation::default(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new upload, superseding any upload still in flight.
    pub fn begin_upload(&self) -> UploadTicket {
        let _state = self.lock();
        self.generation.advance()
    }

    /// Run gate, chunked read, decode and projection for one upload.
    ///
    /// Progress is recorded in the session (and passed to `observer`) only
    /// while `ticket` is current. The returned listing is not published.
    pub async fn process<R, F>(
        &self,
        ticket: &UploadTicket,
        name: &str,
        source: &R,
        mut observer: F,
    ) -> Result<Listing, ArchiveError>
    where
        R: ReadAt + ?Sized,
        F: FnMut(UploadProgress),
    {
        let candidate = UploadCandidate::new(name, source.size());
        if let Err(err) = check_upload(&candidate, &self.config) {
            tracing::info!(name, size = candidate.size, error = %err, "upload rejected");
            return Err(err);
        }

        self.start_read(ticket, candidate.size);
        let buffer = ChunkedReader::new(self.config.chunk_size)
            .read_all(source, ticket, |progress| {
                if self.record_progress(ticket, Some(progress)) {
                    observer(progress);
                }
            })
            .await?;
        self.record_progress(ticket, None);

        let archive = ArchiveDecoder::decode(buffer).await?;
        let entries = EntryProjector::new(&self.store)
            .with_limits(self.config.max_entry_size, self.config.max_total_size)
            .project(&archive, ticket)
            .await?;
        Ok(Listing::new(entries))
    }

    /// Make `result` current if `ticket` is still the latest upload.
    ///
    /// Whatever happens, the previous listing or the stale result has its
    /// content released exactly once.
    pub fn publish(
        &self,
        ticket: &UploadTicket,
        result: Result<Listing, ArchiveError>,
    ) -> PublishOutcome {
        let mut state = self.lock();

        if !ticket.is_current() {
            if let Ok(listing) = result {
                let released = listing.release(&self.store);
                tracing::debug!(generation = ticket.generation(), released, "discarded superseded listing");
            }
            return PublishOutcome::Superseded;
        }

        if let Some(previous) = state.listing.take() {
            let released = previous.release(&self.store);
            tracing::debug!(released, "released previous listing");
        }
        state.progress = None;

        match result {
            Ok(listing) => {
                let stats = listing.stats;
                tracing::info!(
                    files = stats.file_count,
                    directories = stats.directory_count,
                    total_size = stats.total_size,
                    "listing published"
                );
                state.listing = Some(listing);
                state.error = None;
                PublishOutcome::Published(stats)
            }
            Err(err) => {
                tracing::info!(kind = %err.kind(), error = %err, "upload failed");
                state.error = Some(err.clone());
                PublishOutcome::Failed(err)
            }
        }
    }

    /// Upload `source` under `name` and publish the result.
    pub async fn upload<R>(&self, name: &str, source: &R) -> PublishOutcome
    where
        R: ReadAt + ?Sized,
    {
        self.upload_with(name, source, |_| {}).await
    }

    /// [`upload`](Self::upload), reporting read progress to `observer`.
    pub async fn upload_with<R, F>(&self, name: &str, source: &R, observer: F) -> PublishOutcome
    where
        R: ReadAt + ?Sized,
        F: FnMut(UploadProgress),
    {
        let ticket = self.begin_upload();
        let result = self.process(&ticket, name, source, observer).await;
        self.publish(&ticket, result)
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        let state = self.lock();
        ListingSnapshot {
            entries: state
                .listing
                .as_ref()
                .map(|listing| listing.entries.clone())
                .unwrap_or_default(),
            stats: state.listing.as_ref().map(|listing| listing.stats),
            progress: state.progress,
            error: state.error.clone(),
        }
    }

    /// Content of a file entry for in-place preview.
    ///
    /// Entries above the preview limit are refused with
    /// [`ArchiveError::SizeExceeded`]; use [`download`](Self::download).
    pub fn load_content(&self, entry: &ArchiveEntry) -> Result<Arc<[u8]>, ArchiveError> {
        let size = entry.size.unwrap_or(0);
        if entry.kind == EntryKind::File && size > self.config.preview_limit {
            return Err(ArchiveError::SizeExceeded(format!(
                "{} is too large to preview ({} bytes, limit {} bytes)",
                entry.name, size, self.config.preview_limit
            )));
        }
        self.download(entry)
    }

    /// Content of a file entry, regardless of size.
    pub fn download(&self, entry: &ArchiveEntry) -> Result<Arc<[u8]>, ArchiveError> {
        let content_ref = match (entry.kind, entry.content_ref) {
            (EntryKind::Directory, _) => {
                return Err(ArchiveError::Unknown(format!("{} is a directory", entry.path)));
            }
            (EntryKind::File, None) => {
                return Err(ArchiveError::Unknown(format!("{} has no content", entry.path)));
            }
            (EntryKind::File, Some(content_ref)) => content_ref,
        };

        self.store.resolve(content_ref).ok_or_else(|| {
            ArchiveError::Unknown(format!("content of {} is no longer available", entry.path))
        })
    }

    /// Drop the current listing, release its content and supersede any
    /// upload in flight.
    pub fn clear(&self) {
        let mut state = self.lock();
        self.generation.advance();
        if let Some(listing) = state.listing.take() {
            let released = listing.release(&self.store);
            tracing::debug!(released, "session cleared");
        }
        *state = SessionState::default();
    }

    fn start_read(&self, ticket: &UploadTicket, total: u64) {
        let mut state = self.lock();
        if ticket.is_current() {
            state.error = None;
            state.progress = Some(UploadProgress::new(0, total));
        }
    }

    /// Returns whether the update was applied.
    fn record_progress(&self, ticket: &UploadTicket, progress: Option<UploadProgress>) -> bool {
        let mut state = self.lock();
        if !ticket.is_current() {
            return false;
        }
        state.progress = progress;
        true
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.clear();
    }
}
