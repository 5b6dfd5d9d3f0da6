use crate::content::{ContentRef, ContentStore};
use crate::error::ArchiveError;
use crate::ticket::UploadTicket;
use crate::zip::DecodedArchive;

use super::entry::ArchiveEntry;

/// Turns decoded records into listing entries, registering file content
/// in a [`ContentStore`].
pub struct EntryProjector<'a> {
    store: &'a ContentStore,
    max_entry_size: u64,
    max_total_size: u64,
}

impl<'a> EntryProjector<'a> {
    /// A projector without size limits.
    pub fn new(store: &'a ContentStore) -> Self {
        Self {
            store,
            max_entry_size: u64::MAX,
            max_total_size: u64::MAX,
        }
    }

    /// Refuse entries whose declared decompressed size exceeds
    /// `max_entry_size`, or archives whose entries sum past `max_total_size`.
    pub fn with_limits(mut self, max_entry_size: u64, max_total_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self.max_total_size = max_total_size;
        self
    }

    /// Project every entry of `archive`, one at a time.
    ///
    /// All or nothing: if any entry fails to materialize (or `ticket` is
    /// superseded), the handles created so far are released and the error
    /// is returned.
    pub async fn project(
        &self,
        archive: &DecodedArchive,
        ticket: &UploadTicket,
    ) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut created: Vec<ContentRef> = Vec::new();
        match self.project_into(archive, ticket, &mut created).await {
            Ok(entries) => Ok(entries),
            Err(err) => {
                let released = self.store.release_all(created);
                tracing::debug!(released, error = %err, "projection aborted");
                Err(err)
            }
        }
    }

    async fn project_into(
        &self,
        archive: &DecodedArchive,
        ticket: &UploadTicket,
        created: &mut Vec<ContentRef>,
    ) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut entries = Vec::with_capacity(archive.len());
        let mut total: u64 = 0;

        for record in archive.entries() {
            if !ticket.is_current() {
                return Err(ArchiveError::Unknown("upload superseded".to_string()));
            }

            if record.is_directory {
                entries.push(ArchiveEntry::directory(&record.file_name));
                continue;
            }

            // Inflation stops at the declared size, so checking it bounds memory.
            let declared = record.uncompressed_size;
            if declared > self.max_entry_size {
                return Err(ArchiveError::SizeExceeded(format!(
                    "{} expands to {declared} bytes (limit {} bytes)",
                    record.file_name, self.max_entry_size
                )));
            }
            total = total.saturating_add(declared);
            if total > self.max_total_size {
                return Err(ArchiveError::SizeExceeded(format!(
                    "archive expands to more than {} bytes",
                    self.max_total_size
                )));
            }

            let bytes = archive.materialize(record).await?;
            let size = bytes.len() as u64;
            let content_ref = self.store.create(bytes);
            created.push(content_ref);
            entries.push(ArchiveEntry::file(&record.file_name, size, content_ref));
        }

        Ok(entries)
    }
}
