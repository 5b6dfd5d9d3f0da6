//! Listing model: projected entries, their order, and aggregate stats.

mod entry;
mod projector;
mod stats;

pub use entry::{ArchiveEntry, EntryKind, display_name, listing_order, sort_entries};
pub use projector::EntryProjector;
pub use stats::ArchiveStats;

use crate::content::ContentStore;

/// A fully projected, sorted archive listing.
///
/// The listing owns the content handles of its file entries. Dropping it
/// without [`release`](Listing::release) leaks them in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<ArchiveEntry>,
    pub stats: ArchiveStats,
}

impl Listing {
    /// Sort `entries` into listing order and compute their stats.
    pub fn new(mut entries: Vec<ArchiveEntry>) -> Self {
        sort_entries(&mut entries);
        let stats = ArchiveStats::from_entries(&entries);
        Self { entries, stats }
    }

    pub fn find(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Release every content handle this listing owns, consuming it.
    pub fn release(self, store: &ContentStore) -> usize {
        store.release_all(self.entries.into_iter().filter_map(|entry| entry.content_ref))
    }
}
