use super::entry::{ArchiveEntry, EntryKind};

/// Counts and total size over a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub file_count: usize,
    pub directory_count: usize,
    pub total_size: u64,
}

impl ArchiveStats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ArchiveEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut stats, entry| {
                match entry.kind {
                    EntryKind::Directory => stats.directory_count += 1,
                    EntryKind::File => {
                        stats.file_count += 1;
                        stats.total_size += entry.size.unwrap_or(0);
                    }
                }
                stats
            })
    }

    pub fn entry_count(&self) -> usize {
        self.file_count + self.directory_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStore;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(ArchiveStats::from_entries(std::iter::empty()), ArchiveStats::default());
    }

    #[test]
    fn counts_and_sums() {
        let store = ContentStore::new();
        let entries = [
            ArchiveEntry::file("a.txt", 12, store.create(vec![0; 12])),
            ArchiveEntry::directory("img/"),
            ArchiveEntry::file("img/b.png", 2048, store.create(vec![0; 2048])),
        ];
        let stats = ArchiveStats::from_entries(&entries);
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.directory_count, 1);
        assert_eq!(stats.total_size, 2060);
        assert_eq!(stats.entry_count(), 3);
    }
}
