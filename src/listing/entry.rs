use std::cmp::Ordering;

use crate::content::ContentRef;

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// One projected archive entry as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Final path segment.
    pub name: String,
    /// Full path inside the archive.
    pub path: String,
    pub kind: EntryKind,
    /// Decompressed size; files only.
    pub size: Option<u64>,
    /// Handle to the decompressed bytes; files only.
    pub content_ref: Option<ContentRef>,
}

impl ArchiveEntry {
    pub fn directory(path: &str) -> Self {
        Self {
            name: display_name(path).to_string(),
            path: path.to_string(),
            kind: EntryKind::Directory,
            size: None,
            content_ref: None,
        }
    }

    pub fn file(path: &str, size: u64, content_ref: ContentRef) -> Self {
        Self {
            name: display_name(path).to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
            size: Some(size),
            content_ref: Some(content_ref),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Last path segment, ignoring a trailing `/` (`img/` → `img`).
pub fn display_name(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        Some(_) => path,
        None if trimmed.is_empty() => path,
        None => trimmed,
    }
}

fn dirs_first(a: &ArchiveEntry, b: &ArchiveEntry) -> Option<Ordering> {
    match (a.kind, b.kind) {
        (EntryKind::Directory, EntryKind::File) => Some(Ordering::Less),
        (EntryKind::File, EntryKind::Directory) => Some(Ordering::Greater),
        _ => None,
    }
}

/// Directories first, then by name.
pub fn listing_order(a: &ArchiveEntry, b: &ArchiveEntry) -> Ordering {
    dirs_first(a, b).unwrap_or_else(|| a.name.cmp(&b.name))
}

/// Stable sort into listing order.
pub fn sort_entries(entries: &mut [ArchiveEntry]) {
    entries.sort_by(listing_order);
}
