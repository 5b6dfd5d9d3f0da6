//! Registry of decompressed entry content.
//!
//! A [`ContentRef`] is a small copyable handle, the counterpart of an
//! object URL: it resolves to the bytes while registered and to nothing
//! once released. Ids are never reused, so a stale handle can never
//! resolve to another entry's bytes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to one blob in a [`ContentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentRef(u64);

impl ContentRef {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:zipview/{}", self.0)
    }
}

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    blobs: HashMap<u64, Arc<[u8]>>,
}

/// Shared blob registry; clones refer to the same store.
#[derive(Clone, Default)]
pub struct ContentStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `bytes` and return a fresh handle to them.
    pub fn create(&self, bytes: Vec<u8>) -> ContentRef {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.blobs.insert(id, bytes.into());
        ContentRef(id)
    }

    pub fn resolve(&self, content: ContentRef) -> Option<Arc<[u8]>> {
        self.lock().blobs.get(&content.0).cloned()
    }

    /// Drop the store's copy of the blob. Returns `false` if the handle was
    /// already released or never belonged to this store.
    pub fn release(&self, content: ContentRef) -> bool {
        self.lock().blobs.remove(&content.0).is_some()
    }

    /// Release a batch of handles, returning how many were live.
    pub fn release_all(&self, refs: impl IntoIterator<Item = ContentRef>) -> usize {
        let mut inner = self.lock();
        refs.into_iter()
            .filter(|content| inner.blobs.remove(&content.0).is_some())
            .count()
    }

    /// Number of blobs currently registered.
    pub fn live_count(&self) -> usize {
        self.lock().blobs.len()
    }

    /// Total bytes held by registered blobs.
    pub fn live_bytes(&self) -> u64 {
        self.lock().blobs.values().map(|b| b.len() as u64).sum()
    }
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_release() {
        let store = ContentStore::new();
        let a = store.create(b"alpha".to_vec());
        let b = store.create(b"beta".to_vec());
        assert_ne!(a, b);
        assert_eq!(store.live_count(), 2);
        assert_eq!(store.live_bytes(), 9);
        assert_eq!(&*store.resolve(a).unwrap(), b"alpha");

        assert!(store.release(a));
        assert!(!store.release(a));
        assert!(store.resolve(a).is_none());
        assert_eq!(&*store.resolve(b).unwrap(), b"beta");
    }

    #[test]
    fn ids_are_not_reused() {
        let store = ContentStore::new();
        let a = store.create(vec![1]);
        store.release(a);
        let b = store.create(vec![2]);
        assert_ne!(a, b);
        assert!(store.resolve(a).is_none());
    }

    #[test]
    fn release_all_counts_live_handles() {
        let store = ContentStore::new();
        let a = store.create(vec![1]);
        let b = store.create(vec![2]);
        store.release(a);
        assert_eq!(store.release_all([a, b]), 1);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn display_looks_like_object_url() {
        let store = ContentStore::new();
        let content = store.create(Vec::new());
        assert_eq!(content.to_string(), format!("blob:zipview/{}", content.id()));
    }
}
