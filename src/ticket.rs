use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generation counter shared by a session and the tickets it hands out.
#[derive(Debug, Clone, Default)]
pub(crate) struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Start a new generation, superseding every outstanding ticket.
    pub(crate) fn advance(&self) -> UploadTicket {
        let generation = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        UploadTicket {
            generation,
            latest: Some(self.0.clone()),
        }
    }
}

/// Identifies one upload request.
///
/// A ticket stays current until a newer upload starts on the same session
/// (or the session is cleared). Pipeline stages poll [`is_current`] at
/// their suspension points and stop early once it turns false.
///
/// [`is_current`]: UploadTicket::is_current
#[derive(Debug, Clone)]
pub struct UploadTicket {
    generation: u64,
    latest: Option<Arc<AtomicU64>>,
}

impl UploadTicket {
    /// A ticket not tied to any session; it is always current.
    pub fn detached() -> Self {
        Self {
            generation: 0,
            latest: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        match &self.latest {
            Some(latest) => latest.load(Ordering::SeqCst) == self.generation,
            None => true,
        }
    }
}
