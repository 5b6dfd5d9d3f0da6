//! # zipview
//!
//! Inspect ZIP archives: read an upload in chunks, decode its central
//! directory, materialize every file's content, and produce a sorted
//! listing with file/directory counts and total size.
//!
//! ## Pipeline
//!
//! ```text
//! upload → gate → chunked read (progress) → decode → project → aggregate → publish
//! ```
//!
//! - [`gate`]: extension and size checks before any byte is read
//! - [`io`]: byte sources and the [`ChunkedReader`]
//! - [`zip`]: the ZIP container decoder (DEFLATE via `flate2`)
//! - [`listing`]: projection into [`ArchiveEntry`] records, ordering, stats
//! - [`content`]: the store behind each entry's [`ContentRef`]
//! - [`session`]: the [`ViewerSession`] tying it together
//!
//! [`convert`] is a separate image format converter built on `image`.
//!
//! ## Example
//!
//! ```no_run
//! use zipview::{LocalFileReader, PublishOutcome, ViewerSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = ViewerSession::default();
//!     let reader = LocalFileReader::new("bundle.zip".as_ref())?;
//!
//!     if let PublishOutcome::Published(stats) = session.upload("bundle.zip", &reader).await {
//!         for entry in session.snapshot().entries {
//!             println!("{}", entry.name);
//!         }
//!         println!("{} files, {} bytes", stats.file_count, stats.total_size);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod convert;
pub mod error;
pub mod gate;
pub mod io;
pub mod listing;
pub mod session;
mod ticket;
pub mod zip;

pub use cli::Cli;
pub use config::ViewerConfig;
pub use content::{ContentRef, ContentStore};
pub use error::{ArchiveError, ErrorKind, Severity};
pub use gate::{UploadCandidate, check_upload};
pub use io::{ChunkedReader, HttpRangeReader, LocalFileReader, MemoryReader, ReadAt, UploadProgress};
pub use listing::{ArchiveEntry, ArchiveStats, EntryKind, Listing};
pub use session::{ListingSnapshot, PublishOutcome, ViewerSession};
pub use ticket::UploadTicket;
