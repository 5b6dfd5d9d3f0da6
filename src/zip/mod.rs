//! ZIP container decoding.
//!
//! ## Architecture
//!
//! - [`structures`]: fixed-layout ZIP records (EOCD, ZIP64 records, entry metadata)
//! - [`parser`]: reads those records from any [`ReadAt`](crate::io::ReadAt) source
//! - [`decoder`]: turns an assembled upload buffer into a path-keyed entry
//!   map and materializes file content on demand
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first, then the Central Directory. Entry data is only
//! touched when an entry is materialized.
//!
//! ## Supported Features
//!
//! - Standard ZIP format and ZIP64 extensions
//! - STORED and DEFLATE (via `flate2`) entries, CRC-32 verified (via `crc32fast`)
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod decoder;
mod parser;
mod structures;

pub use decoder::{ArchiveDecoder, DecodedArchive, SYNTHETIC_PREFIXES, is_synthetic};
pub use parser::{CentralDirectory, ZipParser};
pub use structures::*;
