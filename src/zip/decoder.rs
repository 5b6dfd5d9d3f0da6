use flate2::read::DeflateDecoder;
use std::collections::BTreeMap;
use std::io::Read;

use crate::error::ArchiveError;
use crate::io::MemoryReader;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Path prefixes written by archiving tools as metadata, never shown.
pub const SYNTHETIC_PREFIXES: &[&str] = &["__MACOSX"];

pub fn is_synthetic(path: &str) -> bool {
    SYNTHETIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Decodes an assembled archive buffer into its entries.
pub struct ArchiveDecoder;

impl ArchiveDecoder {
    /// Parse the central directory of `buffer`.
    ///
    /// Synthetic metadata entries are dropped here; an archive with nothing
    /// left afterwards is [`ArchiveError::Empty`].
    pub async fn decode(buffer: impl Into<MemoryReader>) -> Result<DecodedArchive, ArchiveError> {
        let parser = ZipParser::new(buffer.into());
        let records = parser.list_files().await.map_err(ArchiveError::corrupt)?;
        let listed = records.len();

        let mut entries = BTreeMap::new();
        for record in records {
            if is_synthetic(&record.file_name) {
                continue;
            }
            if let Some(previous) = entries.insert(record.file_name.clone(), record) {
                tracing::warn!(path = %previous.file_name, "duplicate entry, keeping the last one");
            }
        }

        if entries.is_empty() {
            return Err(ArchiveError::Empty("the archive contains no entries".to_string()));
        }

        tracing::debug!(listed, kept = entries.len(), "decoded central directory");
        Ok(DecodedArchive { parser, entries })
    }
}

/// Entries of a decoded archive keyed by path, with on-demand content.
pub struct DecodedArchive {
    parser: ZipParser<MemoryReader>,
    entries: BTreeMap<String, ZipFileEntry>,
}

impl DecodedArchive {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ZipFileEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ZipFileEntry> {
        self.entries.values()
    }

    /// Decompress one file entry and verify its size and CRC-32.
    pub async fn materialize(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, ArchiveError> {
        let corrupt = |msg: String| ArchiveError::Corrupt(format!("{}: {msg}", entry.file_name));

        if entry.is_directory {
            return Err(corrupt("directories have no content".to_string()));
        }
        if entry.is_encrypted() {
            return Err(corrupt("encrypted entries are not supported".to_string()));
        }

        let raw = self
            .parser
            .read_raw_data(entry)
            .await
            .map_err(ArchiveError::corrupt)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => inflate(&raw, entry.uncompressed_size).map_err(corrupt)?,
            CompressionMethod::Unknown(method) => {
                return Err(corrupt(format!("unsupported compression method {method}")));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(corrupt(format!(
                "expected {} bytes, decoded {}",
                entry.uncompressed_size,
                data.len()
            )));
        }

        let crc = crc32fast::hash(&data);
        if crc != entry.crc32 {
            return Err(corrupt(format!(
                "checksum mismatch (expected {:08x}, got {crc:08x})",
                entry.crc32
            )));
        }

        Ok(data)
    }
}

/// Inflate raw DEFLATE data, refusing to produce more than `expected` bytes.
fn inflate(raw: &[u8], expected: u64) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(expected.min(64 * 1024 * 1024) as usize);
    DeflateDecoder::new(raw)
        .take(expected.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| format!("deflate stream is invalid: {e}"))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_prefix_matching() {
        assert!(is_synthetic("__MACOSX/"));
        assert!(is_synthetic("__MACOSX/img/._b.png"));
        assert!(!is_synthetic("docs/__MACOSX"));
        assert!(!is_synthetic("a.txt"));
    }

    #[test]
    fn inflate_rejects_garbage() {
        assert!(inflate(&[0xff, 0xff, 0xff, 0xff], 10).is_err());
    }
}
