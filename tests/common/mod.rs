#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::time::Duration;

use async_trait::async_trait;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;
use zipview::{MemoryReader, ReadAt};

pub enum Item<'a> {
    Dir(&'a str),
    /// Deflated file.
    File(&'a str, Vec<u8>),
    /// Stored (uncompressed) file.
    Stored(&'a str, Vec<u8>),
}

pub fn build_zip(items: &[Item<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for item in items {
        match item {
            Item::Dir(path) => writer.add_directory(*path, stored).unwrap(),
            Item::File(path, data) => {
                writer.start_file(*path, deflated).unwrap();
                writer.write_all(data).unwrap();
            }
            Item::Stored(path, data) => {
                writer.start_file(*path, stored).unwrap();
                writer.write_all(data).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

/// `a.txt` (12 bytes), `img/`, `img/b.png` (2048 bytes).
pub fn sample_zip() -> Vec<u8> {
    build_zip(&[
        Item::File("a.txt", b"hello world!".to_vec()),
        Item::Dir("img/"),
        Item::File("img/b.png", patterned(2048)),
    ])
}

pub fn empty_zip() -> Vec<u8> {
    build_zip(&[])
}

pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Start offsets of every record with `signature`.
fn records(data: &[u8], signature: &[u8]) -> Vec<usize> {
    data.windows(signature.len())
        .enumerate()
        .filter(|(_, w)| *w == signature)
        .map(|(at, _)| at)
        .collect()
}

/// Overwrite a little-endian u16 field `field` bytes into every central
/// directory record.
pub fn patch_central_u16(data: &mut [u8], field: usize, value: u16) {
    for at in records(data, b"PK\x01\x02") {
        data[at + field..at + field + 2].copy_from_slice(&value.to_le_bytes());
    }
}

/// Set or clear general purpose bit 11 in local and central headers.
pub fn set_utf8_flag(data: &mut [u8], on: bool) {
    let headers = records(data, b"PK\x03\x04")
        .into_iter()
        .map(|at| at + 6)
        .chain(records(data, b"PK\x01\x02").into_iter().map(|at| at + 8))
        .collect::<Vec<_>>();
    for flags in headers {
        if on {
            data[flags + 1] |= 0x08;
        } else {
            data[flags + 1] &= !0x08;
        }
    }
}

/// Replace every occurrence of `from` with `to` (same length).
pub fn rename(data: &mut [u8], from: &[u8], to: &[u8]) {
    assert_eq!(from.len(), to.len());
    while let Some(at) = find(data, from) {
        data[at..at + to.len()].copy_from_slice(to);
    }
}

/// One stored file in an archive whose sizes, offsets and counts all live
/// in ZIP64 records.
pub fn zip64_stored(name: &str, content: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(content);
    let len = content.len() as u64;
    let mut out = Vec::new();

    out.extend_from_slice(b"PK\x03\x04");
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // flags, method, time, date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(content);

    let cd_offset = out.len() as u64;
    out.extend_from_slice(b"PK\x01\x02");
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // flags, method, time, date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&28u16.to_le_bytes());
    out.extend_from_slice(&[0; 6]); // comment length, disk, internal attributes
    out.extend_from_slice(&[0; 4]); // external attributes
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    let cd_size = out.len() as u64 - cd_offset;

    let eocd64_offset = out.len() as u64;
    out.extend_from_slice(b"PK\x06\x06");
    out.extend_from_slice(&44u64.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // disk numbers
    out.extend_from_slice(&1u64.to_le_bytes());
    out.extend_from_slice(&1u64.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());

    out.extend_from_slice(b"PK\x06\x07");
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&eocd64_offset.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&u16::MAX.to_le_bytes());
    out.extend_from_slice(&u16::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

/// Memory reader that sleeps before every read.
pub struct SlowReader {
    inner: MemoryReader,
    delay: Duration,
}

impl SlowReader {
    pub fn new(data: Vec<u8>, delay: Duration) -> Self {
        Self {
            inner: MemoryReader::new(data),
            delay,
        }
    }
}

#[async_trait]
impl ReadAt for SlowReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> anyhow::Result<usize> {
        tokio::time::sleep(self.delay).await;
        self.inner.read_at(offset, buf).await
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}
