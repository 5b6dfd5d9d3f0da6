mod common;

use common::{
    Item, build_zip, find, patch_central_u16, patterned, rename, rfind, sample_zip, set_utf8_flag,
    zip64_stored,
};
use zipview::content::ContentStore;
use zipview::listing::{EntryProjector, Listing};
use zipview::zip::ArchiveDecoder;
use zipview::{EntryKind, ErrorKind, UploadTicket};

#[tokio::test]
async fn decodes_entries_by_path() {
    let archive = ArchiveDecoder::decode(sample_zip()).await.unwrap();
    assert_eq!(archive.len(), 3);

    let dir = archive.get("img/").unwrap();
    assert!(dir.is_directory);

    let file = archive.get("img/b.png").unwrap();
    assert_eq!(file.uncompressed_size, 2048);
    assert_eq!(archive.materialize(file).await.unwrap(), patterned(2048));
}

#[tokio::test]
async fn zero_entry_archive_is_empty() {
    let err = ArchiveDecoder::decode(common::empty_zip()).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Empty);
}

#[tokio::test]
async fn macos_metadata_is_excluded() {
    let data = build_zip(&[
        Item::File("a.txt", b"x".to_vec()),
        Item::Dir("__MACOSX/"),
        Item::Stored("__MACOSX/._a.txt", vec![0; 16]),
    ]);
    let archive = ArchiveDecoder::decode(data).await.unwrap();
    let paths: Vec<_> = archive.entries().map(|e| e.file_name.as_str()).collect();
    assert_eq!(paths, ["a.txt"]);
}

#[tokio::test]
async fn archive_of_only_metadata_is_empty() {
    let data = build_zip(&[Item::Dir("__MACOSX/"), Item::Stored("__MACOSX/._x", vec![1])]);
    let err = ArchiveDecoder::decode(data).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Empty);
}

#[tokio::test]
async fn damaged_central_directory_is_corrupt() {
    let mut data = sample_zip();
    let at = rfind(&data, b"PK\x01\x02").unwrap();
    data[at..at + 4].copy_from_slice(b"XXXX");

    let err = ArchiveDecoder::decode(data).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[tokio::test]
async fn truncated_archive_is_corrupt() {
    let data = sample_zip();
    for cut in [10, data.len() / 2, data.len() - 1] {
        let err = ArchiveDecoder::decode(data[..cut].to_vec()).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corrupt, "cut at {cut}");
    }
}

#[tokio::test]
async fn not_a_zip_is_corrupt() {
    let err = ArchiveDecoder::decode(b"Rar!\x1a\x07\x00 definitely not a zip".to_vec())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[tokio::test]
async fn checksum_mismatch_is_corrupt() {
    let mut data = build_zip(&[Item::Stored("note.txt", b"stored content here".to_vec())]);
    let at = find(&data, b"stored content here").unwrap();
    data[at] ^= 0xff;

    let archive = ArchiveDecoder::decode(data).await.unwrap();
    let entry = archive.get("note.txt").unwrap().clone();
    let err = archive.materialize(&entry).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
    assert!(err.message().contains("checksum"));
}

#[tokio::test]
async fn failed_projection_releases_everything() {
    let mut data = build_zip(&[
        Item::Stored("a.txt", b"first file".to_vec()),
        Item::Stored("b.txt", b"second file".to_vec()),
        Item::Stored("c.txt", b"third file".to_vec()),
    ]);
    let at = find(&data, b"third file").unwrap();
    data[at] ^= 0xff;

    let store = ContentStore::new();
    let archive = ArchiveDecoder::decode(data).await.unwrap();
    let err = EntryProjector::new(&store)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Corrupt);
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn projection_materializes_every_file() {
    let store = ContentStore::new();
    let archive = ArchiveDecoder::decode(sample_zip()).await.unwrap();
    let entries = EntryProjector::new(&store)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(store.live_count(), 2);
    for entry in &entries {
        match entry.kind {
            EntryKind::Directory => {
                assert!(entry.size.is_none());
                assert!(entry.content_ref.is_none());
            }
            EntryKind::File => {
                let bytes = store.resolve(entry.content_ref.unwrap()).unwrap();
                assert_eq!(bytes.len() as u64, entry.size.unwrap());
            }
        }
    }

    let listing = Listing::new(entries);
    assert_eq!(listing.release(&store), 2);
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn legacy_encoded_names_stay_distinct() {
    let mut data = build_zip(&[
        Item::Stored("x1.txt", b"first".to_vec()),
        Item::Stored("y1.txt", b"second".to_vec()),
    ]);
    set_utf8_flag(&mut data, false);
    rename(&mut data, b"x1.txt", b"\x801.txt");
    rename(&mut data, b"y1.txt", b"\x811.txt");

    let archive = ArchiveDecoder::decode(data).await.unwrap();
    let paths: Vec<_> = archive.entries().map(|e| e.file_name.as_str()).collect();
    assert_eq!(paths, ["Ç1.txt", "ü1.txt"]);

    let first = archive.get("Ç1.txt").unwrap();
    assert_eq!(archive.materialize(first).await.unwrap(), b"first");
    let second = archive.get("ü1.txt").unwrap();
    assert_eq!(archive.materialize(second).await.unwrap(), b"second");
}

#[tokio::test]
async fn utf8_flagged_names_are_decoded_as_utf8() {
    let mut data = build_zip(&[Item::File("naïve/résumé.txt", b"cv".to_vec())]);
    set_utf8_flag(&mut data, true);
    let archive = ArchiveDecoder::decode(data).await.unwrap();
    assert!(archive.get("naïve/résumé.txt").is_some());

    let mut data = build_zip(&[Item::Stored("x1.txt", b"x".to_vec())]);
    rename(&mut data, b"x1.txt", b"\x801.txt");
    set_utf8_flag(&mut data, true);
    let err = ArchiveDecoder::decode(data).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[tokio::test]
async fn zip64_records_are_followed() {
    let content = patterned(300);
    let archive = ArchiveDecoder::decode(zip64_stored("big/data.bin", &content))
        .await
        .unwrap();
    assert_eq!(archive.len(), 1);

    let entry = archive.get("big/data.bin").unwrap();
    assert_eq!(entry.uncompressed_size, 300);
    assert_eq!(entry.compressed_size, 300);
    assert_eq!(entry.lfh_offset, 0);
    assert_eq!(archive.materialize(entry).await.unwrap(), content);
}

#[tokio::test]
async fn unknown_compression_method_is_corrupt() {
    let mut data = build_zip(&[Item::Stored("a.txt", b"payload".to_vec())]);
    patch_central_u16(&mut data, 10, 99);

    let archive = ArchiveDecoder::decode(data).await.unwrap();
    let entry = archive.get("a.txt").unwrap().clone();
    let err = archive.materialize(&entry).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
    assert!(err.message().contains("compression method 99"));
}

#[tokio::test]
async fn encrypted_entry_is_corrupt() {
    let mut data = build_zip(&[Item::Stored("secret.txt", b"payload".to_vec())]);
    patch_central_u16(&mut data, 8, 0x0001);

    let store = ContentStore::new();
    let archive = ArchiveDecoder::decode(data).await.unwrap();
    let err = EntryProjector::new(&store)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
    assert!(err.message().contains("encrypted"));
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn projection_enforces_entry_size_limit() {
    let store = ContentStore::new();
    let archive = ArchiveDecoder::decode(sample_zip()).await.unwrap();

    let err = EntryProjector::new(&store)
        .with_limits(2047, u64::MAX)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeExceeded);
    assert_eq!(store.live_count(), 0);

    let entries = EntryProjector::new(&store)
        .with_limits(2048, u64::MAX)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap();
    assert_eq!(Listing::new(entries).release(&store), 2);
}

#[tokio::test]
async fn projection_enforces_total_size_limit() {
    let store = ContentStore::new();
    let archive = ArchiveDecoder::decode(sample_zip()).await.unwrap();

    let err = EntryProjector::new(&store)
        .with_limits(u64::MAX, 2059)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeExceeded);
    assert_eq!(store.live_count(), 0);

    let entries = EntryProjector::new(&store)
        .with_limits(u64::MAX, 2060)
        .project(&archive, &UploadTicket::detached())
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
}
