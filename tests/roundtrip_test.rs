//! End-to-end compress/decompress round-trips through the library API.

use dedupack::archive::{self, FileRecord};
use dedupack::codec::{self, CodecId};
use dedupack::compress::compress;
use dedupack::extract::decompress;
use dedupack::hash;
use dedupack::workers::WorkerPool;
use rand::RngCore;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

// ---------- helpers ----------

fn write_file(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(contents).unwrap();
    path
}

fn read_archive_metadata(path: &Path) -> (Vec<FileRecord>, CodecId) {
    let mut reader = BufReader::new(File::open(path).unwrap());
    archive::read_metadata(&mut reader).unwrap()
}

fn list_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

fn dirs_equal(a: &Path, b: &Path) {
    let la = list_files(a);
    let lb = list_files(b);
    assert_eq!(la, lb, "trees differ: {:?} vs {:?}", la, lb);
    for rel in la {
        assert_eq!(
            fs::read(a.join(&rel)).unwrap(),
            fs::read(b.join(&rel)).unwrap(),
            "contents differ for {:?}",
            rel
        );
    }
}

fn roundtrip(src: &Path, codec_id: CodecId) -> (tempfile::TempDir, PathBuf) {
    let pool = WorkerPool::new();
    let work = tempdir().unwrap();
    let archive_path = work.path().join("data.dpk");
    compress(src, &archive_path, codec_id, &pool).unwrap();

    let out = work.path().join("out");
    decompress(&archive_path, &out, &pool).unwrap();
    (work, archive_path)
}

// ---------- round-trip scenarios ----------

#[test]
fn two_identical_files_and_one_different() {
    let src = tempdir().unwrap();
    write_file(src.path(), "file1.txt", b"Hello, World!");
    write_file(src.path(), "file2.txt", b"Hello, World!");
    write_file(src.path(), "file3.txt", b"Different content");

    let (work, archive_path) = roundtrip(src.path(), codec::default_codec());

    let (records, _) = read_archive_metadata(&archive_path);
    assert_eq!(records.len(), 3);
    assert_eq!(records.iter().filter(|r| !r.is_duplicate()).count(), 2);
    assert_eq!(records.iter().filter(|r| r.is_duplicate()).count(), 1);

    dirs_equal(src.path(), &work.path().join("out"));
}

#[test]
fn zero_byte_files_are_excluded_end_to_end() {
    let src = tempdir().unwrap();
    for name in ["a.log", "b.log", "c.log", "d.log"] {
        write_file(src.path(), name, b"");
    }

    let (work, archive_path) = roundtrip(src.path(), codec::default_codec());

    let (records, _) = read_archive_metadata(&archive_path);
    assert!(records.is_empty());

    let out = work.path().join("out");
    assert!(out.is_dir());
    assert!(list_files(&out).is_empty());
}

#[test]
fn empty_files_next_to_real_ones_do_not_reappear() {
    let src = tempdir().unwrap();
    write_file(src.path(), "keep.txt", b"kept content");
    write_file(src.path(), "drop.txt", b"");

    let (work, _) = roundtrip(src.path(), codec::default_codec());

    let out = work.path().join("out");
    assert!(out.join("keep.txt").is_file());
    assert!(!out.join("drop.txt").exists());
}

#[test]
fn large_random_blob_digest_identity() {
    let mut payload = vec![0u8; 100 * 1024];
    rand::thread_rng().fill_bytes(&mut payload);

    let src = tempdir().unwrap();
    let src_file = write_file(src.path(), "blob.bin", &payload);

    let (work, _) = roundtrip(src.path(), codec::default_codec());
    let extracted = work.path().join("out").join("blob.bin");

    let expected = hash::hash_bytes(&payload);
    assert_eq!(hash::hash_file(&src_file).unwrap(), expected);
    assert_eq!(hash::hash_file(&extracted).unwrap(), expected);
}

#[test]
fn nested_duplicate_trees_share_one_frame() {
    let src = tempdir().unwrap();
    write_file(src.path(), "a/b/c/x.log", b"shared log contents");
    write_file(src.path(), "a/b/d/x.log", b"shared log contents");

    let (work, archive_path) = roundtrip(src.path(), codec::default_codec());

    let (records, _) = read_archive_metadata(&archive_path);
    assert_eq!(records.iter().filter(|r| !r.is_duplicate()).count(), 1);
    assert_eq!(records.iter().filter(|r| r.is_duplicate()).count(), 1);

    let out = work.path().join("out");
    assert!(out.join("a/b/c/x.log").is_file());
    assert!(out.join("a/b/d/x.log").is_file());
    dirs_equal(src.path(), &out);
}

#[test]
fn many_copies_of_the_same_content_all_reappear() {
    let src = tempdir().unwrap();
    for i in 0..5 {
        write_file(src.path(), &format!("copy{}.dat", i), b"the one true content");
    }

    let (work, archive_path) = roundtrip(src.path(), codec::default_codec());

    let (records, _) = read_archive_metadata(&archive_path);
    assert_eq!(records.iter().filter(|r| !r.is_duplicate()).count(), 1);
    assert_eq!(records.iter().filter(|r| r.is_duplicate()).count(), 4);
    dirs_equal(src.path(), &work.path().join("out"));
}

// ---------- codec matrix ----------

fn roundtrip_with_codec(codec_id: CodecId) {
    let src = tempdir().unwrap();
    write_file(src.path(), "notes.txt", b"compressible text ".repeat(200).as_slice());
    write_file(src.path(), "copy/notes.txt", b"compressible text ".repeat(200).as_slice());

    let (work, archive_path) = roundtrip(src.path(), codec_id);

    let (_, read_codec) = read_archive_metadata(&archive_path);
    assert_eq!(read_codec, codec_id);
    dirs_equal(src.path(), &work.path().join("out"));
}

#[cfg(feature = "zlib")]
#[test]
fn zlib_archive_roundtrips() {
    roundtrip_with_codec(CodecId::Zlib);
}

#[cfg(feature = "brotli")]
#[test]
fn brotli_archive_roundtrips() {
    roundtrip_with_codec(CodecId::Brotli);
}

#[cfg(feature = "zstd")]
#[test]
fn zstd_archive_roundtrips() {
    roundtrip_with_codec(CodecId::Zstd);
}
