//! The reverse pipeline: archive in, directory tree out.
//!
//! The footer is read first, then the metadata table. Originals are
//! materialised in parallel: each task seeks the shared reader to its frame
//! and decodes into a freshly created output file while holding the reader
//! mutex, then re-hashes the result outside the lock. A file whose digest
//! does not match its record is deleted and reported; the rest of the
//! extraction continues.
//!
//! All originals finish before any duplicate starts, so duplicate fan-out
//! can simply copy from the already-materialised source file found through
//! the offset-to-path map.

use crate::archive::{self, FileRecord};
use crate::codec::{self, StreamCodec};
use crate::error::{ArchiveError, Result};
use crate::hash;
use crate::workers::WorkerPool;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Restores the tree stored in `archive_path` into `output_dir`, creating
/// the directory (and any parents) as needed.
pub fn decompress(archive_path: &Path, output_dir: &Path, pool: &WorkerPool) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| ArchiveError::Io {
        op: "archive reading",
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    let (records, codec_id) = archive::read_metadata(&mut reader)?;
    let codec = codec::create(codec_id)?;

    fs::create_dir_all(output_dir).map_err(|e| ArchiveError::Io {
        op: "output directory creation",
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let (originals, duplicates): (Vec<FileRecord>, Vec<FileRecord>) =
        records.into_iter().partition(|r| !r.is_duplicate());
    let n_original = originals.len();
    let n_duplicate = duplicates.len();

    let reader = Arc::new(Mutex::new(reader));
    // data offset -> materialised output path, filled by phase 1.
    let sources = Arc::new(Mutex::new(HashMap::<i64, PathBuf>::new()));
    let out_root = Arc::new(output_dir.to_path_buf());

    // Phase 1: decode and verify every original.
    {
        let originals = Arc::new(originals);
        let reader = Arc::clone(&reader);
        let sources = Arc::clone(&sources);
        let out_root = Arc::clone(&out_root);
        pool.parallel_for(originals.len(), move |i| {
            let record = &originals[i];
            match materialize_original(codec, record, &reader, &out_root) {
                Ok(target) => {
                    sources.lock().unwrap().insert(record.data_offset, target);
                    println!("Extracted: {}", record.relative_path);
                }
                Err(e) => eprintln!("Error: could not extract {}: {}", record.relative_path, e),
            }
        })?;
    }

    // Phase 2: duplicates copy from their original's output file.
    {
        let duplicates = Arc::new(duplicates);
        let sources = Arc::clone(&sources);
        let out_root = Arc::clone(&out_root);
        pool.parallel_for(duplicates.len(), move |i| {
            let record = &duplicates[i];
            let source = { sources.lock().unwrap().get(&record.data_offset).cloned() };
            let Some(source) = source else {
                eprintln!(
                    "Error: no extracted original for duplicate {} (offset {})",
                    record.relative_path, record.data_offset
                );
                return;
            };
            match copy_duplicate(&source, record, &out_root) {
                Ok(()) => println!("Extracted duplicate: {}", record.relative_path),
                Err(e) => eprintln!("Error: could not copy {}: {}", record.relative_path, e),
            }
        })?;
    }

    println!("Total files in archive: {}", n_original + n_duplicate);
    println!("Originals: {}, Duplicates: {}", n_original, n_duplicate);
    Ok(())
}

/// Seeks to the record's frame, decodes it into the output file and
/// verifies the digest. On a mismatch the output file is deleted and an
/// integrity error returned.
fn materialize_original(
    codec: &'static dyn StreamCodec,
    record: &FileRecord,
    reader: &Mutex<BufReader<File>>,
    out_root: &Path,
) -> Result<PathBuf> {
    let target = out_root.join(&record.relative_path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::Io {
            op: "output directory creation",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let decoded = {
        let mut archive = reader.lock().unwrap();
        archive.seek(SeekFrom::Start(record.data_offset as u64))?;
        let mut output = File::create(&target).map_err(|e| ArchiveError::Io {
            op: "output file creation",
            path: target.clone(),
            source: e,
        })?;
        codec.decode(&mut *archive, &mut output)
    };
    if let Err(e) = decoded {
        // Do not leave a partially decoded file behind.
        let _ = fs::remove_file(&target);
        return Err(e);
    }

    let actual = hash::hash_file(&target)?;
    if actual != record.digest {
        let _ = fs::remove_file(&target);
        return Err(ArchiveError::Integrity {
            path: target,
            expected: record.digest.clone(),
            actual,
        });
    }
    Ok(target)
}

/// Copies an already-materialised original to the duplicate's path,
/// overwriting anything there.
fn copy_duplicate(source: &Path, record: &FileRecord, out_root: &Path) -> Result<()> {
    let target = out_root.join(&record.relative_path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::Io {
            op: "output directory creation",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::copy(source, &target).map_err(|e| ArchiveError::Io {
        op: "duplicate copy",
        path: target,
        source: e,
    })?;
    Ok(())
}
