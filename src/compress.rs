//! The forward pipeline: directory tree in, archive out.
//!
//! Originals are encoded in parallel on the worker pool. Each task claims
//! the archive cursor under the writer mutex, streams its file through the
//! codec while holding it (so the before/after positions measure exactly
//! that file's frame), then records its digest and metadata under two
//! further short-lived locks. The lock order is fixed (writer, then digest
//! index, then metadata) and the locks are taken one at a time, never
//! nested, so the pipeline cannot deadlock.
//!
//! Duplicates contribute no payload bytes: their records simply alias the
//! original frame's offset, looked up by digest.
//!
//! Per-file failures are logged and skipped; only orchestrator-level
//! failures (creating the archive, writing metadata) abort the run.

use crate::archive::{self, FileRecord};
use crate::codec::{self, CodecId, StreamCodec};
use crate::dedup::{self, ScannedFile};
use crate::error::{ArchiveError, Result};
use crate::scan;
use crate::workers::WorkerPool;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Packs every non-empty regular file under `root_dir` into a new archive
/// at `output_path`, compressing unique contents with `codec_id`.
pub fn compress(
    root_dir: &Path,
    output_path: &Path,
    codec_id: CodecId,
    pool: &WorkerPool,
) -> Result<()> {
    let output = File::create(output_path).map_err(|e| ArchiveError::Io {
        op: "archive creation",
        path: output_path.to_path_buf(),
        source: e,
    })?;

    let paths = scan::scan_directory(root_dir, true)?;
    let classified = dedup::classify(&paths, root_dir, pool)?;
    let codec = codec::create(codec_id)?;

    let writer = Arc::new(Mutex::new(BufWriter::new(output)));
    let digest_index = Arc::new(Mutex::new(HashMap::<String, i64>::new()));
    let records = Arc::new(Mutex::new(Vec::<FileRecord>::with_capacity(
        classified.originals.len() + classified.duplicates.len(),
    )));
    let digests = Arc::new(classified.digests);

    // Phase 1: stream every original through the codec into the archive.
    {
        let originals = Arc::new(classified.originals);
        let writer = Arc::clone(&writer);
        let digest_index = Arc::clone(&digest_index);
        let records = Arc::clone(&records);
        let digests = Arc::clone(&digests);
        pool.parallel_for(originals.len(), move |i| {
            let file = &originals[i];
            let Some(digest) = digests.get(&file.relative_path) else {
                return;
            };
            match encode_original(codec, file, &writer) {
                Ok((data_offset, compressed_size)) => {
                    digest_index.lock().unwrap().insert(digest.clone(), data_offset);
                    records.lock().unwrap().push(FileRecord {
                        data_offset,
                        digest: digest.clone(),
                        relative_path: file.relative_path.clone(),
                    });
                    println!(
                        "Compressed file: {} ({} -> {} bytes)",
                        file.relative_path, file.size, compressed_size
                    );
                }
                Err(e) => eprintln!("Error: could not compress {}: {}", file.relative_path, e),
            }
        })?;
    }

    // Phase 2: duplicates only reference the frame their original wrote.
    {
        let duplicates = Arc::new(classified.duplicates);
        let digest_index = Arc::clone(&digest_index);
        let records = Arc::clone(&records);
        let digests = Arc::clone(&digests);
        pool.parallel_for(duplicates.len(), move |i| {
            let file = &duplicates[i];
            let Some(digest) = digests.get(&file.relative_path) else {
                return;
            };
            let data_offset = { digest_index.lock().unwrap().get(digest).copied() };
            match data_offset {
                Some(data_offset) => {
                    records.lock().unwrap().push(FileRecord {
                        data_offset,
                        digest: String::new(),
                        relative_path: file.relative_path.clone(),
                    });
                    println!("Duplicate file: {}", file.relative_path);
                }
                None => eprintln!(
                    "Error: no stored content for duplicate {} (original was not archived)",
                    file.relative_path
                ),
            }
        })?;
    }

    let records = {
        let mut guard = records.lock().unwrap();
        std::mem::take(&mut *guard)
    };
    {
        let mut archive = writer.lock().unwrap();
        archive::write_metadata(&mut *archive, &records, codec_id)?;
        archive.flush()?;
    }

    println!("Archive created successfully: {}", output_path.display());
    Ok(())
}

/// Claims the archive cursor and streams one file through the codec.
/// Returns the frame's offset and compressed size.
fn encode_original(
    codec: &'static dyn StreamCodec,
    file: &ScannedFile,
    writer: &Mutex<BufWriter<File>>,
) -> Result<(i64, u64)> {
    let mut input = File::open(&file.absolute_path).map_err(|e| ArchiveError::Io {
        op: "compression",
        path: file.absolute_path.clone(),
        source: e,
    })?;

    let mut archive = writer.lock().unwrap();
    let data_offset = archive.stream_position()?;
    codec.encode(&mut input, &mut *archive)?;
    let end = archive.stream_position()?;
    Ok((data_offset as i64, end - data_offset))
}
