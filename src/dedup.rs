//! Content-based classification of scanned files.
//!
//! Every file is hashed in parallel on the worker pool; the first file seen
//! (in scan order) with a given digest becomes the *original* for that
//! content, every later one a *duplicate*. The partition is deterministic
//! because the scanner's ordering is.

use crate::error::{ArchiveError, Result};
use crate::hash;
use crate::workers::WorkerPool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A scanned file together with its archive-relative identity.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub absolute_path: PathBuf,
    /// Forward-slash path relative to the compression root.
    pub relative_path: String,
    pub size: u64,
}

/// Result of classification: the partition plus the digest of every file
/// that hashed successfully (keyed by relative path).
#[derive(Debug)]
pub struct Classified {
    pub originals: Vec<ScannedFile>,
    pub duplicates: Vec<ScannedFile>,
    pub digests: HashMap<String, String>,
}

/// Normalises `path` to a forward-slash string relative to `root`.
pub fn relative_path(path: &Path, root: &Path) -> Result<String> {
    let stripped = path.strip_prefix(root).map_err(|_| {
        ArchiveError::Format(format!(
            "path '{}' is not under root '{}'",
            path.display(),
            root.display()
        ))
    })?;
    let parts: Vec<String> =
        stripped.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    Ok(parts.join("/"))
}

/// Hashes `paths` in parallel and partitions them into originals and
/// duplicates by first-seen digest.
///
/// A file that cannot be read or hashed is logged and dropped: it becomes
/// neither an original nor a duplicate and will be absent from the archive.
pub fn classify(paths: &[PathBuf], root: &Path, pool: &WorkerPool) -> Result<Classified> {
    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let relative = relative_path(path, root)?;
        match std::fs::metadata(path) {
            Ok(meta) => entries.push(ScannedFile {
                absolute_path: path.clone(),
                relative_path: relative,
                size: meta.len(),
            }),
            Err(e) => eprintln!("Error: could not stat {}: {}", relative, e),
        }
    }

    let entries = Arc::new(entries);
    // Both mappings live under one lock: a file's digest and its claim to
    // "first seen" must land together.
    let maps = Arc::new(Mutex::new((
        HashMap::<String, String>::new(), // relative path -> digest
        HashMap::<String, String>::new(), // digest -> first relative path
    )));

    {
        let entries = Arc::clone(&entries);
        let maps = Arc::clone(&maps);
        pool.parallel_for(entries.len(), move |i| {
            let file = &entries[i];
            match hash::hash_file(&file.absolute_path) {
                Ok(digest) => {
                    let mut guard = maps.lock().unwrap();
                    let (path_to_digest, digest_to_first) = &mut *guard;
                    path_to_digest.insert(file.relative_path.clone(), digest.clone());
                    digest_to_first.entry(digest).or_insert_with(|| file.relative_path.clone());
                }
                Err(e) => eprintln!("Error: could not hash {}: {}", file.relative_path, e),
            }
        })?;
    }

    let (path_to_digest, digest_to_first) = {
        let mut guard = maps.lock().unwrap();
        (std::mem::take(&mut guard.0), std::mem::take(&mut guard.1))
    };

    let mut originals = Vec::new();
    let mut duplicates = Vec::new();
    for file in entries.iter() {
        let Some(digest) = path_to_digest.get(&file.relative_path) else {
            continue; // hashing failed, already reported
        };
        if digest_to_first.get(digest) == Some(&file.relative_path) {
            originals.push(file.clone());
        } else {
            duplicates.push(file.clone());
        }
    }

    Ok(Classified { originals, duplicates, digests: path_to_digest })
}
