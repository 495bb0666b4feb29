//! Directory enumeration for the compression pipeline.

use crate::error::{ArchiveError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects every regular file under `root`, in sorted
/// traversal order. With `skip_empty` (the default policy) zero-byte files
/// are left out entirely: they are never hashed, archived or re-created.
///
/// Symbolic links and other non-regular entries are ignored.
pub fn scan_directory(root: &Path, skip_empty: bool) -> Result<Vec<PathBuf>> {
    println!("Scanning directory: {}", root.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(|p| p.to_path_buf()).unwrap_or_else(|| root.to_path_buf());
            ArchiveError::Io { op: "directory scan", path, source: e.into() }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if skip_empty {
            let metadata = entry.metadata().map_err(|e| ArchiveError::Io {
                op: "directory scan",
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?;
            if metadata.len() == 0 {
                continue;
            }
        }
        files.push(entry.into_path());
    }

    println!("Found {} files", files.len());
    Ok(files)
}
