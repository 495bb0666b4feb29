//! SHA-256 digests over files and in-memory buffers.
//!
//! Digests are lower-case hex, 64 characters. Files are streamed in 8 KiB
//! chunks so hashing never loads a whole file into memory.

use crate::error::{ArchiveError, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 8192;

/// Computes the SHA-256 digest of a file's contents.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| ArchiveError::Io {
        op: "hashing",
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|e| ArchiveError::Io {
            op: "hashing",
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Computes the SHA-256 digest of an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_buffer_hashes_to_the_canonical_digest() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn known_vector() {
        assert_eq!(
            hash_bytes(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn file_digest_matches_buffer_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        let payload = b"some sample payload for hashing";
        File::create(&path).unwrap().write_all(payload).unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(payload));
    }

    #[test]
    fn empty_file_hashes_to_the_canonical_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap();
        assert_eq!(hash_file(&path).unwrap(), EMPTY_SHA256);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = hash_file(Path::new("/does/not/exist")).unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
    }
}
