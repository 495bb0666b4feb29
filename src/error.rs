use std::io;
use std::path::PathBuf;

/// Convenient crate-wide result type.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// The primary error type for all operations in the `dedupack` crate.
#[derive(Debug)]
pub enum ArchiveError {
    /// An I/O error, annotated with the operation that failed and the path
    /// it failed on (empty when the error is not tied to a single path).
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The archive's on-disk layout is damaged: truncated footer, bad magic
    /// trailer, impossible record counts, or a short read inside metadata.
    Format(String),

    /// A compression or decompression engine reported a failure.
    Codec(String),

    /// An extracted file hashed to something other than its recorded digest.
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The archive names a codec id that this build does not include.
    UnsupportedCodec(u32),

    /// The worker pool rejected a task or lost a worker.
    Pool(&'static str),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io { op, path, source } => {
                if path.as_os_str().is_empty() {
                    write!(f, "{} failed: {}", op, source)
                } else {
                    write!(f, "{} failed for '{}': {}", op, path.display(), source)
                }
            }
            ArchiveError::Format(msg) => write!(f, "Format error: {}", msg),
            ArchiveError::Codec(msg) => write!(f, "Codec error: {}", msg),
            ArchiveError::Integrity { path, expected, actual } => write!(
                f,
                "Hash mismatch for '{}': expected {}, got {}",
                path.display(),
                expected,
                actual
            ),
            ArchiveError::UnsupportedCodec(id) => {
                write!(f, "Unsupported codec (id {}): not available in this build", id)
            }
            ArchiveError::Pool(msg) => write!(f, "Worker pool error: {}", msg),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// Generic conversion for stream-level errors that carry no path context.
impl From<io::Error> for ArchiveError {
    fn from(err: io::Error) -> Self {
        ArchiveError::Io { op: "I/O", path: PathBuf::new(), source: err }
    }
}
