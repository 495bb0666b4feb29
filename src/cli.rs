//! Command-line interface definitions.

use crate::codec::CodecId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Content-addressed archiver: stores each unique file content once",
    after_help = "Example:\n  dedupack compress /var/logs logs.dpk --compression=zlib"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Create a deduplicated archive from a directory tree.
    #[command(alias = "c")]
    Compress {
        /// Directory to archive.
        dir: PathBuf,

        /// Path of the archive file to create.
        archive: PathBuf,

        /// Compression codec. Defaults to the best codec this build supports.
        #[arg(short = 'c', long = "compression", value_enum)]
        compression: Option<CodecArg>,
    },

    /// Restore a directory tree from an archive.
    #[command(alias = "x")]
    Decompress {
        /// Directory to restore into (created if missing).
        dir: PathBuf,

        /// Archive file to read.
        archive: PathBuf,
    },
}

/// Codec names accepted on the command line. Only codecs compiled into this
/// build are listed in `--help` or accepted.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CodecArg {
    #[cfg(feature = "zlib")]
    Zlib,
    #[cfg(feature = "brotli")]
    Brotli,
    #[cfg(feature = "zstd")]
    Zstd,
}

impl CodecArg {
    pub fn to_codec_id(self) -> CodecId {
        match self {
            #[cfg(feature = "zlib")]
            CodecArg::Zlib => CodecId::Zlib,
            #[cfg(feature = "brotli")]
            CodecArg::Brotli => CodecId::Brotli,
            #[cfg(feature = "zstd")]
            CodecArg::Zstd => CodecId::Zstd,
        }
    }
}
