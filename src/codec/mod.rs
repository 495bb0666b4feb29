//! Pluggable streaming codecs.
//!
//! A codec turns one byte stream into one self-contained compressed frame
//! ([`StreamCodec::encode`]) and turns exactly one frame back into the
//! original bytes ([`StreamCodec::decode`]). Frames are written back-to-back
//! into the archive payload region, so `decode` must stop at the frame
//! boundary its own format signals.
//!
//! Each codec has a stable numeric identity persisted in the archive footer.
//! Which codecs are compiled in is a build-time choice (cargo features), but
//! the identity values never change, so archives stay portable: a build
//! without the required codec refuses the archive with an
//! [`ArchiveError::UnsupportedCodec`] instead of misreading it.

use crate::error::{ArchiveError, Result};
use std::io::{Read, Write};

#[cfg(feature = "zlib")]
pub mod zlibc;

#[cfg(feature = "brotli")]
pub mod brotlic;

#[cfg(feature = "zstd")]
pub mod zstdc;

#[cfg(not(any(feature = "zlib", feature = "brotli", feature = "zstd")))]
compile_error!("at least one codec feature (zlib, brotli, zstd) must be enabled");

/// Internal streaming buffer size shared by the codec implementations.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Stable identity of a codec, as persisted in the archive footer.
///
/// The numeric values are part of the on-disk format and must never be
/// renumbered, regardless of which codecs a given build includes.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    Zlib = 1,
    Brotli = 2,
    Zstd = 3,
}

impl CodecId {
    /// Wire representation of this codec id.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Parses a codec id read from an archive footer.
    pub fn from_u32(raw: u32) -> Result<Self> {
        match raw {
            1 => Ok(CodecId::Zlib),
            2 => Ok(CodecId::Brotli),
            3 => Ok(CodecId::Zstd),
            other => Err(ArchiveError::UnsupportedCodec(other)),
        }
    }
}

/// Capability implemented by every compression backend.
pub trait StreamCodec: Send + Sync {
    fn id(&self) -> CodecId;

    /// Reads `input` to end-of-stream and writes one compressed frame to
    /// `output`, finalising the frame on end-of-input.
    fn encode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()>;

    /// Reads exactly one compressed frame from `input`, writes the decoded
    /// bytes to `output` and returns how many bytes were decoded.
    fn decode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64>;
}

/// Returns the codec for `id`, or [`ArchiveError::UnsupportedCodec`] when it
/// is not compiled into this build.
pub fn create(id: CodecId) -> Result<&'static dyn StreamCodec> {
    match id {
        #[cfg(feature = "zlib")]
        CodecId::Zlib => Ok(&zlibc::ZlibCodec),
        #[cfg(feature = "brotli")]
        CodecId::Brotli => Ok(&brotlic::BrotliCodec),
        #[cfg(feature = "zstd")]
        CodecId::Zstd => Ok(&zstdc::ZstdCodec),
        #[allow(unreachable_patterns)]
        other => Err(ArchiveError::UnsupportedCodec(other.as_u32())),
    }
}

/// The codec used when the user does not ask for one: brotli when compiled
/// in, then zlib, then zstd.
pub fn default_codec() -> CodecId {
    if cfg!(feature = "brotli") {
        CodecId::Brotli
    } else if cfg!(feature = "zlib") {
        CodecId::Zlib
    } else {
        CodecId::Zstd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip_with_trailing_bytes(codec: &dyn StreamCodec) {
        let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

        let mut frame = Vec::new();
        codec.encode(&mut Cursor::new(&payload), &mut frame).unwrap();
        assert!(!frame.is_empty());

        // Bytes past the frame must not leak into the decoded output.
        frame.extend_from_slice(b"trailing bytes past the frame");

        let mut decoded = Vec::new();
        let count = codec.decode(&mut Cursor::new(&frame), &mut decoded).unwrap();
        assert_eq!(count, payload.len() as u64);
        assert_eq!(decoded, payload);
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn zlib_roundtrip() {
        roundtrip_with_trailing_bytes(&zlibc::ZlibCodec);
    }

    #[cfg(feature = "brotli")]
    #[test]
    fn brotli_roundtrip() {
        roundtrip_with_trailing_bytes(&brotlic::BrotliCodec);
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_roundtrip() {
        roundtrip_with_trailing_bytes(&zstdc::ZstdCodec);
    }

    #[test]
    fn codec_ids_are_stable() {
        assert_eq!(CodecId::Zlib.as_u32(), 1);
        assert_eq!(CodecId::Brotli.as_u32(), 2);
        assert_eq!(CodecId::Zstd.as_u32(), 3);
        assert_eq!(CodecId::from_u32(2).unwrap(), CodecId::Brotli);
    }

    #[test]
    fn unknown_codec_id_is_rejected() {
        let err = CodecId::from_u32(9).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedCodec(9)));
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn empty_input_still_produces_a_decodable_frame() {
        let codec = &zlibc::ZlibCodec;
        let mut frame = Vec::new();
        codec.encode(&mut Cursor::new(b""), &mut frame).unwrap();

        let mut decoded = Vec::new();
        let count = codec.decode(&mut Cursor::new(&frame), &mut decoded).unwrap();
        assert_eq!(count, 0);
        assert!(decoded.is_empty());
    }
}
