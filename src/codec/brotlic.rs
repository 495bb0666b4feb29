use super::{CodecId, StreamCodec, BUFFER_SIZE};
use crate::error::{ArchiveError, Result};
use brotli::enc::BrotliEncoderParams;
use std::io::{self, Read, Write};

/// Brotli frames via the pure-Rust `brotli` crate.
///
/// Quality 11 with a 22-bit window, the format's reference defaults.
pub struct BrotliCodec;

impl StreamCodec for BrotliCodec {
    fn id(&self) -> CodecId {
        CodecId::Brotli
    }

    fn encode(&self, mut input: &mut dyn Read, mut output: &mut dyn Write) -> Result<()> {
        let mut params = BrotliEncoderParams::default();
        params.quality = 11;
        params.lgwin = 22;
        brotli::BrotliCompress(&mut input, &mut output, &params)
            .map_err(|e| ArchiveError::Codec(format!("brotli encode failed: {}", e)))?;
        Ok(())
    }

    fn decode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
        let mut decoder = brotli::Decompressor::new(input, BUFFER_SIZE);
        let decoded = io::copy(&mut decoder, output)
            .map_err(|e| ArchiveError::Codec(format!("brotli decode failed: {}", e)))?;
        Ok(decoded)
    }
}
