use super::{CodecId, StreamCodec, BUFFER_SIZE};
use crate::error::{ArchiveError, Result};
use std::io::{self, BufReader, Read, Write};

const LEVEL: i32 = 3;

/// Zstandard frames via the `zstd` crate.
pub struct ZstdCodec;

impl StreamCodec for ZstdCodec {
    fn id(&self) -> CodecId {
        CodecId::Zstd
    }

    fn encode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut encoder = zstd::stream::Encoder::new(output, LEVEL)
            .map_err(|e| ArchiveError::Codec(format!("zstd encoder init failed: {}", e)))?;
        io::copy(input, &mut encoder)
            .map_err(|e| ArchiveError::Codec(format!("zstd encode failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| ArchiveError::Codec(format!("zstd finish failed: {}", e)))?;
        Ok(())
    }

    fn decode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
        let decoder = zstd::stream::read::Decoder::with_buffer(BufReader::with_capacity(
            BUFFER_SIZE,
            input,
        ))
        .map_err(|e| ArchiveError::Codec(format!("zstd decoder init failed: {}", e)))?;
        // One call decodes one frame; bytes past it stay in the reader.
        let mut decoder = decoder.single_frame();
        let decoded = io::copy(&mut decoder, output)
            .map_err(|e| ArchiveError::Codec(format!("zstd decode failed: {}", e)))?;
        Ok(decoded)
    }
}
