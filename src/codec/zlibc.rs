use super::{CodecId, StreamCodec, BUFFER_SIZE};
use crate::error::{ArchiveError, Result};
use flate2::bufread::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, BufReader, Read, Write};

/// DEFLATE frames with a zlib header, via `flate2`.
pub struct ZlibCodec;

impl StreamCodec for ZlibCodec {
    fn id(&self) -> CodecId {
        CodecId::Zlib
    }

    fn encode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut encoder = ZlibEncoder::new(output, Compression::default());
        io::copy(input, &mut encoder)
            .map_err(|e| ArchiveError::Codec(format!("zlib encode failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| ArchiveError::Codec(format!("zlib finish failed: {}", e)))?;
        Ok(())
    }

    fn decode(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
        // The bufread decoder consumes only the bytes belonging to the frame.
        let mut decoder = ZlibDecoder::new(BufReader::with_capacity(BUFFER_SIZE, input));
        let decoded = io::copy(&mut decoder, output)
            .map_err(|e| ArchiveError::Codec(format!("zlib decode failed: {}", e)))?;
        Ok(decoded)
    }
}
