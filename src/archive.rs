//! The on-disk archive format.
//!
//! An archive is a flat byte stream with three regions:
//!
//! 1. Original payloads: one codec frame per unique file content, written
//!    back-to-back starting at byte 0.
//! 2. The metadata table: full records for originals, then short records
//!    for duplicates.
//! 3. A fixed-size footer ending in the 8-byte magic trailer `b"DPKIDX01"`,
//!    read first on extraction.
//!
//! Everything is little-endian with no padding. Strings are a `u64` byte
//! length followed by UTF-8 bytes. A record whose digest is empty is a
//! duplicate: its `data_offset` aliases the original frame holding the same
//! content, and it contributes no bytes to the payload region.

use crate::codec::CodecId;
use crate::error::{ArchiveError, Result};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Trailer magic: the last 8 bytes of every archive. A future revision of
/// the format bumps the trailing digits.
pub const MAGIC: [u8; 8] = *b"DPKIDX01";

/// codec id (u32) + n_original (u64) + n_duplicate (u64) + meta offset (u64)
/// + magic trailer.
pub const FOOTER_SIZE: u64 = 4 + 8 + 8 + 8 + 8;

/// Shortest possible metadata record: offset + one empty string.
const MIN_RECORD_SIZE: u64 = 8 + 8;

/// Upper bound for a serialised digest or path. Real digests are 64 bytes
/// and paths far shorter; anything larger means a corrupt length field, and
/// rejecting it early avoids huge allocations.
const MAX_STRING_LEN: u64 = 1 << 20;

/// One entry in the archive's metadata table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Byte offset of the codec frame holding this file's content. For a
    /// duplicate this is the offset of the original's frame.
    pub data_offset: i64,
    /// Lower-case hex SHA-256 of the decoded content; empty for duplicates.
    pub digest: String,
    /// Path relative to the compression root, forward slashes.
    pub relative_path: String,
}

impl FileRecord {
    pub fn is_duplicate(&self) -> bool {
        self.digest.is_empty()
    }
}

/// The fixed-size block at the very end of the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub codec_id: u32,
    pub n_original: u64,
    pub n_duplicate: u64,
    pub meta_offset: u64,
}

pub fn write_u32<W: Write>(stream: &mut W, value: u32) -> Result<()> {
    stream.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub fn write_u64<W: Write>(stream: &mut W, value: u64) -> Result<()> {
    stream.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub fn write_i64<W: Write>(stream: &mut W, value: i64) -> Result<()> {
    stream.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Writes a `u64` length prefix followed by the UTF-8 bytes.
pub fn write_string<W: Write>(stream: &mut W, value: &str) -> Result<()> {
    write_u64(stream, value.len() as u64)?;
    stream.write_all(value.as_bytes())?;
    Ok(())
}

// Short reads while parsing metadata mean a truncated or corrupt archive,
// which is a format error rather than a plain I/O failure.
fn fill<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<()> {
    stream.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            ArchiveError::Format(format!("incomplete read ({} bytes expected)", buf.len()))
        }
        _ => ArchiveError::Io { op: "archive read", path: PathBuf::new(), source: e },
    })
}

pub fn read_u32<R: Read>(stream: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    fill(stream, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64<R: Read>(stream: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    fill(stream, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_i64<R: Read>(stream: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    fill(stream, &mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

pub fn read_string<R: Read>(stream: &mut R) -> Result<String> {
    let len = read_u64(stream)?;
    if len > MAX_STRING_LEN {
        return Err(ArchiveError::Format(format!("string length {} out of range", len)));
    }
    let mut buf = vec![0u8; len as usize];
    fill(stream, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|_| ArchiveError::Format("string field is not valid UTF-8".into()))
}

pub fn write_footer<W: Write>(stream: &mut W, footer: &Footer) -> Result<()> {
    write_u32(stream, footer.codec_id)?;
    write_u64(stream, footer.n_original)?;
    write_u64(stream, footer.n_duplicate)?;
    write_u64(stream, footer.meta_offset)?;
    stream.write_all(&MAGIC)?;
    Ok(())
}

/// Reads the footer from the end of the stream. The magic trailer is
/// validated before any other field is trusted, so a truncated archive is
/// reported as a format error instead of a garbage seek.
pub fn read_footer<R: Read + Seek>(stream: &mut R) -> Result<Footer> {
    let len = stream.seek(SeekFrom::End(0))?;
    if len < FOOTER_SIZE {
        return Err(ArchiveError::Format("archive too short to contain a footer".into()));
    }
    stream.seek(SeekFrom::Start(len - FOOTER_SIZE))?;

    let codec_id = read_u32(stream)?;
    let n_original = read_u64(stream)?;
    let n_duplicate = read_u64(stream)?;
    let meta_offset = read_u64(stream)?;
    let mut magic = [0u8; 8];
    fill(stream, &mut magic)?;
    if magic != MAGIC {
        return Err(ArchiveError::Format("bad archive trailer (magic mismatch)".into()));
    }

    let footer = Footer { codec_id, n_original, n_duplicate, meta_offset };
    let record_floor =
        footer.n_original.saturating_add(footer.n_duplicate).saturating_mul(MIN_RECORD_SIZE);
    if footer.meta_offset > len || record_floor > len {
        return Err(ArchiveError::Format("footer counts exceed archive size".into()));
    }
    Ok(footer)
}

/// Writes the metadata table (originals first, then duplicates) followed by
/// the footer. `stream` must be positioned at the end of the payload region.
pub fn write_metadata<W: Write + Seek>(
    stream: &mut W,
    records: &[FileRecord],
    codec: CodecId,
) -> Result<()> {
    let meta_offset = stream.stream_position()?;

    let (originals, duplicates): (Vec<&FileRecord>, Vec<&FileRecord>) =
        records.iter().partition(|r| !r.is_duplicate());

    for record in &originals {
        write_i64(stream, record.data_offset)?;
        write_string(stream, &record.digest)?;
        write_string(stream, &record.relative_path)?;
    }
    for record in &duplicates {
        write_i64(stream, record.data_offset)?;
        write_string(stream, &record.relative_path)?;
    }

    write_footer(
        stream,
        &Footer {
            codec_id: codec.as_u32(),
            n_original: originals.len() as u64,
            n_duplicate: duplicates.len() as u64,
            meta_offset,
        },
    )
}

/// Reads the footer and the full metadata table. Duplicate records come
/// back with an empty digest, mirroring how they were written.
pub fn read_metadata<R: Read + Seek>(stream: &mut R) -> Result<(Vec<FileRecord>, CodecId)> {
    let footer = read_footer(stream)?;
    let codec = CodecId::from_u32(footer.codec_id)?;

    stream.seek(SeekFrom::Start(footer.meta_offset))?;
    let mut records = Vec::with_capacity((footer.n_original + footer.n_duplicate) as usize);
    for _ in 0..footer.n_original {
        let data_offset = read_i64(stream)?;
        let digest = read_string(stream)?;
        let relative_path = read_string(stream)?;
        if digest.is_empty() {
            return Err(ArchiveError::Format(format!(
                "original record '{}' has an empty digest",
                relative_path
            )));
        }
        records.push(FileRecord { data_offset, digest, relative_path });
    }
    for _ in 0..footer.n_duplicate {
        let data_offset = read_i64(stream)?;
        let relative_path = read_string(stream)?;
        records.push(FileRecord { data_offset, digest: String::new(), relative_path });
    }

    Ok((records, codec))
}
