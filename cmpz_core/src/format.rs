use std::io::{ErrorKind, Read, Write};

use crate::config::MAX_CHUNK_SIZE;
use crate::error::{Error, FormatError};

/// Magic bytes at offset 0 of every CMP1 stream.
pub const MAGIC: &[u8; 4] = b"CMP1";

/// Size of the stream header in bytes (the magic alone).
pub const STREAM_HEADER_SIZE: usize = MAGIC.len();

/// Size of each record header in bytes.
///   length:u64 + raw_len:u64 = 8 + 8 = 16
pub const RECORD_HEADER_SIZE: usize = 16;

/// Largest compressed payload a reader will allocate for.
///
/// zlib never expands a block by more than a few bytes per 16 KB, so twice
/// the largest chunk leaves plenty of headroom.
pub const MAX_RECORD_LEN: u64 = 2 * MAX_CHUNK_SIZE as u64;

// ── Stream header ──────────────────────────────────────────────────────────

pub fn write_stream_header<W: Write>(w: &mut W) -> Result<(), Error> {
    w.write_all(MAGIC)?;
    Ok(())
}

/// Read the 4-byte header and check the magic.
///
/// A stream shorter than the header is reported as
/// [`FormatError::MissingHeader`], not as an I/O error.
pub fn read_stream_header<R: Read>(r: &mut R) -> Result<(), Error> {
    let mut buf = [0u8; STREAM_HEADER_SIZE];
    let have = read_full(r, &mut buf)?;
    if have < STREAM_HEADER_SIZE {
        return Err(FormatError::MissingHeader { have }.into());
    }
    if &buf != MAGIC {
        return Err(FormatError::BadMagic(buf).into());
    }
    Ok(())
}

// ── Record header ──────────────────────────────────────────────────────────

/// Fixed-width prefix of one chunk record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Length of the compressed payload that follows, in bytes.
    pub length: u64,
    /// Length of the chunk before compression, in bytes.
    pub raw_len: u64,
}

impl RecordHeader {
    /// Serialize to exactly `RECORD_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut buf = [0u8; RECORD_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.length.to_le_bytes());
        buf[8..16].copy_from_slice(&self.raw_len.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; RECORD_HEADER_SIZE]) -> Self {
        let mut length = [0u8; 8];
        let mut raw_len = [0u8; 8];
        length.copy_from_slice(&buf[0..8]);
        raw_len.copy_from_slice(&buf[8..16]);
        Self {
            length: u64::from_le_bytes(length),
            raw_len: u64::from_le_bytes(raw_len),
        }
    }

    /// Reject headers no writer would produce, before anything is allocated.
    pub fn validate(&self, index: u64) -> Result<(), FormatError> {
        if self.length == 0 || self.raw_len == 0 {
            return Err(FormatError::EmptyRecord {
                index,
                length: self.length,
                raw_len: self.raw_len,
            });
        }
        if self.length > MAX_RECORD_LEN {
            return Err(FormatError::RecordTooLarge {
                index,
                length: self.length,
                max: MAX_RECORD_LEN,
            });
        }
        if self.raw_len > MAX_CHUNK_SIZE as u64 {
            return Err(FormatError::ChunkTooLarge {
                index,
                raw_len: self.raw_len,
                max: MAX_CHUNK_SIZE as u64,
            });
        }
        Ok(())
    }
}

/// Read until `buf` is full or the reader hits end-of-stream.
///
/// Returns how many bytes were read; anything short of `buf.len()` means the
/// stream ended.
pub(crate) fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
