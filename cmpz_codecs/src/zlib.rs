use std::io::{Read, Write};

use cmpz_core::{Codec, CodecError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// zlib block codec.
///
/// Every chunk becomes its own complete zlib stream (header, deflate data,
/// adler32 trailer), so any chunk can be inflated without touching its
/// neighbours and corruption is caught by the trailer checksum.
pub struct ZlibCodec {
    /// Compression level (0 = store, 9 = slowest / smallest).
    pub level: u32,
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl ZlibCodec {
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }
}

impl Codec for ZlibCodec {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let err = |e: std::io::Error| CodecError::Compress {
            codec: self.name(),
            msg: e.to_string(),
        };
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2 + 64), Compression::new(self.level));
        encoder.write_all(raw).map_err(err)?;
        encoder.finish().map_err(err)
    }

    fn decompress_block(&self, compressed: &[u8], expected_raw_len: u64) -> Result<Vec<u8>, CodecError> {
        let err = |msg: String| CodecError::Decompress {
            codec: self.name(),
            msg,
        };
        // Read one byte past the expected size so an oversize payload shows up
        // as a length mismatch instead of an unbounded allocation.
        let mut raw = Vec::with_capacity(expected_raw_len as usize);
        let mut decoder = ZlibDecoder::new(compressed);
        decoder
            .by_ref()
            .take(expected_raw_len.saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|e| err(e.to_string()))?;

        // An oversize stream was cut short above, so its input is only
        // partly consumed; leave that case to the caller's length check.
        if raw.len() as u64 <= expected_raw_len && decoder.total_in() != compressed.len() as u64 {
            return Err(err(format!(
                "{} trailing bytes after zlib stream",
                compressed.len() as u64 - decoder.total_in()
            )));
        }
        Ok(raw)
    }
}
