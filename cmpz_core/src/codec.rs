use std::sync::Arc;

use tracing::trace;

use crate::chunk::{ChunkRecord, EncodedChunk, RawChunk};
use crate::config::MAX_CHUNK_SIZE;
use crate::error::CodecError;

/// Single-block compression primitive.
///
/// Implementations compress and decompress one block at a time with no state
/// carried between blocks; this is what lets every chunk of a stream be
/// handed to a different worker thread.
pub trait Codec: Send + Sync {
    /// Human-readable codec name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Compress a single independent block.
    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decompress a single independent block.
    ///
    /// `expected_raw_len` is the block's true size before compression, as
    /// recorded in the stream. Implementations may use it to size buffers and
    /// to stop reading early; [`ChunkCodec::decode`] checks the result length
    /// regardless.
    fn decompress_block(&self, compressed: &[u8], expected_raw_len: u64) -> Result<Vec<u8>, CodecError>;
}

/// Wraps a [`Codec`] with the chunk-level contract the pipeline relies on.
///
/// - never encodes an empty chunk or one above [`MAX_CHUNK_SIZE`];
/// - a decoded chunk must be exactly as long as its record says.
#[derive(Clone)]
pub struct ChunkCodec {
    codec: Arc<dyn Codec>,
}

impl ChunkCodec {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }

    pub fn name(&self) -> &'static str {
        self.codec.name()
    }

    pub fn encode(&self, chunk: RawChunk) -> Result<EncodedChunk, CodecError> {
        if chunk.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        if chunk.len() > MAX_CHUNK_SIZE {
            return Err(CodecError::ChunkTooLarge {
                have: chunk.len(),
                max: MAX_CHUNK_SIZE,
            });
        }

        let bytes = self.codec.compress_block(&chunk.bytes)?;
        trace!(
            index = chunk.index,
            raw = chunk.len(),
            compressed = bytes.len(),
            "encoded chunk"
        );
        Ok(EncodedChunk {
            index: chunk.index,
            bytes,
            original_size: chunk.len() as u64,
        })
    }

    pub fn decode(&self, record: ChunkRecord) -> Result<EncodedChunk, CodecError> {
        let bytes = self.codec.decompress_block(&record.payload, record.raw_len)?;
        if bytes.len() as u64 != record.raw_len {
            return Err(CodecError::SizeMismatch {
                expected: record.raw_len,
                actual: bytes.len() as u64,
            });
        }
        trace!(index = record.index, raw = bytes.len(), "decoded chunk");
        Ok(EncodedChunk {
            index: record.index,
            bytes,
            original_size: record.raw_len,
        })
    }
}
