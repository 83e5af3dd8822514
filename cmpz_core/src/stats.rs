/// Byte and chunk counts for one compress, decompress, or inspect run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks: u64,
    /// Uncompressed bytes covered by the stream.
    pub raw_bytes: u64,
    /// Compressed payload bytes, excluding the stream and record headers.
    pub compressed_bytes: u64,
}

impl StreamStats {
    /// Compression ratio (raw / compressed).
    pub fn ratio(&self) -> f64 {
        if self.compressed_bytes == 0 {
            return 1.0;
        }
        self.raw_bytes as f64 / self.compressed_bytes as f64
    }
}
