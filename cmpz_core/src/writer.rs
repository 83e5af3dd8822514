use std::io::Write;

use crate::chunk::{EncodedChunk, Indexed};
use crate::error::Error;
use crate::format::{write_stream_header, RecordHeader};
use crate::stats::StreamStats;

/// Assembles encoded chunks into a CMP1 stream.
///
/// # Format layout written
/// ```text
/// [MAGIC: "CMP1"]
/// [len:u64 LE][raw_len:u64 LE][payload 0]
/// [len:u64 LE][raw_len:u64 LE][payload 1]
/// ...
/// ```
///
/// Chunks must be pushed in ascending index order starting at 0; the fan-in
/// collector guarantees this for the pipeline.
pub struct StreamWriter<W: Write> {
    inner: W,
    stats: StreamStats,
}

impl<W: Write> StreamWriter<W> {
    /// Write the stream header and return a writer positioned at record 0.
    pub fn create(mut inner: W) -> Result<Self, Error> {
        write_stream_header(&mut inner)?;
        Ok(Self {
            inner,
            stats: StreamStats::default(),
        })
    }

    pub fn write_chunk(&mut self, chunk: &EncodedChunk) -> Result<(), Error> {
        debug_assert_eq!(chunk.index(), self.stats.chunks, "records must be written in index order");

        let header = RecordHeader {
            length: chunk.bytes.len() as u64,
            raw_len: chunk.original_size,
        };
        self.inner.write_all(&header.to_bytes())?;
        self.inner.write_all(&chunk.bytes)?;

        self.stats.chunks += 1;
        self.stats.raw_bytes += chunk.original_size;
        self.stats.compressed_bytes += header.length;
        Ok(())
    }

    /// Flush the underlying writer and return what was written.
    pub fn finish(mut self) -> Result<StreamStats, Error> {
        self.inner.flush()?;
        Ok(self.stats)
    }
}
