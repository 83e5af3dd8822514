use std::io::{self, Read};

use crate::chunk::RawChunk;
use crate::format::read_full;

/// Lazily cuts a reader into [`RawChunk`]s of `chunk_size` bytes.
///
/// Every chunk is exactly `chunk_size` bytes except possibly the last one.
/// Short reads from the underlying reader are coalesced, so a chunk is only
/// ever short at end-of-stream, and an empty chunk is never yielded.
///
/// The iterator is fused: after an I/O error or end-of-stream it keeps
/// returning `None`.
pub struct ChunkSplitter<R> {
    reader: R,
    chunk_size: usize,
    next_index: u64,
    done: bool,
}

impl<R: Read> ChunkSplitter<R> {
    /// A `chunk_size` of zero is raised to one byte.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            next_index: 0,
            done: false,
        }
    }

    /// Number of chunks yielded so far.
    pub fn chunks_read(&self) -> u64 {
        self.next_index
    }

    /// Fill up to `chunk_size` bytes, stopping early only at end-of-stream.
    fn fill(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; self.chunk_size];
        let filled = read_full(&mut self.reader, &mut buf)?;
        buf.truncate(filled);
        Ok(buf)
    }
}

impl<R: Read> Iterator for ChunkSplitter<R> {
    type Item = io::Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fill() {
            Ok(bytes) if bytes.is_empty() => {
                self.done = true;
                None
            }
            Ok(bytes) => {
                if bytes.len() < self.chunk_size {
                    self.done = true;
                }
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(RawChunk { index, bytes }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
