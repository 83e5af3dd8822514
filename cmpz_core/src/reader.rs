use std::io::Read;

use tracing::trace;

use crate::chunk::ChunkRecord;
use crate::error::{Error, FormatError};
use crate::format::{read_full, read_stream_header, RecordHeader, RECORD_HEADER_SIZE};

/// Sequential reader over the records of a CMP1 stream.
///
/// # Open sequence
/// [`open`](Self::open) consumes the 4-byte header and checks the magic, so a
/// stream that is not CMP1 is rejected before a single record is touched.
///
/// # Iteration
/// Each call to `next` reads one record header, validates it, then reads
/// exactly `length` payload bytes. End-of-stream is only clean on a record
/// boundary; anything else is a [`FormatError`]. After the first error the
/// reader yields nothing further.
pub struct RecordReader<R> {
    inner: R,
    next_index: u64,
    raw_bytes: u64,
    compressed_bytes: u64,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn open(mut inner: R) -> Result<Self, Error> {
        read_stream_header(&mut inner)?;
        Ok(Self {
            inner,
            next_index: 0,
            raw_bytes: 0,
            compressed_bytes: 0,
            done: false,
        })
    }

    /// Records read so far.
    pub fn records_read(&self) -> u64 {
        self.next_index
    }

    /// Sum of `raw_len` over the records read so far.
    pub fn raw_bytes(&self) -> u64 {
        self.raw_bytes
    }

    /// Sum of payload lengths over the records read so far.
    pub fn compressed_bytes(&self) -> u64 {
        self.compressed_bytes
    }

    fn read_record(&mut self) -> Result<Option<ChunkRecord>, Error> {
        let index = self.next_index;

        let mut header_buf = [0u8; RECORD_HEADER_SIZE];
        let have = read_full(&mut self.inner, &mut header_buf)?;
        if have == 0 {
            return Ok(None);
        }
        if have < RECORD_HEADER_SIZE {
            return Err(FormatError::TruncatedRecordHeader {
                index,
                have,
                want: RECORD_HEADER_SIZE,
            }
            .into());
        }

        let header = RecordHeader::from_bytes(&header_buf);
        header.validate(index)?;

        let mut payload = vec![0u8; header.length as usize];
        let got = read_full(&mut self.inner, &mut payload)?;
        if got < payload.len() {
            return Err(FormatError::TruncatedRecord {
                index,
                expected: header.length,
                actual: got as u64,
            }
            .into());
        }

        trace!(index, length = header.length, raw_len = header.raw_len, "read record");
        self.next_index += 1;
        self.raw_bytes += header.raw_len;
        self.compressed_bytes += header.length;
        Ok(Some(ChunkRecord {
            index,
            raw_len: header.raw_len,
            payload,
        }))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<ChunkRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
