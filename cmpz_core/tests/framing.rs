//! Splitter and record-level framing, without the worker pool.
use std::io::{self, Read};

use cmpz_core::format::{read_stream_header, RecordHeader, RECORD_HEADER_SIZE};
use cmpz_core::{ChunkSplitter, EncodedChunk, Error, FormatError, RecordReader, StreamWriter, MAGIC};

/// Hands out at most `step` bytes per `read` call, with an `Interrupted`
/// error before every other read.
struct Trickle<'a> {
    data: &'a [u8],
    step: usize,
    interrupt: bool,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "try again"));
        }
        let n = self.step.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// Yields `good` bytes, then fails.
struct Broken {
    good: usize,
}

impl Read for Broken {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        }
        let n = self.good.min(buf.len());
        buf[..n].fill(0xEE);
        self.good -= n;
        Ok(n)
    }
}

fn chunk_sizes<R: Read>(splitter: ChunkSplitter<R>) -> Vec<usize> {
    splitter.map(|c| c.unwrap().len()).collect()
}

// ── splitter ──────────────────────────────────────────────────────────────

#[test]
fn test_splitter_sizes() {
    let data = vec![1u8; 40_000];
    assert_eq!(chunk_sizes(ChunkSplitter::new(&data[..], 16_384)), vec![16_384, 16_384, 7_232]);
    assert_eq!(chunk_sizes(ChunkSplitter::new(&data[..32_768], 16_384)), vec![16_384, 16_384]);
    assert_eq!(chunk_sizes(ChunkSplitter::new(&data[..1], 16_384)), vec![1]);
    assert!(chunk_sizes(ChunkSplitter::new(&data[..0], 16_384)).is_empty());
}

#[test]
fn test_splitter_raises_zero_chunk_size_to_one() {
    assert_eq!(chunk_sizes(ChunkSplitter::new(&b"abc"[..], 0)), vec![1, 1, 1]);
}

#[test]
fn test_splitter_coalesces_short_reads() {
    let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
    let reader = Trickle {
        data: &data,
        step: 7,
        interrupt: false,
    };

    let chunks: Vec<_> = ChunkSplitter::new(reader, 300).map(|c| c.unwrap()).collect();
    assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![300, 300, 300, 100]);
    assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    let joined: Vec<u8> = chunks.iter().flat_map(|c| c.bytes.iter().copied()).collect();
    assert_eq!(joined, data);
}

#[test]
fn test_splitter_surfaces_read_errors_then_stops() {
    let mut splitter = ChunkSplitter::new(Broken { good: 150 }, 100);

    let first = splitter.next().unwrap().unwrap();
    assert_eq!(first.len(), 100);

    let err = splitter.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

    assert!(splitter.next().is_none(), "splitter is fused after an error");
    assert_eq!(splitter.chunks_read(), 1);
}

// ── record framing ────────────────────────────────────────────────────────

#[test]
fn test_record_header_layout_is_little_endian() {
    let header = RecordHeader {
        length: 0x0102,
        raw_len: 0x4000,
    };
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), RECORD_HEADER_SIZE);
    assert_eq!(&bytes[..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
    assert_eq!(&bytes[8..], &[0x00, 0x40, 0, 0, 0, 0, 0, 0]);
    assert_eq!(RecordHeader::from_bytes(&bytes), header);
}

#[test]
fn test_writer_then_reader() {
    let chunks = [
        EncodedChunk {
            index: 0,
            bytes: b"first payload".to_vec(),
            original_size: 100,
        },
        EncodedChunk {
            index: 1,
            bytes: b"second".to_vec(),
            original_size: 42,
        },
    ];

    let mut stream = Vec::new();
    let mut writer = StreamWriter::create(&mut stream).unwrap();
    for chunk in &chunks {
        writer.write_chunk(chunk).unwrap();
    }
    let stats = writer.finish().unwrap();
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.raw_bytes, 142);
    assert_eq!(stats.compressed_bytes, 19);
    assert_eq!(&stream[..4], MAGIC);

    let mut reader = RecordReader::open(&stream[..]).unwrap();
    let first = reader.next().unwrap().unwrap();
    assert_eq!((first.index, first.raw_len, first.payload.as_slice()), (0, 100, &b"first payload"[..]));
    let second = reader.next().unwrap().unwrap();
    assert_eq!((second.index, second.raw_len, second.payload.as_slice()), (1, 42, &b"second"[..]));
    assert!(reader.next().is_none());
    assert_eq!(reader.records_read(), 2);
}

#[test]
fn test_reader_is_fused_after_format_error() {
    let mut stream = MAGIC.to_vec();
    stream.extend_from_slice(&RecordHeader { length: 50, raw_len: 60 }.to_bytes());
    stream.extend_from_slice(&[0u8; 20]);

    let mut reader = RecordReader::open(&stream[..]).unwrap();
    let err = reader.next().unwrap().unwrap_err();
    assert!(
        matches!(err, Error::Format(FormatError::TruncatedRecord { index: 0, expected: 50, actual: 20 })),
        "got {err:?}"
    );
    assert!(reader.next().is_none());
}

#[test]
fn test_stream_header_check() {
    assert!(read_stream_header(&mut &b"CMP1rest"[..]).is_ok());
    assert!(matches!(
        read_stream_header(&mut &b"PK\x03\x04"[..]),
        Err(Error::Format(FormatError::BadMagic(_)))
    ));
}
