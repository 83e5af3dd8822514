use std::io;

use thiserror::Error;

/// Failures of the single-block compress/decompress primitive.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("refusing to encode an empty chunk")]
    EmptyInput,
    #[error("chunk too large: {have} > {max} bytes")]
    ChunkTooLarge { have: usize, max: usize },
    #[error("{codec} compression failed: {msg}")]
    Compress { codec: &'static str, msg: String },
    #[error("{codec} decompression failed: {msg}")]
    Decompress { codec: &'static str, msg: String },
    #[error("decoded chunk is {actual} bytes but {expected} were expected")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// Violations of the CMP1 byte layout found while reading a stream.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("stream is too short to hold the CMP1 header ({have} of 4 bytes)")]
    MissingHeader { have: usize },
    #[error("invalid magic {0:02x?}; not a CMP1 stream")]
    BadMagic([u8; 4]),
    #[error("record {index}: truncated record header ({have} of {want} bytes)")]
    TruncatedRecordHeader { index: u64, have: usize, want: usize },
    #[error("truncated record {index}: expected {expected} payload bytes, found {actual}")]
    TruncatedRecord { index: u64, expected: u64, actual: u64 },
    #[error("record {index} is empty (length={length}, raw_len={raw_len})")]
    EmptyRecord { index: u64, length: u64, raw_len: u64 },
    #[error("record {index} payload of {length} bytes exceeds the {max} byte limit")]
    RecordTooLarge { index: u64, length: u64, max: u64 },
    #[error("record {index} claims {raw_len} raw bytes, above the {max} byte chunk limit")]
    ChunkTooLarge { index: u64, raw_len: u64, max: u64 },
}

/// What went wrong inside a single unit of work on a worker thread.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("worker thread {worker} panicked")]
    WorkerPanicked { worker: usize },
}

/// The first failure captured across all workers of one fan-out run.
///
/// Raised only after every worker has been joined, so `completed` always
/// equals `dispatched` for a run whose source was fully consumed.
#[derive(Debug, Error)]
#[error("chunk {index} failed ({completed} of {dispatched} units completed)")]
pub struct AggregatedFailure {
    /// Index of the chunk whose failure was captured first.
    pub index: u64,
    /// Units of work handed to the pool.
    pub dispatched: usize,
    /// Units of work that ran to completion or failure before the error was raised.
    pub completed: usize,
    #[source]
    pub cause: ChunkError,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Aggregated(#[from] AggregatedFailure),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
