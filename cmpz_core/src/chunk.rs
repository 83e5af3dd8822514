/// Anything that carries its position in the original stream.
///
/// The fan-out engine keys its collector on this value, so it must be unique
/// within one run.
pub trait Indexed {
    fn index(&self) -> u64;
}

/// A bounded slice of the input stream, as produced by the splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub index: u64,
    pub bytes: Vec<u8>,
}

/// Output of one codec invocation.
///
/// On the compress path `bytes` is the compressed payload; on the decompress
/// path it is the recovered raw data. `original_size` is the raw byte count
/// in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub index: u64,
    pub bytes: Vec<u8>,
    pub original_size: u64,
}

/// One framed record read back from a CMP1 stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Position of the record in the stream, assigned by the reader.
    pub index: u64,
    /// Byte length of the chunk before compression.
    pub raw_len: u64,
    pub payload: Vec<u8>,
}

impl RawChunk {
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Indexed for RawChunk {
    fn index(&self) -> u64 {
        self.index
    }
}

impl Indexed for EncodedChunk {
    fn index(&self) -> u64 {
        self.index
    }
}

impl Indexed for ChunkRecord {
    fn index(&self) -> u64 {
        self.index
    }
}
