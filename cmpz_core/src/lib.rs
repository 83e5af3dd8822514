pub mod chunk;
pub mod codec;
pub mod config;
pub mod error;
pub mod fanout;
pub mod format;
pub mod pipeline;
pub mod reader;
pub mod splitter;
pub mod stats;
pub mod writer;

pub use chunk::{ChunkRecord, EncodedChunk, Indexed, RawChunk};
pub use codec::{ChunkCodec, Codec};
pub use config::{PipelineConfig, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use error::{AggregatedFailure, ChunkError, CodecError, Error, FormatError};
pub use fanout::FanOut;
pub use format::MAGIC;
pub use pipeline::{inspect_stream, Pipeline};
pub use reader::RecordReader;
pub use splitter::ChunkSplitter;
pub use stats::StreamStats;
pub use writer::StreamWriter;
