use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, info};

use crate::chunk::{ChunkRecord, RawChunk};
use crate::codec::{ChunkCodec, Codec};
use crate::config::PipelineConfig;
use crate::error::{ChunkError, Error};
use crate::fanout::FanOut;
use crate::reader::RecordReader;
use crate::splitter::ChunkSplitter;
use crate::stats::StreamStats;
use crate::writer::StreamWriter;

/// Chunked parallel compressor/decompressor for CMP1 streams.
///
/// Both directions have the same shape:
/// split (or read records) → fan out to the worker pool → fan in by index →
/// write. Nothing is written to `output` until every chunk has been
/// processed successfully, so a failed run leaves `output` untouched.
pub struct Pipeline {
    config: PipelineConfig,
    codec: ChunkCodec,
    fanout: FanOut,
}

impl Pipeline {
    pub fn new(codec: Arc<dyn Codec>, config: PipelineConfig) -> Result<Self, Error> {
        config.validate()?;
        let fanout = FanOut::from_config(&config);
        Ok(Self {
            config,
            codec: ChunkCodec::new(codec),
            fanout,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compress `input` into a CMP1 stream on `output`.
    pub fn compress_stream<R: Read, W: Write>(&self, input: R, output: W) -> Result<StreamStats, Error> {
        info!(
            codec = self.codec.name(),
            chunk_size = self.config.chunk_size,
            workers = self.fanout.workers(),
            "compressing stream"
        );

        let splitter = ChunkSplitter::new(input, self.config.chunk_size);
        let encoded = self
            .fanout
            .run(splitter, |chunk: RawChunk| self.codec.encode(chunk).map_err(ChunkError::from))?;

        let mut writer = StreamWriter::create(output)?;
        for chunk in &encoded {
            writer.write_chunk(chunk)?;
        }
        let stats = writer.finish()?;

        info!(
            chunks = stats.chunks,
            raw_bytes = stats.raw_bytes,
            compressed_bytes = stats.compressed_bytes,
            "compression complete"
        );
        Ok(stats)
    }

    /// Decompress a CMP1 stream from `input` and write the raw bytes to `output`.
    pub fn decompress_stream<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<StreamStats, Error> {
        let records = RecordReader::open(input)?;
        info!(
            codec = self.codec.name(),
            workers = self.fanout.workers(),
            "decompressing stream"
        );

        let mut stats = StreamStats::default();
        let decoded = self.fanout.run(records, |record: ChunkRecord| {
            let compressed = record.payload.len() as u64;
            let chunk = self.codec.decode(record)?;
            Ok((compressed, chunk))
        })?;

        for (compressed, chunk) in &decoded {
            output.write_all(&chunk.bytes)?;
            stats.chunks += 1;
            stats.raw_bytes += chunk.original_size;
            stats.compressed_bytes += compressed;
        }
        output.flush()?;

        info!(
            chunks = stats.chunks,
            raw_bytes = stats.raw_bytes,
            "decompression complete"
        );
        Ok(stats)
    }
}

/// Walk every record of a CMP1 stream without decoding any payload.
///
/// Applies the same header and framing checks as decompression, so a stream
/// that inspects cleanly is structurally valid.
pub fn inspect_stream<R: Read>(input: R) -> Result<StreamStats, Error> {
    let mut records = RecordReader::open(input)?;
    for record in records.by_ref() {
        record?;
    }
    let stats = StreamStats {
        chunks: records.records_read(),
        raw_bytes: records.raw_bytes(),
        compressed_bytes: records.compressed_bytes(),
    };
    debug!(?stats, "inspected stream");
    Ok(stats)
}
