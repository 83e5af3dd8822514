use crate::error::Error;

/// Default chunk bound: 16 KB.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Largest chunk bound a pipeline accepts, and the largest `raw_len` a reader
/// will trust from a record header.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Tunables for one [`Pipeline`](crate::Pipeline).
///
/// `workers` caps the number of threads in the pool; `queue_depth` caps how
/// many chunks may sit in the task queue waiting for a free worker, which
/// bounds memory held by the splitter side of the pipeline.
///
/// Finished chunks are held in memory until every worker has joined, so
/// peak memory still grows with the size of the whole output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub workers: usize,
    pub queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let workers = num_cpus::get().max(1);
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers,
            queue_depth: workers * 2,
        }
    }
}

impl PipelineConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the worker count. The queue depth follows at twice the workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_depth = workers.saturating_mul(2);
        self
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "chunk size must be between 1 and {MAX_CHUNK_SIZE} bytes, got {}",
                self.chunk_size
            )));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig("worker count must be at least 1".into()));
        }
        if self.queue_depth == 0 {
            return Err(Error::InvalidConfig("queue depth must be at least 1".into()));
        }
        Ok(())
    }
}
