//! Test doubles shared by the integration tests.
//!
//! Inputs are built so that chunk `i` is filled with the byte `i`, which lets
//! a codec tell which chunk it was handed without knowing the index.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use cmpz_codecs::ZlibCodec;
use cmpz_core::{Codec, CodecError, PipelineConfig};

/// `count` chunks of `chunk_size` bytes, chunk `i` filled with `i as u8`.
pub fn chunked_pattern(count: usize, chunk_size: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| std::iter::repeat(i as u8).take(chunk_size))
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
pub fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

/// Generate `len` deterministic bytes using a simple LCG.
pub fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

pub fn config(chunk_size: usize, workers: usize) -> PipelineConfig {
    PipelineConfig::default()
        .with_chunk_size(chunk_size)
        .with_workers(workers)
}

/// zlib codec with a per-chunk script: optional delay and optional failure,
/// both keyed on the chunk's first byte. Counts every invocation that ran to
/// the end and logs the order chunks finished in.
pub struct ScriptedCodec {
    inner: ZlibCodec,
    delays: Vec<(u8, Duration)>,
    failures: Vec<u8>,
    started: AtomicUsize,
    finished: AtomicUsize,
    completion_order: Mutex<Vec<u8>>,
}

impl ScriptedCodec {
    pub fn new() -> Self {
        Self {
            inner: ZlibCodec::default(),
            delays: Vec::new(),
            failures: Vec::new(),
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            completion_order: Mutex::new(Vec::new()),
        }
    }

    pub fn delay(mut self, marker: u8, millis: u64) -> Self {
        self.delays.push((marker, Duration::from_millis(millis)));
        self
    }

    pub fn fail_on(mut self, marker: u8) -> Self {
        self.failures.push(marker);
        self
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn completion_order(&self) -> Vec<u8> {
        self.completion_order.lock().unwrap().clone()
    }

    fn run<T>(&self, marker: u8, op: impl FnOnce() -> Result<T, CodecError>) -> Result<T, CodecError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some((_, delay)) = self.delays.iter().find(|(m, _)| *m == marker) {
            thread::sleep(*delay);
        }
        let result = if self.failures.contains(&marker) {
            Err(CodecError::Compress {
                codec: "scripted",
                msg: format!("scripted failure on chunk marker {marker}"),
            })
        } else {
            op()
        };
        self.completion_order.lock().unwrap().push(marker);
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

impl Codec for ScriptedCodec {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn compress_block(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.run(raw[0], || self.inner.compress_block(raw))
    }

    fn decompress_block(&self, compressed: &[u8], expected_raw_len: u64) -> Result<Vec<u8>, CodecError> {
        self.run(0, || self.inner.decompress_block(compressed, expected_raw_len))
    }
}
