//! Bounded fan-out / ordered fan-in over a pool of worker threads.
//!
//! ```text
//!   source ──▶ [bounded task queue] ──▶ worker 0 ─┐
//!                                   ──▶ worker 1 ─┼──▶ results: BTreeMap<index, Out>
//!                                   ──▶ worker N ─┘    first_failure: Option<(index, err)>
//! ```
//!
//! The orchestrating thread pulls items from the source and blocks on the
//! queue when every worker is busy, so at most `workers + queue_depth` items
//! are in flight on the input side. Results land in an index-keyed map and are
//! read back in ascending index order once every worker has been joined.
//!
//! There is no early abort: once an item is queued it is processed, even
//! after another item has failed. Only the first failure is kept.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam::channel::{bounded, Receiver};
use tracing::{debug, trace, warn};

use crate::chunk::Indexed;
use crate::config::PipelineConfig;
use crate::error::{AggregatedFailure, ChunkError, Error};

/// Worker-pool shape for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    workers: usize,
    queue_depth: usize,
}

/// State shared by every worker of one run. The collector and the failure
/// slot have separate locks so a failing worker never stalls result inserts.
struct Shared<Out> {
    results: Mutex<BTreeMap<u64, Out>>,
    first_failure: Mutex<Option<(u64, ChunkError)>>,
    completed: AtomicUsize,
}

impl FanOut {
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_depth: queue_depth.max(1),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.workers, config.queue_depth)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `transform` over every item of `source` and return the outputs in
    /// index order.
    ///
    /// # Errors
    /// - If `source` yields an error, dispatch stops, the queued items are
    ///   still drained, every worker is joined, and that error is returned.
    /// - Otherwise, if any transform failed (or panicked), the first captured
    ///   failure is returned as [`Error::Aggregated`] and all successful
    ///   outputs are dropped.
    pub fn run<In, Out, E, S, F>(&self, source: S, transform: F) -> Result<Vec<Out>, Error>
    where
        S: IntoIterator<Item = Result<In, E>>,
        E: Into<Error>,
        In: Indexed + Send,
        Out: Send,
        F: Fn(In) -> Result<Out, ChunkError> + Sync,
    {
        let shared = Shared {
            results: Mutex::new(BTreeMap::new()),
            first_failure: Mutex::new(None),
            completed: AtomicUsize::new(0),
        };
        let (tx, rx) = bounded::<In>(self.queue_depth);

        let (dispatched, source_error) = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|worker| {
                    let rx = rx.clone();
                    let transform = &transform;
                    let shared = &shared;
                    scope.spawn(move || run_worker(worker, rx, transform, shared))
                })
                .collect();
            drop(rx);

            let mut dispatched = 0usize;
            let mut source_error: Option<Error> = None;
            for item in source {
                match item {
                    Ok(item) => {
                        trace!(index = item.index(), "dispatching chunk");
                        if tx.send(item).is_err() {
                            break;
                        }
                        dispatched += 1;
                    }
                    Err(e) => {
                        source_error = Some(e.into());
                        break;
                    }
                }
            }
            drop(tx);

            for handle in handles {
                if let Err(payload) = handle.join() {
                    // transform panics are caught per item; this is a bug in the worker loop
                    panic::resume_unwind(payload);
                }
            }
            (dispatched, source_error)
        });

        let completed = shared.completed.into_inner();
        debug!(dispatched, completed, workers = self.workers, "all workers joined");

        if let Some(err) = source_error {
            return Err(err);
        }
        let failure = shared
            .first_failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((index, cause)) = failure {
            return Err(AggregatedFailure {
                index,
                dispatched,
                completed,
                cause,
            }
            .into());
        }

        let results = shared
            .results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        debug_assert_eq!(results.len(), dispatched);
        Ok(results.into_values().collect())
    }
}

fn run_worker<In, Out, F>(worker: usize, rx: Receiver<In>, transform: &F, shared: &Shared<Out>)
where
    In: Indexed,
    F: Fn(In) -> Result<Out, ChunkError>,
{
    let mut processed = 0usize;
    while let Ok(item) = rx.recv() {
        let index = item.index();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| transform(item)))
            .unwrap_or_else(|_| Err(ChunkError::WorkerPanicked { worker }));

        match outcome {
            Ok(out) => {
                lock(&shared.results).insert(index, out);
            }
            Err(cause) => shared.record_failure(worker, index, cause),
        }
        shared.completed.fetch_add(1, Ordering::SeqCst);
        processed += 1;
    }
    trace!(worker, processed, "worker drained queue");
}

impl<Out> Shared<Out> {
    fn record_failure(&self, worker: usize, index: u64, cause: ChunkError) {
        warn!(worker, index, error = %cause, "chunk failed");
        let mut slot = lock(&self.first_failure);
        if slot.is_none() {
            *slot = Some((index, cause));
        } else {
            drop(slot);
            debug!(index, "an earlier failure was already captured; discarding this one");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
