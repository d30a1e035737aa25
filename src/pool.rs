//! Fixed-size worker pool for replaying corpus files.
//!
//! Every worker is handed its index explicitly so callers can derive
//! per-worker resources (such as profiling output files) without relying on
//! process ids. Jobs that fail are counted, never propagated: one bad input
//! must not stop the rest of the batch.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use crate::error::FuzzkitError;

/// Worker count used when the available parallelism cannot be determined.
pub const FALLBACK_WORKERS: usize = 8;

/// What the pool does after a job fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HaltPolicy {
    /// Keep dispatching remaining jobs.
    #[default]
    Never,
    /// Stop handing out jobs once any job has failed.
    OnFirstFailure,
}

/// Tally of a pool run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolOutcome {
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs never started because the pool halted.
    pub skipped: usize,
}

impl PoolOutcome {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// A pool of scoped worker threads.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    workers: usize,
    halt: HaltPolicy,
}

impl WorkerPool {
    pub fn new(workers: usize, halt: HaltPolicy) -> Self {
        Self { workers, halt }
    }

    /// Available parallelism, or [`FALLBACK_WORKERS`] if unknown.
    pub fn default_size() -> usize {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(FALLBACK_WORKERS)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` for every item. `job` receives the worker index in
    /// `0..workers` and the item.
    ///
    /// Returns an error only when the pool itself cannot run (no workers, or
    /// a worker thread could not be spawned).
    pub fn run<T, E, F>(&self, items: &[T], job: F) -> Result<PoolOutcome, FuzzkitError>
    where
        T: Sync + fmt::Debug,
        E: fmt::Display,
        F: Fn(usize, &T) -> Result<(), E> + Sync,
    {
        if self.workers == 0 {
            return Err(FuzzkitError::ReplayUnavailable(
                "worker pool configured with zero workers".to_string(),
            ));
        }
        if items.is_empty() {
            return Ok(PoolOutcome::default());
        }

        let next = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let halted = AtomicBool::new(false);
        let workers = self.workers.min(items.len());

        thread::scope(|scope| -> Result<(), FuzzkitError> {
            for worker in 0..workers {
                let (next, succeeded, failed, halted, job) =
                    (&next, &succeeded, &failed, &halted, &job);
                let halt = self.halt;

                thread::Builder::new()
                    .name(format!("replay-{worker}"))
                    .spawn_scoped(scope, move || loop {
                        if halted.load(Ordering::SeqCst) {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(item) = items.get(index) else {
                            break;
                        };

                        match job(worker, item) {
                            Ok(()) => {
                                succeeded.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(err) => {
                                tracing::debug!(worker, ?item, error = %err, "job failed");
                                failed.fetch_add(1, Ordering::SeqCst);
                                if halt == HaltPolicy::OnFirstFailure {
                                    halted.store(true, Ordering::SeqCst);
                                }
                            }
                        }
                    })
                    .map_err(|source| {
                        // Workers already running drain the queue on their own.
                        halted.store(true, Ordering::SeqCst);
                        FuzzkitError::ReplayUnavailable(format!(
                            "failed to spawn worker {worker}: {source}"
                        ))
                    })?;
            }
            Ok(())
        })?;

        let succeeded = succeeded.into_inner();
        let failed = failed.into_inner();
        Ok(PoolOutcome {
            succeeded,
            failed,
            skipped: items.len() - succeeded - failed,
        })
    }
}
