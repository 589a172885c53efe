//! Local worker pool backend
//!
//! With the `parallel` feature, chunks run on a dedicated rayon pool sized to
//! the configured worker count, capped at the chunk count. Each worker reports
//! `(chunk index, outcome)` over a channel and the gatherer slots results by
//! index. A failed or timed-out gather cancels the chunks still running.
//! Without the feature, chunks run one after another in the calling thread.

use crate::error::{ExecutionError, MergeError, Result};
use crate::executor::{ChunkMatches, ChunkTask};
use std::time::Duration;

#[cfg(feature = "parallel")]
pub(super) fn run(
    tasks: Vec<ChunkTask>,
    workers: usize,
    timeout: Option<Duration>,
) -> Result<Vec<ChunkMatches>> {
    use crate::tracing::prefix;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Arc};
    use tracing::{debug, info};

    let expected = tasks.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(pool_size(workers, expected))
        .thread_name(|i| format!("fuzzymerge-worker-{}", i))
        .build()
        .map_err(ExecutionError::from)?;
    info!(
        "{} Dispatching {} chunks to {} workers",
        prefix::POOL,
        expected,
        pool.current_num_threads()
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<Report>();
    for task in tasks {
        let task = task.with_cancel(cancel.clone());
        let tx = tx.clone();
        pool.spawn(move || {
            let index = task.index();
            let outcome = catch_unwind(AssertUnwindSafe(move || task.run()));
            // Receiver gone means the merge already failed
            let _ = tx.send((index, outcome));
        });
    }
    drop(tx);

    let gathered = gather(&rx, expected, timeout);
    if let Err(e) = &gathered {
        cancel.store(true, Ordering::Relaxed);
        debug!("{} Cancelling outstanding chunks: {}", prefix::POOL, e);
    }
    gathered
}

/// What a worker sends back: chunk index and the caught task outcome
#[cfg(feature = "parallel")]
type Report = (usize, std::thread::Result<Result<ChunkMatches>>);

/// Threads worth starting: never more than there are chunks to run.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
pub(super) fn pool_size(workers: usize, chunks: usize) -> usize {
    workers.min(chunks).max(1)
}

#[cfg(feature = "parallel")]
fn gather(
    rx: &std::sync::mpsc::Receiver<Report>,
    expected: usize,
    timeout: Option<Duration>,
) -> Result<Vec<ChunkMatches>> {
    use super::panic_message;
    use crate::tracing::prefix;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Instant;
    use tracing::debug;

    let deadline = timeout.map(|t| (t, Instant::now() + t));
    let mut slots: Vec<Option<ChunkMatches>> = (0..expected).map(|_| None).collect();
    for received in 0..expected {
        let message = match deadline {
            Some((budget, at)) => {
                rx.recv_timeout(at.saturating_duration_since(Instant::now()))
                    .map_err(|e| match e {
                        RecvTimeoutError::Timeout => ExecutionError::Timeout(budget),
                        RecvTimeoutError::Disconnected => {
                            ExecutionError::WorkerLost { received, expected }
                        }
                    })?
            }
            None => rx
                .recv()
                .map_err(|_| ExecutionError::WorkerLost { received, expected })?,
        };

        let (index, outcome) = message;
        let result = outcome.map_err(|payload| ExecutionError::WorkerPanicked {
            chunk: index,
            message: panic_message(payload.as_ref()),
        })??;
        debug!("{} Chunk {} done ({} rows)", prefix::POOL, index, result.len());
        match slots.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(result),
            _ => {
                return Err(ExecutionError::UnknownChunk {
                    chunk: index,
                    chunks: expected,
                }
                .into())
            }
        }
    }

    collect_slots(slots)
}

#[cfg(not(feature = "parallel"))]
pub(super) fn run(
    tasks: Vec<ChunkTask>,
    workers: usize,
    _timeout: Option<Duration>,
) -> Result<Vec<ChunkMatches>> {
    tracing::warn!(
        "{} Built without the `parallel` feature; running {} chunks sequentially instead of on {} workers",
        crate::tracing::prefix::POOL,
        tasks.len(),
        workers
    );
    tasks.into_iter().map(ChunkTask::run).collect()
}

/// Unwrap index-addressed slots, failing if any chunk never reported.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
pub(super) fn collect_slots(slots: Vec<Option<ChunkMatches>>) -> Result<Vec<ChunkMatches>> {
    let expected = slots.len();
    slots
        .into_iter()
        .enumerate()
        .map(|(received, slot)| {
            slot.ok_or_else(|| MergeError::from(ExecutionError::WorkerLost { received, expected }))
        })
        .collect()
}
