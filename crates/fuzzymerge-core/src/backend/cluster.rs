//! Distributed backend over an injected cluster handle
//!
//! The engine never creates, sizes, or tears down a cluster. It asks the
//! handle for its worker count, submits one task per chunk, and blocks on a
//! gather of every task future. Futures are awaited in chunk order, so the
//! result order never depends on which worker finished first. When the gather
//! fails or times out, the tasks' shared cancel flag is raised so work still
//! running on the cluster stops at its next check.

use crate::error::{ExecutionError, MergeError, Result, TaskError};
use crate::executor::{ChunkMatches, ChunkTask};
use crate::tracing::prefix;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What a finished task yields: the chunk's matches or the merge error the
/// chunk raised (e.g. a scorer failure).
pub type TaskOutcome = Result<ChunkMatches>;

/// Future for one submitted task. The outer error is a cluster-level fault
/// (lost worker, cancelled task, panic), reported as `ExecutionError::TaskFailed`.
pub type TaskHandle =
    Pin<Box<dyn Future<Output = std::result::Result<TaskOutcome, TaskError>> + Send + 'static>>;

/// An external execution resource
///
/// Implementations only need to run [`ChunkTask::run`] somewhere and hand
/// back its outcome. Lifecycle and capacity discovery stay with the caller.
pub trait Cluster: Send + Sync + Debug {
    /// Workers currently available; drives the chunk count.
    fn worker_count(&self) -> usize;

    /// Start a task and return a future for its outcome.
    fn submit(&self, task: ChunkTask) -> TaskHandle;
}

/// Shared cluster handle, as stored in the merge configuration
pub type SharedCluster = Arc<dyn Cluster>;

/// In-process cluster backed by a tokio runtime.
///
/// Each task runs on the runtime's blocking pool, capped at `workers`
/// concurrent tasks. Drop it outside of any async context.
#[derive(Debug)]
pub struct LocalCluster {
    runtime: tokio::runtime::Runtime,
    workers: usize,
}

impl LocalCluster {
    pub fn new(workers: usize) -> std::io::Result<Self> {
        let workers = workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("fuzzymerge-cluster")
            .enable_all()
            .build()?;
        info!("{} Local cluster started with {} workers", prefix::CLUSTER, workers);
        Ok(Self { runtime, workers })
    }

    /// One worker per available core.
    pub fn with_available_parallelism() -> std::io::Result<Self> {
        Self::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        )
    }
}

impl Cluster for LocalCluster {
    fn worker_count(&self) -> usize {
        self.workers
    }

    fn submit(&self, task: ChunkTask) -> TaskHandle {
        let handle = self.runtime.spawn_blocking(move || task.run());
        Box::pin(async move { handle.await.map_err(|e| Box::new(e) as TaskError) })
    }
}

/// Submit every task and gather outcomes in chunk order.
pub(super) fn run(
    cluster: &dyn Cluster,
    tasks: Vec<ChunkTask>,
    timeout: Option<Duration>,
) -> Result<Vec<ChunkMatches>> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ExecutionError::NestedRuntime.into());
    }
    let expected = tasks.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(ExecutionError::Runtime)?;

    info!(
        "{} Submitting {} chunks to cluster ({} workers)",
        prefix::CLUSTER,
        expected,
        cluster.worker_count()
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let gathered = runtime.block_on(async {
        let handles: Vec<(usize, TaskHandle)> = tasks
            .into_iter()
            .map(|task| (task.index(), cluster.submit(task.with_cancel(cancel.clone()))))
            .collect();

        let gather = async move {
            let mut results = Vec::with_capacity(expected);
            for (chunk, handle) in handles {
                let outcome = handle
                    .await
                    .map_err(|source| ExecutionError::TaskFailed { chunk, source })?;
                let result = outcome?;
                debug!("{} Chunk {} gathered ({} rows)", prefix::CLUSTER, chunk, result.len());
                results.push(result);
            }
            Ok::<_, MergeError>(results)
        };

        match timeout {
            Some(budget) => match tokio::time::timeout(budget, gather).await {
                Ok(gathered) => gathered,
                Err(_) => Err(ExecutionError::Timeout(budget).into()),
            },
            None => gather.await,
        }
    });

    if let Err(e) = &gathered {
        cancel.store(true, Ordering::Relaxed);
        debug!("{} Cancelling outstanding chunks: {}", prefix::CLUSTER, e);
    }
    gathered
}
