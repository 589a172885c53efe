//! Execution backends
//!
//! A backend maps the pure [`ChunkTask::run`] over every chunk and returns
//! the results in chunk order. The three variants differ only in where the
//! tasks run:
//!
//! - **Sequential**: in the calling thread, one chunk
//! - **Multiprocess**: on a fixed-size local worker pool
//! - **Distributed**: on an injected [`Cluster`]
//!
//! Reassembly is always by chunk index, never by completion order, so every
//! backend yields identical matches for identical inputs.

mod cluster;
mod pool;

pub use cluster::{Cluster, LocalCluster, SharedCluster, TaskHandle, TaskOutcome};

use crate::config::MergeConfig;
use crate::error::{ExecutionError, Result};
use crate::executor::{ChunkMatches, ChunkTask};
use crate::tracing::prefix;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Execution strategy resolved from the configuration
#[derive(Debug, Clone)]
pub enum Backend {
    Sequential,
    Multiprocess { workers: usize },
    Distributed { cluster: SharedCluster },
}

impl Backend {
    /// `parallel == false` runs sequentially; otherwise a configured cluster
    /// wins over the local pool.
    pub fn from_config(config: &MergeConfig) -> Self {
        match (config.parallel(), config.cluster()) {
            (false, _) => Backend::Sequential,
            (true, Some(cluster)) => Backend::Distributed {
                cluster: cluster.clone(),
            },
            (true, None) => Backend::Multiprocess {
                workers: config.resolved_workers(),
            },
        }
    }

    /// Number of chunks to cut, before capping at the row count.
    pub fn chunk_count(&self, num_batches: Option<usize>) -> Result<usize> {
        let count = match self {
            Backend::Sequential => 1,
            Backend::Multiprocess { workers } => num_batches.unwrap_or(*workers),
            Backend::Distributed { cluster } => match cluster.worker_count() {
                0 => return Err(ExecutionError::NoWorkers.into()),
                workers => num_batches.unwrap_or(workers),
            },
        };
        Ok(count.max(1))
    }

    /// Run every task and return results ordered by chunk index.
    ///
    /// `timeout` bounds the gather for the pool and cluster backends; the
    /// sequential backend runs to completion.
    pub fn map_chunks(
        &self,
        tasks: Vec<ChunkTask>,
        timeout: Option<Duration>,
    ) -> Result<Vec<ChunkMatches>> {
        match self {
            Backend::Sequential => tasks
                .into_iter()
                .map(|task| {
                    let index = task.index();
                    let result = task.run()?;
                    debug!("{} Chunk {} scored ({} rows)", prefix::MERGE, index, result.len());
                    Ok(result)
                })
                .collect(),
            Backend::Multiprocess { workers } => pool::run(tasks, *workers, timeout),
            Backend::Distributed { cluster } => cluster::run(cluster.as_ref(), tasks, timeout),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sequential => f.write_str("sequential"),
            Backend::Multiprocess { workers } => write!(f, "multiprocess({} workers)", workers),
            Backend::Distributed { cluster } => {
                write!(f, "distributed({} workers)", cluster.worker_count())
            }
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
