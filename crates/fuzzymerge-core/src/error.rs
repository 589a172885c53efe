//! Error types for fuzzy merges.
//!
//! Every failure aborts the whole `merge()` call. There is no partial-result
//! mode.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`MergeError`].
pub type Result<T> = std::result::Result<T, MergeError>;

/// Boxed error produced by an external execution resource.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which input table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Top-level error returned by configuration setters and `merge()`.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Unknown option name, wrong value type, or out-of-range value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Configured join column is absent from the table schema
    #[error("join column '{column}' not found in {side} table")]
    MissingKeyColumn { column: String, side: Side },

    /// The similarity scorer failed on a specific pair
    #[error("scoring failed in chunk {chunk} (left row {left_row}, right row {right_row}): {source}")]
    Scoring {
        chunk: usize,
        left_row: usize,
        right_row: usize,
        #[source]
        source: ScoringError,
    },

    /// A backend-level fault: worker crash, task failure, timeout
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Result table could not be assembled
    #[error(transparent)]
    Table(#[from] TableError),
}

impl MergeError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MergeError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a [`SimilarityScorer`](crate::scorer::SimilarityScorer).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// The scorer itself reported a failure
    #[error("scorer '{scorer}' failed: {message}")]
    Failed { scorer: String, message: String },

    /// The scorer returned NaN or a value outside [0, 1]
    #[error("scorer '{scorer}' returned {score}, expected a value in [0, 1]")]
    OutOfRange { scorer: String, score: f64 },
}

/// Backend failures. Always wraps enough context to locate the failing chunk.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Worker pool could not be created
    #[cfg(feature = "parallel")]
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// Async runtime used to gather cluster tasks could not be created
    #[error("failed to start gather runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A worker panicked while processing a chunk
    #[error("worker panicked on chunk {chunk}: {message}")]
    WorkerPanicked { chunk: usize, message: String },

    /// The external execution resource reported a task failure
    #[error("task for chunk {chunk} failed: {source}")]
    TaskFailed {
        chunk: usize,
        #[source]
        source: TaskError,
    },

    /// Workers went away before every chunk reported back
    #[error("lost contact with workers after {received} of {expected} chunks")]
    WorkerLost { received: usize, expected: usize },

    /// The cluster handle reports no workers
    #[error("execution resource reports no workers")]
    NoWorkers,

    /// Gather exceeded the configured wall-clock budget
    #[error("timed out after {0:?} waiting for chunk results")]
    Timeout(Duration),

    /// The merge already failed elsewhere; this chunk stopped early
    #[error("chunk {chunk} cancelled")]
    Cancelled { chunk: usize },

    /// A worker reported a chunk index that was not submitted, or reported
    /// it twice
    #[error("unexpected result for chunk {chunk} of {chunks}")]
    UnknownChunk { chunk: usize, chunks: usize },

    /// A blocking gather was requested from inside an async runtime
    #[error("distributed merge cannot block inside an async runtime; call it from spawn_blocking")]
    NestedRuntime,

    /// Chunk results do not tile the left table
    #[error("chunk {chunk} out of order: expected offset {expected}, got {actual}")]
    ChunkOrder {
        chunk: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors from building or reshaping a [`Table`](crate::table::Table).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Two columns share a name
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A column's length differs from the others
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A row-major input row has the wrong number of cells
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Vertical concatenation of tables with different column counts
    #[error("cannot stack a table with {actual} columns onto one with {expected}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// Column lookup failed
    #[error("column '{0}' not found")]
    UnknownColumn(String),

    /// Row gather referenced a row past the end
    #[error("row index {index} out of bounds for table with {len} rows")]
    RowOutOfBounds { index: usize, len: usize },
}
