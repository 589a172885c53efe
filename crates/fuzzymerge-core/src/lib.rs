//! FuzzyMerge Core Engine
//!
//! Joins two tables on string similarity between key columns instead of
//! exact equality. Each left row is paired with its single best-scoring right
//! row, accepted when the score reaches the threshold, and the result follows
//! `inner` / `left` / `outer` join semantics.
//!
//! The O(n·m) scoring work is split into ordered chunks of left rows and run
//! on one of three interchangeable backends. Backend choice never changes the
//! result.
//!
//! # Features
//!
//! - `parallel` (default) - rayon worker pool for the multiprocess backend
//!
//! # Example
//!
//! ```rust
//! use fuzzymerge_core::{FuzzyMerge, Table, Value};
//!
//! let left = Table::from_columns(vec![(
//!     "words_left",
//!     vec![Value::from("plot"), Value::from("couples")],
//! )])
//! .unwrap();
//! let right = Table::from_columns(vec![(
//!     "words_right",
//!     vec![Value::from("couple"), Value::from("plots")],
//! )])
//! .unwrap();
//!
//! let mut merge = FuzzyMerge::new(&left, &right, "words_left", "words_right");
//! merge.set_parameter("how", "inner").unwrap();
//! merge.set_parameter("threshold", 0.8).unwrap();
//! merge.set_parameter("parallel", true).unwrap();
//! merge.set_parameter("n_threads", 2).unwrap();
//!
//! let result = merge.merge().unwrap();
//! assert_eq!(result.shape(), (2, 2));
//! assert_eq!(result.row(0).unwrap().get("words_right"), Some(&Value::from("plots")));
//! ```

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod merge;
pub mod partition;
pub mod scorer;
pub mod table;
pub mod tracing;

// Re-export main types at crate root
pub use backend::{Backend, Cluster, LocalCluster, SharedCluster, TaskHandle, TaskOutcome};
pub use config::{JoinHow, MergeConfig, ParamValue, DEFAULT_THRESHOLD};
pub use error::{ExecutionError, MergeError, Result, ScoringError, Side, TableError};
pub use executor::{ChunkMatches, ChunkTask, KeyColumn, MatchCandidate};
pub use merge::FuzzyMerge;
pub use scorer::{Metric, SharedScorer, SimilarityScorer};
pub use table::{Column, Row, Table, Value};
