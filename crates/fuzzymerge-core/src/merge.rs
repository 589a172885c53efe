//! Merge entry point
//!
//! [`FuzzyMerge`] borrows the two input tables, owns a [`MergeConfig`], and
//! runs partition → dispatch → aggregate on [`FuzzyMerge::merge`]. The
//! configuration can only change through `&mut self`, so it is frozen for
//! the duration of a merge.

use crate::aggregate::{aggregate, concat_chunks};
use crate::backend::Backend;
use crate::config::{MergeConfig, ParamValue};
use crate::error::{MergeError, Result, Side};
use crate::executor::{ChunkTask, KeyColumn};
use crate::partition::partition;
use crate::table::Table;
use crate::tracing::prefix;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A configured fuzzy join between two tables
#[derive(Debug, Clone)]
pub struct FuzzyMerge<'a> {
    left: &'a Table,
    right: &'a Table,
    config: MergeConfig,
}

impl<'a> FuzzyMerge<'a> {
    /// Join `left.left_on` against `right.right_on` with default options.
    pub fn new(
        left: &'a Table,
        right: &'a Table,
        left_on: impl Into<String>,
        right_on: impl Into<String>,
    ) -> Self {
        Self::with_config(left, right, MergeConfig::new(left_on, right_on))
    }

    pub fn with_config(left: &'a Table, right: &'a Table, config: MergeConfig) -> Self {
        Self {
            left,
            right,
            config,
        }
    }

    /// Set one option by name. See [`crate::config`] for the recognized set.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.config.set_parameter(name, value)
    }

    /// Apply a JSON object of options.
    pub fn configure(&mut self, options: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
        self.config.configure(options)
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run the merge and return a newly built table.
    ///
    /// Blocks until every chunk is scored. Any failure aborts the whole
    /// merge; no partial result is ever returned.
    pub fn merge(&self) -> Result<Table> {
        let config = &self.config;
        let started = Instant::now();

        let left_keys = key_column(self.left, config.left_on(), Side::Left)?;
        let right_keys = key_column(self.right, config.right_on(), Side::Right)?;

        let backend = Backend::from_config(config);
        let ranges = partition(self.left.num_rows(), backend.chunk_count(config.num_batches())?);
        info!(
            "{} Fuzzy merge {} x {} rows: how={}, threshold={}, scorer={}, backend={}, chunks={}",
            prefix::MERGE,
            self.left.num_rows(),
            self.right.num_rows(),
            config.how(),
            config.threshold(),
            config.scorer().name(),
            backend,
            ranges.len()
        );

        let right = Arc::new(KeyColumn::new(right_keys));
        debug!(
            "{} Right keys: {} rows, {} distinct",
            prefix::MERGE,
            right.len(),
            right.distinct().len()
        );

        let mut left_keys = left_keys.into_iter();
        let tasks: Vec<ChunkTask> = ranges
            .into_iter()
            .enumerate()
            .map(|(index, range)| {
                ChunkTask::new(
                    index,
                    range.start,
                    left_keys.by_ref().take(range.len()).collect(),
                    right.clone(),
                    config.scorer().clone(),
                    config.threshold(),
                )
            })
            .collect();

        let chunks = backend.map_chunks(tasks, config.timeout())?;
        let matches = concat_chunks(chunks, self.left.num_rows())?;
        let merged = aggregate(self.left, self.right, &matches, config)?;

        info!(
            "{} Fuzzy merge done: {} of {} left rows matched, {} rows out in {:?}",
            prefix::MERGE,
            matches.iter().flatten().count(),
            self.left.num_rows(),
            merged.num_rows(),
            started.elapsed()
        );
        Ok(merged)
    }
}

fn key_column(table: &Table, name: &str, side: Side) -> Result<Vec<Option<String>>> {
    table
        .column(name)
        .map(|c| c.keys())
        .ok_or_else(|| MergeError::MissingKeyColumn {
            column: name.to_string(),
            side,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use pretty_assertions::assert_eq;

    fn words(name: &str, words: &[&str]) -> Table {
        Table::from_columns(vec![(name, words.iter().map(|w| Value::from(*w)).collect())]).unwrap()
    }

    #[test]
    fn test_missing_left_column() {
        let left = words("a", &["x"]);
        let right = words("b", &["x"]);
        let err = FuzzyMerge::new(&left, &right, "nope", "b").merge().unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingKeyColumn { ref column, side: Side::Left } if column == "nope"
        ));
    }

    #[test]
    fn test_missing_right_column() {
        let left = words("a", &["x"]);
        let right = words("b", &["x"]);
        let err = FuzzyMerge::new(&left, &right, "a", "nope").merge().unwrap_err();
        assert!(matches!(err, MergeError::MissingKeyColumn { side: Side::Right, .. }));
    }

    #[test]
    fn test_inputs_untouched() {
        let left = words("a", &["plot", "two"]);
        let right = words("b", &["plots"]);
        let before = (left.clone(), right.clone());
        let mut merge = FuzzyMerge::new(&left, &right, "a", "b");
        merge.set_parameter("how", "outer").unwrap();
        merge.merge().unwrap();
        assert_eq!((left, right), before);
    }

    #[test]
    fn test_empty_left_table() {
        let left = words("a", &[]);
        let right = words("b", &["plots", "too"]);
        let mut merge = FuzzyMerge::new(&left, &right, "a", "b");
        assert_eq!(merge.merge().unwrap().num_rows(), 0);
        merge.set_parameter("how", "outer").unwrap();
        assert_eq!(merge.merge().unwrap().num_rows(), 2);
    }

    #[test]
    fn test_same_column_name_on_both_sides() {
        let left = words("word", &["plot"]);
        let right = words("word", &["plots"]);
        let out = FuzzyMerge::new(&left, &right, "word", "word").merge().unwrap();
        assert_eq!(out.column_names(), vec!["word_x", "word_y"]);
    }
}
