//! Match executor - best right row per left row
//!
//! A [`ChunkTask`] owns one contiguous slice of left join keys plus shared
//! handles to the right key column and the scorer. Running it is a pure
//! function of those inputs, which is what lets the same task run in the
//! calling thread, on a worker pool, or on an external cluster.
//!
//! # Selection policy
//!
//! - Each left key is scored against the non-missing right keys in row order
//! - The highest score wins; ties go to the lowest right row index
//! - A best score below the threshold leaves the row unmatched (`None`)
//! - Missing left keys are unmatched without calling the scorer
//! - A perfect score (`1.0`) ends the scan for that key. Right keys after it
//!   are never scored, so a scorer failure on one of those pairs is not
//!   reported
//!
//! # Cancellation
//!
//! Tasks carry a shared cancel flag. Backends raise it once a merge has
//! failed or timed out; a running task checks it before every scorer call
//! and stops with [`ExecutionError::Cancelled`].

use crate::error::{ExecutionError, MergeError, Result};
use crate::scorer::{checked_score, SharedScorer};
use ahash::{AHashMap, AHashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An accepted best match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub left_row: usize,
    pub right_row: usize,
    pub score: f64,
}

/// Right-side join keys prepared for scoring.
///
/// Keeps only the first occurrence of each distinct key. A later duplicate
/// can never win under lowest-index tie-breaking, so skipping it does not
/// change any result.
#[derive(Debug, Clone, Default)]
pub struct KeyColumn {
    len: usize,
    distinct: Vec<(String, usize)>,
}

impl KeyColumn {
    pub fn new(keys: Vec<Option<String>>) -> Self {
        let len = keys.len();
        let mut seen = AHashSet::with_capacity(len);
        let mut distinct = Vec::with_capacity(len);
        for (row, key) in keys.into_iter().enumerate() {
            let Some(key) = key else { continue };
            if seen.insert(key.clone()) {
                distinct.push((key, row));
            }
        }
        Self { len, distinct }
    }

    /// Row count of the source column, missing keys included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distinct non-missing keys with their first row, in row order
    pub fn distinct(&self) -> &[(String, usize)] {
        &self.distinct
    }
}

/// One unit of matching work
///
/// A left key's scan stops at the first right key scoring `1.0`. Scorer
/// errors on later pairs of that key are therefore never raised.
#[derive(Debug, Clone)]
pub struct ChunkTask {
    index: usize,
    offset: usize,
    left: Vec<Option<String>>,
    right: Arc<KeyColumn>,
    scorer: SharedScorer,
    threshold: f64,
    cancel: Arc<AtomicBool>,
}

impl ChunkTask {
    pub fn new(
        index: usize,
        offset: usize,
        left: Vec<Option<String>>,
        right: Arc<KeyColumn>,
        scorer: SharedScorer,
        threshold: f64,
    ) -> Self {
        Self {
            index,
            offset,
            left,
            right,
            scorer,
            threshold,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share `cancel` with other tasks of the same merge.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ExecutionError::Cancelled { chunk: self.index }.into());
        }
        Ok(())
    }

    /// Position of this chunk in partition order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Left row index of the chunk's first key
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Score the chunk. Aborts on the first scorer failure or once the
    /// cancel flag is raised.
    pub fn run(self) -> Result<ChunkMatches> {
        // Duplicate left keys within a chunk share one scan
        let mut memo: AHashMap<&str, Option<(usize, f64)>> = AHashMap::new();
        let mut matches = Vec::with_capacity(self.left.len());

        for (i, key) in self.left.iter().enumerate() {
            self.check_cancelled()?;
            let left_row = self.offset + i;
            let best = match key.as_deref() {
                None => None,
                Some(key) => match memo.get(key) {
                    Some(best) => *best,
                    None => {
                        let best = self.best_match(left_row, key)?;
                        memo.insert(key, best);
                        best
                    }
                },
            };
            matches.push(
                best.filter(|&(_, score)| score >= self.threshold)
                    .map(|(right_row, score)| MatchCandidate {
                        left_row,
                        right_row,
                        score,
                    }),
            );
        }

        Ok(ChunkMatches {
            index: self.index,
            offset: self.offset,
            matches,
        })
    }

    fn best_match(&self, left_row: usize, key: &str) -> Result<Option<(usize, f64)>> {
        let mut best: Option<(usize, f64)> = None;
        for (candidate, right_row) in self.right.distinct() {
            self.check_cancelled()?;
            let score = checked_score(self.scorer.as_ref(), key, candidate).map_err(|source| {
                MergeError::Scoring {
                    chunk: self.index,
                    left_row,
                    right_row: *right_row,
                    source,
                }
            })?;
            // Strict comparison keeps the earliest row on ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((*right_row, score));
                if score >= 1.0 {
                    break;
                }
            }
        }
        Ok(best)
    }
}

/// Per-row outcome of one chunk, in left row order
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMatches {
    index: usize,
    offset: usize,
    matches: Vec<Option<MatchCandidate>>,
}

impl ChunkMatches {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[Option<MatchCandidate>] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<Option<MatchCandidate>> {
        self.matches
    }
}
