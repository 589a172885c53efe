//! Candidate scoring
//!
//! A scorer maps a pair of join keys to a similarity in `[0, 1]`, where `1.0`
//! means identical. It is the only place string similarity is computed.
//!
//! # Contract
//!
//! - Deterministic: the same pair always yields the same score
//! - Stateless: safe to call concurrently from every worker
//! - Empty vs non-empty scores `0.0`; empty vs empty scores `1.0`
//! - Symmetry is not required; the engine always calls `score(left, right)`
//!
//! The engine checks every returned score; NaN or out-of-range values abort
//! the merge with [`ScoringError::OutOfRange`].
//!
//! # Example
//!
//! ```rust
//! use fuzzymerge_core::scorer::{Metric, SimilarityScorer};
//!
//! let score = Metric::LevenshteinRatio.score("plot", "plots").unwrap();
//! assert!(score > 0.88 && score < 0.89);
//! ```

mod metrics;

pub use metrics::{indel_ratio, Metric};

use crate::error::ScoringError;
use std::fmt::Debug;
use std::sync::Arc;

/// Pairwise string similarity
pub trait SimilarityScorer: Send + Sync + Debug {
    /// Similarity of `a` (left key) to `b` (right key), in `[0, 1]`.
    fn score(&self, a: &str, b: &str) -> Result<f64, ScoringError>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Shared scorer handle passed to every worker
pub type SharedScorer = Arc<dyn SimilarityScorer>;

/// Score a pair and enforce the `[0, 1]` contract.
pub(crate) fn checked_score(
    scorer: &dyn SimilarityScorer,
    a: &str,
    b: &str,
) -> Result<f64, ScoringError> {
    let score = scorer.score(a, b)?;
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ScoringError::OutOfRange {
            scorer: scorer.name().to_string(),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Constant(f64);

    impl SimilarityScorer for Constant {
        fn score(&self, _a: &str, _b: &str) -> Result<f64, ScoringError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    #[test]
    fn test_checked_score_accepts_bounds() {
        assert_eq!(checked_score(&Constant(0.0), "a", "b"), Ok(0.0));
        assert_eq!(checked_score(&Constant(1.0), "a", "b"), Ok(1.0));
    }

    #[test]
    fn test_checked_score_rejects_out_of_range() {
        let err = checked_score(&Constant(1.5), "a", "b").unwrap_err();
        assert!(matches!(err, ScoringError::OutOfRange { score, .. } if score == 1.5));
    }

    #[test]
    fn test_checked_score_rejects_nan() {
        assert!(checked_score(&Constant(f64::NAN), "a", "b").is_err());
    }
}
