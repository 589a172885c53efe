//! Built-in similarity metrics
//!
//! The default metric is the indel ratio, `2 * LCS / (|a| + |b|)`: the
//! normalized complement of the insert/delete edit distance. The remaining
//! metrics delegate to `strsim`.

use super::SimilarityScorer;
use crate::error::ScoringError;
use std::fmt;
use std::str::FromStr;
use strsim::{jaro, jaro_winkler, normalized_damerau_levenshtein, normalized_levenshtein, sorensen_dice};

/// Built-in scorers, selectable by name through the `scorer` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// Indel ratio over chars (symmetric)
    #[default]
    LevenshteinRatio,
    /// `1 - levenshtein / max(|a|, |b|)` (symmetric)
    NormalizedLevenshtein,
    /// Damerau variant allowing adjacent transpositions (symmetric)
    NormalizedDamerauLevenshtein,
    /// Jaro similarity (symmetric)
    Jaro,
    /// Jaro with common-prefix boost, up to 4 chars (symmetric)
    JaroWinkler,
    /// Bigram overlap, whitespace ignored (symmetric)
    SorensenDice,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::LevenshteinRatio,
        Metric::NormalizedLevenshtein,
        Metric::NormalizedDamerauLevenshtein,
        Metric::Jaro,
        Metric::JaroWinkler,
        Metric::SorensenDice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::LevenshteinRatio => "levenshtein_ratio",
            Metric::NormalizedLevenshtein => "normalized_levenshtein",
            Metric::NormalizedDamerauLevenshtein => "normalized_damerau_levenshtein",
            Metric::Jaro => "jaro",
            Metric::JaroWinkler => "jaro_winkler",
            Metric::SorensenDice => "sorensen_dice",
        }
    }

    #[inline]
    fn similarity(&self, a: &str, b: &str) -> f64 {
        match self {
            Metric::LevenshteinRatio => indel_ratio(a, b),
            Metric::NormalizedLevenshtein => normalized_levenshtein(a, b),
            Metric::NormalizedDamerauLevenshtein => normalized_damerau_levenshtein(a, b),
            Metric::Jaro => jaro(a, b),
            Metric::JaroWinkler => jaro_winkler(a, b),
            Metric::SorensenDice => sorensen_dice(a, b),
        }
    }
}

impl SimilarityScorer for Metric {
    fn score(&self, a: &str, b: &str) -> Result<f64, ScoringError> {
        Ok(self.similarity(a, b))
    }

    fn name(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Metric::ALL.iter().map(Metric::as_str).collect();
                format!("unknown scorer '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Indel similarity: `2 * LCS(a, b) / (|a| + |b|)` over chars.
///
/// Two empty strings are identical (`1.0`); empty vs non-empty is `0.0`.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Two-row LCS table over the shorter string
    let (outer, inner) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];
    for &x in outer.iter() {
        for (j, &y) in inner.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[inner.len()];

    (2 * lcs) as f64 / total as f64
}
