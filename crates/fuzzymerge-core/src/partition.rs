//! Left-table partitioning
//!
//! Splits `0..len` into contiguous, ordered, non-overlapping row ranges whose
//! concatenation is exactly `0..len`. Pure function of `(len, k)`.

use std::ops::Range;

/// Split `len` rows into `min(k, len)` contiguous chunks.
///
/// Chunk sizes differ by at most one; the larger chunks come first. `k == 0`
/// is treated as a single chunk. An empty table yields no chunks.
pub fn partition(len: usize, k: usize) -> Vec<Range<usize>> {
    let k = k.max(1).min(len);
    if k == 0 {
        return Vec::new();
    }

    let base = len / k;
    let extra = len % k;
    let mut ranges = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    debug_assert_eq!(start, len);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flatten(ranges: &[Range<usize>]) -> Vec<usize> {
        ranges.iter().cloned().flatten().collect()
    }

    #[test]
    fn test_even_split() {
        assert_eq!(partition(6, 3), vec![0..2, 2..4, 4..6]);
    }

    #[test]
    fn test_uneven_split_front_loads() {
        assert_eq!(partition(7, 3), vec![0..3, 3..5, 5..7]);
    }

    #[test]
    fn test_more_chunks_than_rows() {
        let ranges = partition(3, 8);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
        assert!(ranges.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn test_zero_chunks_means_one() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_empty_table() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_concatenation_reproduces_order() {
        for len in 0..40 {
            for k in 0..12 {
                let ranges = partition(len, k);
                assert_eq!(flatten(&ranges), (0..len).collect::<Vec<_>>(), "len={} k={}", len, k);
                let sizes: Vec<_> = ranges.iter().map(|r| r.len()).collect();
                if let (Some(max), Some(min)) = (sizes.iter().max(), sizes.iter().min()) {
                    assert!(max - min <= 1);
                }
            }
        }
    }
}
