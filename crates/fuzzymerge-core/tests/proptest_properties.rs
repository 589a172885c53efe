//! Property-based tests for the merge engine.
//!
//! Inputs are short words over a tiny alphabet so near-duplicates, exact
//! duplicates and ties are common. Every property must hold regardless of
//! backend or chunking.

use proptest::prelude::*;

use fuzzymerge_core::partition::partition;
use fuzzymerge_core::{FuzzyMerge, LocalCluster, ParamValue, SharedCluster, Table, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

// ---------------------------------------------------------------------------
// Strategy generators
// ---------------------------------------------------------------------------

/// A key cell: mostly short words, sometimes missing.
fn arb_key() -> impl Strategy<Value = Value> {
    prop_oneof![
        6 => "[abc]{0,4}".prop_map(Value::from),
        1 => Just(Value::Null),
    ]
}

fn arb_table(name: &'static str, max_len: usize) -> impl Strategy<Value = Table> {
    proptest::collection::vec(arb_key(), 0..=max_len).prop_map(move |keys| {
        let ids = (0..keys.len() as i64).map(Value::Int).collect();
        Table::from_columns(vec![(name, keys), ("id", ids)]).unwrap_or_default()
    })
}

fn arb_table_pair(max_len: usize) -> impl Strategy<Value = (Table, Table)> {
    (arb_table("key_l", max_len), arb_table("key_r", max_len))
}

fn arb_how() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("inner"), Just("left"), Just("outer")]
}

fn shared_cluster() -> SharedCluster {
    static CLUSTER: OnceLock<SharedCluster> = OnceLock::new();
    CLUSTER
        .get_or_init(|| Arc::new(LocalCluster::new(3).unwrap()))
        .clone()
}

fn merge_with(
    left: &Table,
    right: &Table,
    how: &str,
    threshold: f64,
    params: Vec<(&str, ParamValue)>,
) -> Table {
    let mut fm = FuzzyMerge::new(left, right, "key_l", "key_r");
    fm.set_parameter("how", how).unwrap();
    fm.set_parameter("threshold", threshold).unwrap();
    fm.set_parameter("score_column", "score").unwrap();
    for (name, value) in params {
        fm.set_parameter(name, value).unwrap();
    }
    fm.merge().unwrap()
}

fn matched_ids(table: &Table, column: &str) -> BTreeSet<i64> {
    table
        .column(column)
        .unwrap()
        .values()
        .iter()
        .filter_map(|v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_partition_tiles_rows(len in 0usize..200, k in 0usize..40) {
        let ranges = partition(len, k);
        prop_assert_eq!(ranges.len(), k.max(1).min(len));
        let mut next = 0;
        for r in &ranges {
            prop_assert_eq!(r.start, next);
            prop_assert!(!r.is_empty());
            next = r.end;
        }
        prop_assert_eq!(next, len);
    }

    #[test]
    fn prop_partition_is_balanced(len in 1usize..200, k in 1usize..40) {
        let sizes: Vec<usize> = partition(len, k).iter().map(|r| r.len()).collect();
        let max = sizes.iter().max().copied().unwrap_or(0);
        let min = sizes.iter().min().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }
}

// ---------------------------------------------------------------------------
// Merge invariants
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_backends_agree(
        (left, right) in arb_table_pair(14),
        how in arb_how(),
        threshold in 0.0f64..=1.0,
        n_threads in 1i64..6,
    ) {
        let sequential = merge_with(&left, &right, how, threshold, vec![]);
        let pooled = merge_with(&left, &right, how, threshold, vec![
            ("parallel", true.into()),
            ("n_threads", n_threads.into()),
        ]);
        let distributed = merge_with(&left, &right, how, threshold, vec![
            ("parallel", true.into()),
            ("dask_client", shared_cluster().into()),
        ]);
        prop_assert_eq!(&pooled, &sequential);
        prop_assert_eq!(&distributed, &sequential);
    }

    #[test]
    fn prop_chunking_is_transparent(
        (left, right) in arb_table_pair(14),
        num_batches in 1i64..30,
    ) {
        let one = merge_with(&left, &right, "left", 0.5, vec![
            ("parallel", true.into()),
            ("num_batches", 1i64.into()),
        ]);
        let many = merge_with(&left, &right, "left", 0.5, vec![
            ("parallel", true.into()),
            ("num_batches", num_batches.into()),
        ]);
        prop_assert_eq!(many, one);
    }

    #[test]
    fn prop_row_counts((left, right) in arb_table_pair(14), threshold in 0.0f64..=1.0) {
        let left_join = merge_with(&left, &right, "left", threshold, vec![]);
        let inner = merge_with(&left, &right, "inner", threshold, vec![]);
        let outer = merge_with(&left, &right, "outer", threshold, vec![]);

        prop_assert_eq!(left_join.num_rows(), left.num_rows());
        prop_assert!(inner.num_rows() <= left.num_rows());

        let selected = matched_ids(&inner, "id_y");
        prop_assert!(selected.len() <= right.num_rows());
        prop_assert_eq!(
            outer.num_rows(),
            left.num_rows() + right.num_rows() - selected.len()
        );
    }

    #[test]
    fn prop_scores_meet_threshold((left, right) in arb_table_pair(14), threshold in 0.0f64..=1.0) {
        let inner = merge_with(&left, &right, "inner", threshold, vec![]);
        for score in inner.column("score").unwrap().values() {
            let score = score.as_f64().unwrap();
            prop_assert!(score >= threshold && score <= 1.0);
        }
        for row in inner.rows() {
            prop_assert!(!row.get("key_l").unwrap().is_null());
            prop_assert!(!row.get("key_r").unwrap().is_null());
        }
    }

    #[test]
    fn prop_threshold_monotonic(
        (left, right) in arb_table_pair(14),
        low in 0.0f64..=1.0,
        delta in 0.0f64..=1.0,
    ) {
        let high = (low + delta).min(1.0);
        let loose = matched_ids(&merge_with(&left, &right, "inner", low, vec![]), "id_x");
        let strict = matched_ids(&merge_with(&left, &right, "inner", high, vec![]), "id_x");
        prop_assert!(strict.is_subset(&loose));
    }
}
