//! Result aggregation
//!
//! Stitches chunk outcomes back into left-row order, applies the join
//! semantics, and assembles the merged table:
//!
//! - `inner`: matched left rows, each followed by its best right row
//! - `left`: every left row; right columns null when unmatched
//! - `outer`: `left`, then every right row nobody selected, left columns null
//!
//! Column names present on both sides get the configured suffixes.

use crate::config::{JoinHow, MergeConfig};
use crate::error::{ExecutionError, Result, TableError};
use crate::executor::{ChunkMatches, MatchCandidate};
use crate::table::{Column, Table, Value};
use ahash::AHashSet;

/// Flatten chunk outcomes into one entry per left row.
///
/// Chunks must arrive in index order and tile `0..left_rows` exactly.
pub fn concat_chunks(chunks: Vec<ChunkMatches>, left_rows: usize) -> Result<Vec<Option<MatchCandidate>>> {
    let mut rows = Vec::with_capacity(left_rows);
    for (position, chunk) in chunks.into_iter().enumerate() {
        if chunk.index() != position || chunk.offset() != rows.len() {
            return Err(ExecutionError::ChunkOrder {
                chunk: chunk.index(),
                expected: rows.len(),
                actual: chunk.offset(),
            }
            .into());
        }
        rows.extend(chunk.into_matches());
    }
    if rows.len() != left_rows {
        return Err(ExecutionError::ChunkOrder {
            chunk: usize::MAX,
            expected: left_rows,
            actual: rows.len(),
        }
        .into());
    }
    Ok(rows)
}

/// Row gather plan for the output table
#[derive(Debug, Default, PartialEq)]
struct Plan {
    left: Vec<Option<usize>>,
    right: Vec<Option<usize>>,
    scores: Vec<Option<f64>>,
}

impl Plan {
    fn push(&mut self, left: Option<usize>, right: Option<usize>, score: Option<f64>) {
        self.left.push(left);
        self.right.push(right);
        self.scores.push(score);
    }
}

fn plan(matches: &[Option<MatchCandidate>], right_rows: usize, how: JoinHow) -> Result<Plan> {
    let mut plan = Plan::default();
    for (left_row, candidate) in matches.iter().enumerate() {
        match (candidate, how) {
            (Some(m), _) => plan.push(Some(left_row), Some(m.right_row), Some(m.score)),
            (None, JoinHow::Inner) => {}
            (None, JoinHow::Left | JoinHow::Outer) => plan.push(Some(left_row), None, None),
        }
    }

    if how == JoinHow::Outer {
        let mut selected = vec![false; right_rows];
        for m in matches.iter().flatten() {
            match selected.get_mut(m.right_row) {
                Some(s) => *s = true,
                None => {
                    return Err(TableError::RowOutOfBounds {
                        index: m.right_row,
                        len: right_rows,
                    }
                    .into())
                }
            }
        }
        for (right_row, _) in selected.iter().enumerate().filter(|(_, s)| !**s) {
            plan.push(None, Some(right_row), None);
        }
    }
    Ok(plan)
}

/// Assemble the merged table.
pub fn aggregate(
    left: &Table,
    right: &Table,
    matches: &[Option<MatchCandidate>],
    config: &MergeConfig,
) -> Result<Table> {
    let plan = plan(matches, right.num_rows(), config.how())?;

    let left_names: AHashSet<&str> = left.column_names().into_iter().collect();
    let right_names: AHashSet<&str> = right.column_names().into_iter().collect();
    let (left_suffix, right_suffix) = config.suffixes();

    let left_part = left.take(&plan.left)?.rename_with(|name| {
        if right_names.contains(name) {
            format!("{}{}", name, left_suffix)
        } else {
            name.to_string()
        }
    })?;
    let right_part = right.take(&plan.right)?.rename_with(|name| {
        if left_names.contains(name) {
            format!("{}{}", name, right_suffix)
        } else {
            name.to_string()
        }
    })?;

    let mut merged = left_part.hconcat(right_part)?;
    if let Some(score_column) = config.score_column() {
        let scores = plan.scores.iter().map(|s| Value::from(*s)).collect();
        merged = merged.with_column(Column::new(score_column, scores))?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use pretty_assertions::assert_eq;

    fn candidate(left_row: usize, right_row: usize, score: f64) -> Option<MatchCandidate> {
        Some(MatchCandidate {
            left_row,
            right_row,
            score,
        })
    }

    fn tables() -> (Table, Table) {
        let left = Table::from_columns(vec![
            ("id", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            ("name", vec!["plot".into(), "two".into(), "teen".into()]),
        ])
        .unwrap();
        let right = Table::from_columns(vec![
            ("id", vec![Value::Int(10), Value::Int(20)]),
            ("label", vec!["plots".into(), "teenage".into()]),
        ])
        .unwrap();
        (left, right)
    }

    fn config(how: &str) -> MergeConfig {
        let mut c = MergeConfig::new("name", "label");
        c.set_parameter("how", how).unwrap();
        c
    }

    #[test]
    fn test_inner_keeps_matched_only() {
        let (left, right) = tables();
        let matches = vec![candidate(0, 0, 0.9), None, candidate(2, 1, 0.8)];
        let out = aggregate(&left, &right, &matches, &config("inner")).unwrap();
        assert_eq!(out.column_names(), vec!["id_x", "name", "id_y", "label"]);
        assert_eq!(out.num_rows(), 2);
        assert_eq!(
            out.column("label").unwrap().values(),
            &[Value::from("plots"), Value::from("teenage")]
        );
    }

    #[test]
    fn test_left_null_fills() {
        let (left, right) = tables();
        let matches = vec![candidate(0, 0, 0.9), None, None];
        let out = aggregate(&left, &right, &matches, &config("left")).unwrap();
        assert_eq!(out.num_rows(), 3);
        assert_eq!(
            out.column("id_y").unwrap().values(),
            &[Value::Int(10), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_outer_appends_unselected_right_rows() {
        let (left, right) = tables();
        let matches = vec![None, candidate(1, 1, 0.8), None];
        let out = aggregate(&left, &right, &matches, &config("outer")).unwrap();
        assert_eq!(out.num_rows(), 4);
        let last = out.row(3).unwrap();
        assert_eq!(last.get("name"), Some(&Value::Null));
        assert_eq!(last.get("label"), Some(&Value::from("plots")));
    }

    #[test]
    fn test_outer_right_row_selected_twice_not_repeated() {
        let (left, right) = tables();
        let matches = vec![candidate(0, 0, 0.9), candidate(1, 0, 0.8), None];
        let out = aggregate(&left, &right, &matches, &config("outer")).unwrap();
        // 3 left rows + right row 1
        assert_eq!(out.num_rows(), 4);
        assert_eq!(out.row(3).unwrap().get("id_y"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_unknown_right_row_rejected() {
        let (left, right) = tables();
        let matches = vec![candidate(0, 9, 0.9), None, None];
        for how in ["inner", "left", "outer"] {
            let err = aggregate(&left, &right, &matches, &config(how)).unwrap_err();
            assert_eq!(
                err.to_string(),
                "row index 9 out of bounds for table with 2 rows",
                "how={}",
                how
            );
        }
    }

    #[test]
    fn test_score_column() {
        let (left, right) = tables();
        let mut c = config("left");
        c.set_parameter("score_column", "similarity").unwrap();
        let matches = vec![candidate(0, 0, 0.9), None, None];
        let out = aggregate(&left, &right, &matches, &c).unwrap();
        assert_eq!(
            out.column("similarity").unwrap().values(),
            &[Value::Float(0.9), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_score_column_collision() {
        let (left, right) = tables();
        let mut c = config("inner");
        c.set_parameter("score_column", "label").unwrap();
        let err = aggregate(&left, &right, &[None, None, None], &c).unwrap_err();
        assert!(matches!(err, MergeError::Table(TableError::DuplicateColumn(_))));
    }

    #[test]
    fn test_concat_chunks_checks_tiling() {
        let task = |index, offset, left: Vec<Option<String>>| {
            crate::executor::ChunkTask::new(
                index,
                offset,
                left,
                std::sync::Arc::new(crate::executor::KeyColumn::new(vec![Some("a".into())])),
                std::sync::Arc::new(crate::scorer::Metric::default()),
                0.5,
            )
            .run()
            .unwrap()
        };
        let a = task(0, 0, vec![Some("a".into())]);
        let b = task(1, 1, vec![None, Some("a".into())]);

        let rows = concat_chunks(vec![a.clone(), b.clone()], 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].unwrap().left_row, 2);

        assert!(concat_chunks(vec![b.clone(), a.clone()], 3).is_err());
        assert!(concat_chunks(vec![a], 3).is_err());
    }
}
