//! Minimal columnar table
//!
//! Inputs and results of a merge. Storage is column-major; rows are views
//! produced on demand. The engine only needs column projection, row gather,
//! and horizontal/vertical concatenation.
//!
//! # Example
//!
//! ```rust
//! use fuzzymerge_core::table::{Table, Value};
//!
//! let table = Table::from_columns(vec![
//!     ("word", vec![Value::from("plot"), Value::from("two")]),
//!     ("n", vec![Value::Int(1), Value::Int(2)]),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.shape(), (2, 2));
//! assert_eq!(table.row(1).unwrap().get("word"), Some(&Value::from("two")));
//! ```

mod value;

pub use value::Value;

use crate::error::TableError;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// A named column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Join keys for every row, `None` where the key is missing
    pub fn keys(&self) -> Vec<Option<String>> {
        self.values.iter().map(Value::as_key).collect()
    }
}

/// Ordered rows over uniquely named, equal-length columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Build a table, validating unique names and equal lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = AHashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != num_rows {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: num_rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Vec<Value>)>) -> Result<Self, TableError> {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Build a table from row-major data.
    pub fn from_rows<N: Into<String>>(
        names: Vec<N>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, TableError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut columns: Vec<Vec<Value>> = names.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(TableError::RowWidth {
                    row: index,
                    expected: names.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Self::new(
            names
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Project onto the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Table::new(columns)
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.num_rows).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.num_rows).map(move |index| Row { table: self, index })
    }

    /// Gather rows by index. `None` produces an all-null row.
    pub fn take(&self, indices: &[Option<usize>]) -> Result<Table, TableError> {
        if let Some(&index) = indices.iter().flatten().find(|&&i| i >= self.num_rows) {
            return Err(TableError::RowOutOfBounds {
                index,
                len: self.num_rows,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let values = indices
                    .iter()
                    .map(|idx| idx.map(|i| column.values[i].clone()).unwrap_or(Value::Null))
                    .collect();
                Column::new(column.name.clone(), values)
            })
            .collect();
        Ok(Table {
            columns,
            num_rows: indices.len(),
        })
    }

    /// Rename columns through `f`, keeping values.
    pub fn rename_with(&self, mut f: impl FnMut(&str) -> String) -> Result<Table, TableError> {
        Table::new(
            self.columns
                .iter()
                .map(|c| Column::new(f(&c.name), c.values.clone()))
                .collect(),
        )
    }

    /// Place `other`'s columns to the right of this table's.
    pub fn hconcat(mut self, other: Table) -> Result<Table, TableError> {
        if self.columns.is_empty() {
            return Ok(other);
        }
        if other.columns.is_empty() {
            return Ok(self);
        }
        self.columns.extend(other.columns);
        Table::new(self.columns)
    }

    /// Append `other`'s rows below this table's. Schemas must match by name
    /// and order.
    pub fn vconcat(mut self, other: Table) -> Result<Table, TableError> {
        if self.columns.is_empty() {
            return Ok(other);
        }
        if self.columns.len() != other.columns.len() {
            return Err(TableError::SchemaMismatch {
                expected: self.columns.len(),
                actual: other.columns.len(),
            });
        }
        for (mine, theirs) in self.columns.iter_mut().zip(other.columns) {
            if mine.name != theirs.name {
                return Err(TableError::UnknownColumn(theirs.name));
            }
            mine.values.extend(theirs.values);
        }
        self.num_rows += other.num_rows;
        Ok(self)
    }

    /// Append a column at the right edge.
    pub fn with_column(mut self, column: Column) -> Result<Table, TableError> {
        self.columns.push(column);
        Table::new(self.columns)
    }
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table.column(column).map(|c| &c.values[self.index])
    }

    /// `(column name, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let index = self.index;
        self.table
            .columns
            .iter()
            .map(move |c| (c.name.as_str(), &c.values[index]))
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }
}
