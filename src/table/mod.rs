//! # In-memory Tables
//!
//! A [`Table`] is an ordered sequence of uniquely named columns of equal
//! length. Every constructor checks both invariants, so engines can index
//! rows without further bounds bookkeeping.
use crate::mapping::ColumnMapping;
use std::collections::HashSet;
use thiserror::Error;

pub mod column;
pub mod value;

pub use column::Column;
pub use value::Value;

/// Errors raised when a table would violate its shape invariants.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {actual} values, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Row {row} has {actual} values, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Rectangular table with unique column names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table from columns, checking name uniqueness and uniform length.
    pub fn new(columns: Vec<Column>) -> Result<Table, TableError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.to_owned()));
            }
            if column.len() != rows {
                return Err(TableError::ColumnLength {
                    name: column.name.to_owned(),
                    expected: rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Table { columns, rows })
    }

    /// Builds a table from a header and row-major records.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Table, TableError> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowLength {
                    row: index,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }
        Table::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Mutable access to a column's values. The length must be kept unchanged.
    pub(crate) fn values_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.columns
            .iter_mut()
            .find(|column| column.name == name)
            .map(|column| &mut column.values)
    }

    /// Mutable access to the first column's values.
    pub(crate) fn first_values_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.columns.first_mut().map(|column| &mut column.values)
    }

    /// Returns the values of one row in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index < self.rows {
            Some(self.columns.iter().map(|column| &column.values[index]).collect())
        } else {
            None
        }
    }

    /// Returns a copy whose columns are renamed per `mapping` (old name -> new name).
    /// Mapping entries naming absent columns are ignored.
    pub fn rename(&self, mapping: &ColumnMapping) -> Result<Table, TableError> {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let name = mapping.get(&column.name).unwrap_or(&column.name);
                Column::new(name.to_owned(), column.values.to_owned())
            })
            .collect();
        Table::new(columns)
    }
}
