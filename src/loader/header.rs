//! Two-row header synthesis for spreadsheet sources.
//!
//! Reporting workbooks often carry a category label in the first physical row
//! and a sub-label in the second. Both rows are folded into one column name,
//! padding columns are dropped, and repeated names get a numeric suffix.

use crate::table::Column;
use crate::table::Table;
use crate::table::TableError;
use crate::table::Value;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::debug;

/// Name resolved for one physical column.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Header {
    /// Text taken from the header rows
    Named(String),
    /// Neither header row has text in this column (0-based position)
    Placeholder(usize),
}

impl Header {
    /// Combines the two header cells of column `index`.
    pub(crate) fn combine(first: &Value, second: &Value, index: usize) -> Header {
        let first = header_text(first);
        let second = header_text(second);
        match (first.is_empty(), second.is_empty()) {
            (false, false) if first != second => Header::Named(format!("{first} - {second}")),
            (false, _) => Header::Named(first),
            (true, false) => Header::Named(second),
            (true, true) => Header::Placeholder(index),
        }
    }

    /// Returns the column name, or `None` for columns that are spreadsheet padding.
    pub(crate) fn into_name(self) -> Option<String> {
        match self {
            Header::Named(name) if !is_noise(&name) => Some(name),
            _ => None,
        }
    }
}

/// Trimmed header text of a cell, printed the way spreadsheet tools print
/// cell values (`True`, `2024-01-15 00:00:00`).
fn header_text(value: &Value) -> String {
    let text = match value {
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::Date(date) => date.format("%Y-%m-%d 00:00:00").to_string(),
        other => other.to_string(),
    };
    text.trim().to_owned()
}

/// Prefix of the positional names given to columns without header text
pub(crate) const PLACEHOLDER_PREFIX: &str = "Column_";

/// Names that only ever come from empty or exported-index columns.
/// Header text shaped like a placeholder name counts as one.
pub(crate) fn is_noise(name: &str) -> bool {
    let name = name.trim();
    let lowercase = name.to_lowercase();
    name.is_empty() || lowercase == "nan" || lowercase.contains("unnamed") || name.starts_with(PLACEHOLDER_PREFIX)
}

/// Suffixes every repeated name with its occurrence counter (`X`, `X_1`, `X_2`).
///
/// The first occurrence keeps the bare name. A generated name that is already
/// taken moves on to the next counter, so the output is always unique.
pub(crate) fn deduplicate<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();
    for name in names {
        let resolved = if taken.contains(&name) {
            let counter = counters.entry(name.to_owned()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{name}_{counter}");
                if !taken.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            name
        };
        taken.insert(resolved.to_owned());
        unique.push(resolved);
    }
    unique
}

/// Builds a table from physical rows whose first two rows hold the header.
///
/// Data starts at the third row. `rows` must hold at least two rows of equal width.
pub(crate) fn build_table(mut rows: Vec<Vec<Value>>) -> Result<Table, TableError> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let data = rows.split_off(2.min(rows.len()));
    let empty = Vec::new();
    let first = rows.first().unwrap_or(&empty);
    let second = rows.get(1).unwrap_or(&empty);

    let headers: Vec<Option<String>> = (0..width)
        .map(|index| {
            Header::combine(
                first.get(index).unwrap_or(&Value::Null),
                second.get(index).unwrap_or(&Value::Null),
                index,
            )
            .into_name()
        })
        .collect();

    let mut columns: Vec<(usize, Vec<Value>)> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| header.is_some())
        .map(|(index, _)| (index, Vec::with_capacity(data.len())))
        .collect();
    for mut row in data {
        row.resize(width, Value::Null);
        for (index, values) in columns.iter_mut() {
            values.push(std::mem::take(&mut row[*index]));
        }
    }

    let kept = headers.into_iter().flatten();
    let names = deduplicate(kept);
    debug!(physical = width, kept = names.len(), "resolved two-row header");
    Table::new(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, (_, values))| Column::new(name, values))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Value {
        if value.is_empty() {
            Value::Null
        } else {
            Value::from(value)
        }
    }

    #[test]
    fn combines_header_rows() {
        assert_eq!(Header::combine(&text("A"), &text("A"), 0), Header::Named("A".to_owned()));
        assert_eq!(Header::combine(&text("A"), &text("B"), 0), Header::Named("A - B".to_owned()));
        assert_eq!(Header::combine(&text(""), &text("B"), 0), Header::Named("B".to_owned()));
        assert_eq!(Header::combine(&text("A"), &text(""), 0), Header::Named("A".to_owned()));
        assert_eq!(Header::combine(&text(" A "), &text("  "), 0), Header::Named("A".to_owned()));
        assert_eq!(Header::combine(&Value::Null, &Value::Null, 4), Header::Placeholder(4));
        assert_eq!(Header::combine(&Value::Int(2024), &text("Q1"), 0), Header::Named("2024 - Q1".to_owned()));
    }

    #[test]
    fn prints_non_text_header_cells() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            Header::combine(&Value::Date(date), &Value::Bool(true), 0),
            Header::Named("2024-01-15 00:00:00 - True".to_owned())
        );
        assert_eq!(Header::combine(&Value::Bool(false), &Value::Null, 0), Header::Named("False".to_owned()));
        assert_eq!(Header::combine(&Value::Float(2.5), &Value::Null, 0), Header::Named("2.5".to_owned()));
    }

    #[test]
    fn detects_noise_names() {
        assert!(is_noise(""));
        assert!(is_noise("NaN"));
        assert!(is_noise("Unnamed: 3"));
        assert!(is_noise("some UNNAMED field"));
        assert!(!is_noise("Name"));
        assert!(!is_noise("nanometer"));
        assert_eq!(Header::Placeholder(0).into_name(), None);
        assert!(is_noise("Column_3"));
        assert!(!is_noise("column_3"));
        assert_eq!(Header::Named("Column_Name".to_owned()).into_name(), None);
        assert_eq!(Header::Named("Columns".to_owned()).into_name(), Some("Columns".to_owned()));
    }

    #[test]
    fn deduplicates_with_counters() {
        let names = |items: &[&str]| deduplicate(items.iter().map(|item| item.to_string()));
        assert_eq!(names(&["X", "X", "Y"]), vec!["X", "X_1", "Y"]);
        assert_eq!(names(&["X", "X", "X"]), vec!["X", "X_1", "X_2"]);
        assert_eq!(names(&["X_1", "X", "X"]), vec!["X_1", "X", "X_2"]);
    }

    #[test]
    fn builds_table_from_two_header_rows() {
        let rows = vec![
            vec![text("Region"), text("Sales"), text(""), text("Unnamed: 3"), text("Sales")],
            vec![text("Region"), text("Q1"), text(""), text(""), text("Q1")],
            vec![text("North"), Value::Int(10), text("x"), Value::Int(1), Value::Int(11)],
            vec![text("South"), Value::Int(20), Value::Null, Value::Null, Value::Int(21)],
        ];
        let table = build_table(rows).unwrap();
        assert_eq!(table.column_names(), vec!["Region", "Sales - Q1", "Sales - Q1_1"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("Sales - Q1_1").unwrap().values, vec![Value::Int(11), Value::Int(21)]);
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let rows = vec![vec![text("a"), text("b")], vec![text(""), text("")]];
        let table = build_table(rows).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.row_count(), 0);
    }
}
