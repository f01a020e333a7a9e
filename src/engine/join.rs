//! Key-based relational join with `_A`/`_B` suffixes on name collisions.

use crate::error::SheetMergerError;
use crate::mapping::ColumnMapping;
use crate::table::value::KeyValue;
use crate::table::Column;
use crate::table::Table;
use crate::table::TableError;
use crate::table::Value;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;
use tracing::instrument;

/// Suffix for colliding columns that come from the left table
pub const LEFT_SUFFIX: &str = "_A";
/// Suffix for colliding columns that come from the right table
pub const RIGHT_SUFFIX: &str = "_B";

#[derive(Error, Debug, PartialEq)]
pub enum JoinError {
    #[error("Missing merge keys: {0}")]
    MissingKeys(String),

    #[error("Join would produce duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Unknown join mode '{0}', expected inner, left, right or outer")]
    UnknownJoinMode(String),
}

/// Which unmatched rows survive a join.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum JoinMode {
    /// Only rows with a match on both sides
    #[default]
    Inner,
    /// Every left row
    Left,
    /// Every right row
    Right,
    /// Every row from either side
    Outer,
}

impl JoinMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinMode::Inner => "inner",
            JoinMode::Left => "left",
            JoinMode::Right => "right",
            JoinMode::Outer => "outer",
        }
    }
}

impl FromStr for JoinMode {
    type Err = JoinError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinMode::Inner),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            "outer" | "full" => Ok(JoinMode::Outer),
            _ => Err(JoinError::UnknownJoinMode(name.to_owned())),
        }
    }
}

impl Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renames `left` per `rename`, then joins it with `right` on `keys`.
///
/// Output columns are the left columns in order (keys in place) followed by
/// the right non-key columns. A non-key name present on both sides becomes
/// `<name>_A` and `<name>_B`. Key cells come from the left row, or from the
/// right row when there is no left row. Null keys never match.
#[instrument(
    name = "engine::join",
    level = "info",
    skip(left, right, rename),
    fields(left_rows = left.row_count(), right_rows = right.row_count())
)]
pub fn join(
    left: &Table,
    right: &Table,
    rename: &ColumnMapping,
    keys: &[String],
    mode: JoinMode,
) -> Result<Table, SheetMergerError> {
    let left = match left.rename(rename) {
        Ok(table) => table,
        Err(TableError::DuplicateColumn(name)) => Err(JoinError::DuplicateColumn(name))?,
        Err(error) => Err(error)?,
    };

    let keys = unique_keys(keys);
    if keys.is_empty() {
        Err(JoinError::MissingKeys("no merge keys given".to_owned()))?
    }
    let missing: Vec<String> = keys
        .iter()
        .flat_map(|key| {
            let mut sides = Vec::new();
            if !left.contains(key) {
                sides.push(format!("'{key}' (left)"));
            }
            if !right.contains(key) {
                sides.push(format!("'{key}' (right)"));
            }
            sides
        })
        .collect();
    if !missing.is_empty() {
        Err(JoinError::MissingKeys(missing.join(", ")))?
    }

    let pairs = match_rows(&left, right, &keys, mode);
    let output = assemble(&left, right, &keys, &pairs)?;
    info!(mode = %mode, rows = output.row_count(), cols = output.column_count(), "joined tables");
    Ok(output)
}

fn unique_keys(keys: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    keys.iter()
        .map(String::as_str)
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Composite key of one row, `None` when any part is null.
fn row_key(table: &Table, keys: &[&str], row: usize) -> Option<Vec<KeyValue>> {
    keys.iter()
        .map(|key| table.column(key).and_then(|column| column.values[row].key()))
        .collect()
}

/// Row indexes of `table` grouped by key, in table order.
fn index_rows(table: &Table, keys: &[&str]) -> HashMap<Vec<KeyValue>, Vec<usize>> {
    let mut index: HashMap<Vec<KeyValue>, Vec<usize>> = HashMap::new();
    for row in 0..table.row_count() {
        if let Some(key) = row_key(table, keys, row) {
            index.entry(key).or_default().push(row);
        }
    }
    index
}

/// Pairs of (left row, right row) in output order.
fn match_rows(left: &Table, right: &Table, keys: &[&str], mode: JoinMode) -> Vec<(Option<usize>, Option<usize>)> {
    let mut pairs = Vec::new();
    if mode == JoinMode::Right {
        let index = index_rows(left, keys);
        for right_row in 0..right.row_count() {
            match row_key(right, keys, right_row).and_then(|key| index.get(&key)) {
                Some(left_rows) => pairs.extend(left_rows.iter().map(|left_row| (Some(*left_row), Some(right_row)))),
                None => pairs.push((None, Some(right_row))),
            }
        }
        return pairs;
    }

    let index = index_rows(right, keys);
    let mut matched = vec![false; right.row_count()];
    for left_row in 0..left.row_count() {
        match row_key(left, keys, left_row).and_then(|key| index.get(&key)) {
            Some(right_rows) => {
                for right_row in right_rows {
                    matched[*right_row] = true;
                    pairs.push((Some(left_row), Some(*right_row)));
                }
            }
            None if mode != JoinMode::Inner => pairs.push((Some(left_row), None)),
            None => (),
        }
    }
    if mode == JoinMode::Outer {
        pairs.extend(
            matched
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(right_row, _)| (None, Some(right_row))),
        );
    }
    pairs
}

fn assemble(
    left: &Table,
    right: &Table,
    keys: &[&str],
    pairs: &[(Option<usize>, Option<usize>)],
) -> Result<Table, SheetMergerError> {
    let is_key = |name: &str| keys.iter().any(|key| *key == name);
    let left_names: HashSet<&str> = left.column_names().into_iter().filter(|name| !is_key(*name)).collect();
    let right_names: HashSet<&str> = right.column_names().into_iter().filter(|name| !is_key(*name)).collect();

    let pick = |column: &Column, row: Option<usize>| row.map(|row| column.values[row].to_owned()).unwrap_or(Value::Null);

    let mut columns = Vec::with_capacity(left.column_count() + right_names.len());
    for column in left.columns() {
        let values = if is_key(column.name.as_str()) {
            let fallback = right.column(&column.name);
            pairs
                .iter()
                .map(|(left_row, right_row)| match (left_row, fallback) {
                    (Some(row), _) => column.values[*row].to_owned(),
                    (None, Some(fallback)) => pick(fallback, *right_row),
                    (None, None) => Value::Null,
                })
                .collect()
        } else {
            pairs.iter().map(|(left_row, _)| pick(column, *left_row)).collect()
        };
        let name = if right_names.contains(column.name.as_str()) {
            format!("{}{LEFT_SUFFIX}", column.name)
        } else {
            column.name.to_owned()
        };
        columns.push(Column::new(name, values));
    }
    for column in right.columns().iter().filter(|column| !is_key(column.name.as_str())) {
        let values = pairs.iter().map(|(_, right_row)| pick(column, *right_row)).collect();
        let name = if left_names.contains(column.name.as_str()) {
            format!("{}{RIGHT_SUFFIX}", column.name)
        } else {
            column.name.to_owned()
        };
        columns.push(Column::new(name, values));
    }

    let table = match Table::new(columns) {
        Ok(table) => table,
        Err(TableError::DuplicateColumn(name)) => Err(JoinError::DuplicateColumn(name))?,
        Err(error) => Err(error)?,
    };
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: Vec<(&str, Vec<Value>)>) -> Table {
        Table::new(columns.into_iter().map(|(name, values)| Column::new(name, values)).collect()).unwrap()
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|value| Value::from(*value)).collect()
    }

    fn left() -> Table {
        table(vec![("id", ints(&[1, 2, 3])), ("name", texts(&["l1", "l2", "l3"]))])
    }

    fn right() -> Table {
        table(vec![("id", ints(&[2, 3, 4])), ("name", texts(&["r2", "r3", "r4"])), ("extra", ints(&[20, 30, 40]))])
    }

    fn keys() -> Vec<String> {
        vec!["id".to_owned()]
    }

    #[test]
    fn parses_modes() {
        assert_eq!("Inner".parse::<JoinMode>(), Ok(JoinMode::Inner));
        assert_eq!(" outer ".parse::<JoinMode>(), Ok(JoinMode::Outer));
        assert_eq!("full".parse::<JoinMode>(), Ok(JoinMode::Outer));
        assert!(matches!("cross".parse::<JoinMode>(), Err(JoinError::UnknownJoinMode(_))));
        assert_eq!(JoinMode::Right.to_string(), "right");
    }

    #[test]
    fn inner_join_keeps_matches_and_suffixes_collisions() {
        let output = join(&left(), &right(), &ColumnMapping::new(), &keys(), JoinMode::Inner).unwrap();
        assert_eq!(output.column_names(), vec!["id", "name_A", "name_B", "extra"]);
        assert_eq!(output.column("id").unwrap().values, ints(&[2, 3]));
        assert_eq!(output.column("name_A").unwrap().values, texts(&["l2", "l3"]));
        assert_eq!(output.column("name_B").unwrap().values, texts(&["r2", "r3"]));
    }

    #[test]
    fn outer_join_fills_missing_sides_with_null() {
        let output = join(&left(), &right(), &ColumnMapping::new(), &keys(), JoinMode::Outer).unwrap();
        assert_eq!(output.column("id").unwrap().values, ints(&[1, 2, 3, 4]));
        assert_eq!(
            output.column("name_A").unwrap().values,
            vec![Value::from("l1"), Value::from("l2"), Value::from("l3"), Value::Null]
        );
        assert_eq!(
            output.column("extra").unwrap().values,
            vec![Value::Null, Value::Int(20), Value::Int(30), Value::Int(40)]
        );
    }

    #[test]
    fn left_and_right_joins_keep_their_side() {
        let output = join(&left(), &right(), &ColumnMapping::new(), &keys(), JoinMode::Left).unwrap();
        assert_eq!(output.column("id").unwrap().values, ints(&[1, 2, 3]));
        assert_eq!(output.column("name_B").unwrap().values, vec![Value::Null, Value::from("r2"), Value::from("r3")]);

        let output = join(&left(), &right(), &ColumnMapping::new(), &keys(), JoinMode::Right).unwrap();
        assert_eq!(output.column("id").unwrap().values, ints(&[2, 3, 4]));
        assert_eq!(output.column("name_A").unwrap().values, vec![Value::from("l2"), Value::from("l3"), Value::Null]);
    }

    #[test]
    fn renames_left_before_joining() {
        let left = table(vec![("code", ints(&[2])), ("label", texts(&["x"]))]);
        let right = right();
        let mut rename = ColumnMapping::new();
        rename.insert("code".to_owned(), "id".to_owned());
        let output = join(&left, &right, &rename, &keys(), JoinMode::Inner).unwrap();
        assert_eq!(output.column_names(), vec!["id", "label", "name", "extra"]);
        assert_eq!(output.row(0), Some(vec![&Value::Int(2), &Value::from("x"), &Value::from("r2"), &Value::Int(20)]));
    }

    #[test]
    fn duplicate_matches_multiply_rows() {
        let left = table(vec![("id", ints(&[1, 1]))]);
        let right = table(vec![("id", ints(&[1, 1])), ("v", ints(&[7, 8]))]);
        let output = join(&left, &right, &ColumnMapping::new(), &keys(), JoinMode::Inner).unwrap();
        assert_eq!(output.column("v").unwrap().values, ints(&[7, 8, 7, 8]));
    }

    #[test]
    fn null_keys_never_match_and_floats_match_ints() {
        let left = table(vec![("id", vec![Value::Null, Value::Float(2.0)])]);
        let right = table(vec![("id", vec![Value::Null, Value::Int(2)]), ("v", ints(&[1, 2]))]);
        let output = join(&left, &right, &ColumnMapping::new(), &keys(), JoinMode::Inner).unwrap();
        assert_eq!(output.column("v").unwrap().values, ints(&[2]));
        assert_eq!(output.column("id").unwrap().values, vec![Value::Float(2.0)]);
    }

    #[test]
    fn rejects_missing_keys() {
        let error = join(&left(), &right(), &ColumnMapping::new(), &[], JoinMode::Inner).unwrap_err();
        assert!(matches!(error, SheetMergerError::JoinError(JoinError::MissingKeys(_))));

        let error = join(&left(), &right(), &ColumnMapping::new(), &["extra".to_owned()], JoinMode::Inner).unwrap_err();
        assert!(matches!(error, SheetMergerError::JoinError(JoinError::MissingKeys(message)) if message.contains("(left)")));
    }

    #[test]
    fn rejects_colliding_names() {
        let mut rename = ColumnMapping::new();
        rename.insert("name".to_owned(), "id".to_owned());
        let error = join(&left(), &right(), &rename, &keys(), JoinMode::Inner).unwrap_err();
        assert!(matches!(error, SheetMergerError::JoinError(JoinError::DuplicateColumn(_))));

        let left = table(vec![("id", ints(&[1])), ("v", ints(&[1])), ("v_A", ints(&[1]))]);
        let right = table(vec![("id", ints(&[1])), ("v", ints(&[1]))]);
        let error = join(&left, &right, &ColumnMapping::new(), &keys(), JoinMode::Inner).unwrap_err();
        assert!(matches!(error, SheetMergerError::JoinError(JoinError::DuplicateColumn(name)) if name == "v_A"));
    }
}
