//! Positional fill: the template keeps its shape, mapped columns take the
//! source values row by row.

use crate::mapping::ColumnMapping;
use crate::table::Table;
use crate::table::Value;
use tracing::debug;
use tracing::instrument;

/// Switches for [`fill_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillOptions {
    /// Overwrite the first template column with `1..=N`
    pub renumber_first_column: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        FillOptions {
            renumber_first_column: true,
        }
    }
}

/// Fills `template` from `source` with the default options.
pub fn fill(template: &Table, source: &Table, mapping: &ColumnMapping) -> Table {
    fill_with(template, source, mapping, FillOptions::default())
}

/// Returns a copy of `template` whose mapped columns hold the source values by position.
///
/// The result always has the template's rows and columns:
/// * a longer source is truncated to the template's row count,
/// * a shorter source fills the leading rows and leaves the rest null,
/// * mapping entries naming a column missing on either side are skipped.
///
/// Renumbering runs first, so a mapping that targets the first column wins.
#[instrument(
    name = "engine::fill",
    level = "info",
    skip_all,
    fields(template_rows = template.row_count(), source_rows = source.row_count(), mapped = mapping.len())
)]
pub fn fill_with(template: &Table, source: &Table, mapping: &ColumnMapping, options: FillOptions) -> Table {
    let mut output = template.to_owned();

    if options.renumber_first_column {
        if let Some(values) = output.first_values_mut() {
            for (index, value) in values.iter_mut().enumerate() {
                *value = Value::Int(index as i64 + 1);
            }
        }
    }

    for (template_column, source_column) in mapping {
        let Some(source_values) = source.column(source_column).map(|column| &column.values) else {
            debug!(%template_column, %source_column, "source column missing, skipped");
            continue;
        };
        let Some(values) = output.values_mut(template_column) else {
            debug!(%template_column, %source_column, "template column missing, skipped");
            continue;
        };
        for (index, value) in values.iter_mut().enumerate() {
            *value = source_values.get(index).cloned().unwrap_or(Value::Null);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn ints(range: std::ops::RangeInclusive<i64>) -> Vec<Value> {
        range.map(Value::Int).collect()
    }

    fn template() -> Table {
        Table::new(vec![
            Column::new("No", vec![Value::from("x"); 5]),
            Column::new("Amount", vec![Value::Null; 5]),
            Column::new("Note", vec![Value::from("keep"); 5]),
        ])
        .unwrap()
    }

    fn mapping(pairs: &[(&str, &str)]) -> ColumnMapping {
        pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn pads_short_sources_with_null() {
        let source = Table::new(vec![Column::new("amt", ints(10..=12))]).unwrap();
        let output = fill(&template(), &source, &mapping(&[("Amount", "amt")]));
        assert_eq!(output.row_count(), 5);
        assert_eq!(
            output.column("Amount").unwrap().values,
            vec![Value::Int(10), Value::Int(11), Value::Int(12), Value::Null, Value::Null]
        );
        assert_eq!(output.column("No").unwrap().values, ints(1..=5));
        assert_eq!(output.column("Note").unwrap().values, vec![Value::from("keep"); 5]);
    }

    #[test]
    fn truncates_long_sources() {
        let source = Table::new(vec![Column::new("amt", ints(1..=10))]).unwrap();
        let output = fill(&template(), &source, &mapping(&[("Amount", "amt")]));
        assert_eq!(output.column("Amount").unwrap().values, ints(1..=5));
    }

    #[test]
    fn skips_missing_columns() {
        let source = Table::new(vec![Column::new("amt", ints(1..=5))]).unwrap();
        let output = fill(&template(), &source, &mapping(&[("Amount", "missing"), ("Missing", "amt")]));
        assert_eq!(output.column_names(), vec!["No", "Amount", "Note"]);
        assert_eq!(output.column("Amount").unwrap().values, vec![Value::Null; 5]);
    }

    #[test]
    fn renumbering_can_be_disabled() {
        let source = Table::default();
        let options = FillOptions {
            renumber_first_column: false,
        };
        let output = fill_with(&template(), &source, &ColumnMapping::new(), options);
        assert_eq!(output, template());
    }

    #[test]
    fn mapped_first_column_wins_over_renumbering() {
        let source = Table::new(vec![Column::new("id", ints(7..=11))]).unwrap();
        let output = fill(&template(), &source, &mapping(&[("No", "id")]));
        assert_eq!(output.column("No").unwrap().values, ints(7..=11));
    }

    #[test]
    fn empty_template_stays_empty() {
        let template = Table::from_rows(vec!["No".to_owned()], vec![]).unwrap();
        let source = Table::new(vec![Column::new("id", ints(1..=3))]).unwrap();
        let output = fill(&template, &source, &mapping(&[("No", "id")]));
        assert_eq!(output.row_count(), 0);
    }
}
