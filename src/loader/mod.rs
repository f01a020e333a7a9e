//! # Tabular Loader
//!
//! Turns a CSV file or a workbook sheet into a [`Table`] with unique column
//! names. Workbook sheets follow the two-row header convention described in
//! [`header`]; CSV files use their first record as the header.
use crate::error::ResultMessage;
use crate::error::SheetMergerError;
use crate::helpers::reader::Source;
use crate::spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Table;
use thiserror::Error;
use tracing::info;
use tracing::instrument;

use self::csv::read_csv;

pub(crate) mod csv;
pub(crate) mod header;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unsupported file type '{0}', expected .csv, .xlsx or .xlsm")]
    UnsupportedFormat(String),

    #[error("A sheet name is required to read '{0}'")]
    MissingSheetName(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),
}

/// Kinds of tabular sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Csv,
    Spreadsheet,
}

impl Format {
    /// Detects the format from the source's file extension.
    pub fn detect(source: &Source) -> Result<Format, LoaderError> {
        match source.extension().as_deref() {
            Some("csv") => Ok(Format::Csv),
            Some(extension) if spreadsheet::is_spreadsheet_extension(extension) => Ok(Format::Spreadsheet),
            _ => Err(LoaderError::UnsupportedFormat(source.name())),
        }
    }
}

/// Loads `source` into a table.
///
/// Spreadsheet sources need `sheet_name`; it is ignored for CSV.
#[instrument(name = "loader::load", level = "info", skip(source), fields(source = %source.name()))]
pub fn load(source: &Source, sheet_name: Option<&str>) -> Result<Table, SheetMergerError> {
    let table = match Format::detect(source)? {
        Format::Csv => {
            let bytes = source.read_all().with_prefix(&source.name())?;
            read_csv(&source.name(), &bytes)?
        }
        Format::Spreadsheet => {
            let sheet_name = sheet_name.ok_or_else(|| LoaderError::MissingSheetName(source.name()))?;
            let rows = spreadsheet::read_grid(source, sheet_name).with_prefix(&source.name())?;
            if rows.len() < 2 {
                Err(SpreadsheetError::MissingHeaderRows(source.name(), sheet_name.to_owned()))?
            }
            header::build_table(rows)?
        }
    };
    info!(rows = table.row_count(), cols = table.column_count(), "loaded table");
    Ok(table)
}

/// Lists the sheets a caller can pass to [`load`]. CSV sources have none.
pub fn sheet_names(source: &Source) -> Result<Vec<String>, SheetMergerError> {
    match Format::detect(source)? {
        Format::Csv => Ok(Vec::new()),
        Format::Spreadsheet => spreadsheet::sheet_names(source),
    }
}
