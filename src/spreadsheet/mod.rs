//! # Spreadsheet Processing Module
//!
//! Reads Office Open XML workbooks (`.xlsx`, `.xlsm`) into a grid of
//! [`Value`]s and writes tables back out as single-sheet workbooks. Number
//! formats decide whether a numeric cell is a plain number or a date, time or
//! datetime, for both the 1900 and 1904 date systems.
use crate::error::ResultMessage;
use crate::error::SheetMergerError;
use crate::helpers::reader::Source;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::table::Value;
use thiserror::Error;
use tracing::debug;

pub(crate) mod cell;
pub(crate) mod escape;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub mod writer;
pub(crate) mod xlsx;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect spreadsheet format for '{0}'")]
    InvalidFileFormat(String),

    #[error("Missing file '{0}' in workbook")]
    FileError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Sheet '{1}' not found in '{0}'")]
    SheetNotFound(String, String),

    #[error("Sheet '{1}' in '{0}' needs two header rows")]
    MissingHeaderRows(String, String),

    #[error("Invalid cell value at {0}!{1}!{2}: {3}")]
    CellValueError(String, String, String, String),
}

impl SpreadsheetError {
    /// Returns true when the error stems from the workbook bytes themselves
    /// rather than from a wrong request.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, SpreadsheetError::SheetNotFound(..))
    }
}

/// Common interface over spreadsheet file formats.
pub(crate) trait Spreadsheet {
    /// File name of the spreadsheet
    fn name(&self) -> String;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Loads the shared string table, empty when the workbook has none
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SheetMergerError>;

    /// Reads all valued cells of a sheet
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, SheetMergerError>;
}

/// Returns true when the extension names a workbook this module can read.
pub(crate) fn is_spreadsheet_extension(extension: &str) -> bool {
    matches!(extension, "xlsx" | "xlsm")
}

/// Opens the spreadsheet behind `source`, choosing the reader by extension.
pub(crate) fn open_spreadsheet(source: &Source) -> Result<Box<dyn Spreadsheet>, SheetMergerError> {
    match source.extension().as_deref() {
        Some("xlsx" | "xlsm") => Ok(Box::new(XlsxSpreadsheet::open(source)?)),
        _ => Err(SpreadsheetError::InvalidFileFormat(source.name()).into()),
    }
}

/// Lists the sheet names of a workbook in workbook order.
pub fn sheet_names(source: &Source) -> Result<Vec<String>, SheetMergerError> {
    let spreadsheet = open_spreadsheet(source).with_prefix(&source.name())?;
    Ok(spreadsheet.sheet_names())
}

/// Reads a whole sheet as rows of values.
///
/// Every row spans columns A up to the last used column, and rows run from the
/// first physical row up to the last used one, so empty rows in between come
/// back as all-null rows.
pub fn read_grid(source: &Source, sheet_name: &str) -> Result<Vec<Vec<Value>>, SheetMergerError> {
    let mut spreadsheet = open_spreadsheet(source)?;
    let shared_strings = spreadsheet.load_shared_strings()?;
    let sheet = spreadsheet.read_sheet(sheet_name)?;
    debug!(
        file = %sheet.file_name,
        sheet = %sheet.name,
        rows = sheet.row_count(),
        cols = sheet.col_count(),
        "read sheet"
    );
    if sheet.row_count() == 0 {
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(sheet.row_count());
    for cells in sheet.grid(0, sheet.row_count() - 1) {
        let mut row = Vec::with_capacity(cells.len());
        for cell in cells {
            let value = match cell {
                Some(cell) => cell.to_value(&shared_strings).map_err(|message| {
                    SpreadsheetError::CellValueError(
                        sheet.file_name.to_owned(),
                        sheet.name.to_owned(),
                        cell.reference(),
                        message,
                    )
                })?,
                None => Value::Null,
            };
            row.push(value);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::writer::write_grid;

    fn workbook(rows: Vec<Vec<Value>>) -> Source {
        let mut bytes = Vec::new();
        write_grid("Data", &rows, std::io::Cursor::new(&mut bytes)).unwrap();
        Source::upload("book.xlsx", bytes)
    }

    #[test]
    fn lists_sheet_names() {
        let source = workbook(vec![vec![Value::from("a")]]);
        assert_eq!(sheet_names(&source).unwrap(), vec!["Data".to_owned()]);
    }

    #[test]
    fn reads_values_with_gaps() {
        let source = workbook(vec![
            vec![Value::from("h1"), Value::Null, Value::from("h3")],
            vec![Value::Null, Value::from("h2"), Value::Null],
            vec![Value::Int(1), Value::Float(2.5), Value::Bool(true)],
            vec![Value::Null, Value::Null, Value::Null],
            vec![Value::from("x"), Value::Null, Value::Null],
        ]);
        let rows = read_grid(&source, "Data").unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], vec![Value::from("h1"), Value::Null, Value::from("h3")]);
        assert_eq!(rows[2], vec![Value::Int(1), Value::Float(2.5), Value::Bool(true)]);
        assert_eq!(rows[3], vec![Value::Null, Value::Null, Value::Null]);
        assert_eq!(rows[4], vec![Value::from("x"), Value::Null, Value::Null]);
    }

    #[test]
    fn unknown_sheet_is_not_malformed() {
        let source = workbook(vec![vec![Value::from("a")]]);
        let error = read_grid(&source, "Missing").unwrap_err();
        assert!(matches!(error.root(), SheetMergerError::SpreadsheetError(SpreadsheetError::SheetNotFound(..))));
        assert!(!error.is_parse_failure());
    }

    #[test]
    fn garbage_bytes_are_a_parse_failure() {
        let source = Source::upload("broken.xlsx", b"not a zip".to_vec());
        let error = read_grid(&source, "Sheet1").err().unwrap();
        assert!(error.is_parse_failure());
    }
}
