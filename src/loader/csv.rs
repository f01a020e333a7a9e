//! Comma-separated sources: the first record is the header.

use crate::error::SheetMergerError;
use crate::loader::header::deduplicate;
use crate::loader::LoaderError;
use crate::table::Table;
use crate::table::Value;
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use tracing::debug;
use tracing::warn;

/// Cell texts read as missing values
const NULL_LITERALS: [&str; 8] = ["NA", "N/A", "NaN", "nan", "NULL", "null", "None", "#N/A"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parses CSV bytes into a table.
pub(crate) fn read_csv(name: &str, bytes: &[u8]) -> Result<Table, SheetMergerError> {
    let text = decode(name, bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => Err(LoaderError::ParseFailure(format!("'{name}' has no header row")))?,
    };
    let headers = deduplicate(header.iter().enumerate().map(|(index, field)| {
        if field.is_empty() {
            format!("Unnamed: {index}")
        } else {
            field.to_owned()
        }
    }));

    let width = headers.len();
    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        if record.len() > width {
            Err(LoaderError::ParseFailure(format!(
                "'{name}' line {}: expected {width} fields, saw {}",
                index + 2,
                record.len()
            )))?
        }
        let mut row: Vec<Value> = record.iter().map(infer).collect();
        row.resize(width, Value::Null);
        rows.push(row);
    }

    debug!(file = name, cols = width, rows = rows.len(), "read csv");
    Ok(Table::from_rows(headers, rows)?)
}

/// Decodes UTF-8 (with or without a BOM), falling back to Windows-1252.
fn decode<'a>(name: &str, bytes: &'a [u8]) -> Cow<'a, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            warn!(file = name, "csv is not valid UTF-8, decoding as windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Infers the value of one CSV field.
fn infer(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() || NULL_LITERALS.contains(&trimmed) {
        return Value::Null;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Value::Int(integer);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return Value::Float(float);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(field.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_field_values() {
        assert_eq!(infer(""), Value::Null);
        assert_eq!(infer("N/A"), Value::Null);
        assert_eq!(infer("nan"), Value::Null);
        assert_eq!(infer("42"), Value::Int(42));
        assert_eq!(infer(" -7 "), Value::Int(-7));
        assert_eq!(infer("2.5"), Value::Float(2.5));
        assert_eq!(infer("TRUE"), Value::Bool(true));
        assert_eq!(infer("hello"), Value::from("hello"));
    }

    #[test]
    fn reads_headers_and_rows() {
        let bytes = b"\xEF\xBB\xBFid,name,,name\n1,a,x,b\n2,\"c, d\"\n";
        let table = read_csv("people.csv", bytes).unwrap();
        assert_eq!(table.column_names(), vec!["id", "name", "Unnamed: 2", "name_1"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.row(1),
            Some(vec![&Value::Int(2), &Value::from("c, d"), &Value::Null, &Value::Null])
        );
    }

    #[test]
    fn decodes_windows_1252() {
        let bytes = b"city\nM\xFCnchen\n";
        let table = read_csv("cities.csv", bytes).unwrap();
        assert_eq!(table.column("city").unwrap().values, vec![Value::from("M\u{fc}nchen")]);
    }

    #[test]
    fn rejects_long_rows_and_empty_input() {
        let error = read_csv("bad.csv", b"a,b\n1,2,3\n").unwrap_err();
        assert!(error.is_parse_failure());
        let error = read_csv("empty.csv", b"").unwrap_err();
        assert!(error.is_parse_failure());
    }
}
