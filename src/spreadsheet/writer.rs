//! Serializes tables into single-sheet Office Open XML workbooks.

use crate::error::SheetMergerError;
use crate::spreadsheet::cell::datetime_to_serial;
use crate::spreadsheet::cell::time_to_fraction;
use crate::spreadsheet::escape::escape_text;
use crate::spreadsheet::reference::index_to_reference;
use crate::table::Table;
use crate::table::Value;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use tracing::instrument;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Name of the only worksheet in written workbooks
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

// Indexes into the cellXfs list of STYLES
const STYLE_DATE: &str = "1";
const STYLE_DATETIME: &str = "2";
const STYLE_TIME: &str = "3";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="4"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="21" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Writes `table` as a workbook: one header row followed by the data rows.
#[instrument(name = "spreadsheet::write_xlsx", level = "debug", skip_all, fields(rows = table.row_count(), cols = table.column_count()))]
pub fn write_xlsx<W: Write + Seek>(table: &Table, writer: W) -> Result<W, SheetMergerError> {
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(table.row_count() + 1);
    rows.push(table.column_names().into_iter().map(Value::from).collect());
    for index in 0..table.row_count() {
        rows.push(table.columns().iter().map(|column| column.values[index].to_owned()).collect());
    }
    write_grid(DEFAULT_SHEET_NAME, &rows, writer)
}

/// Writes `table` to a workbook file at `path`, replacing any existing file.
pub fn write_xlsx_file<P: AsRef<Path>>(table: &Table, path: P) -> Result<(), SheetMergerError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = write_xlsx(table, BufWriter::new(file))?;
    writer.flush()?;
    debug!(path = %path.display(), "wrote workbook");
    Ok(())
}

/// Writes an arbitrary grid of values as the single sheet `sheet_name`.
/// Null values leave their cell out.
pub fn write_grid<W: Write + Seek>(sheet_name: &str, rows: &[Vec<Value>], writer: W) -> Result<W, SheetMergerError> {
    write_package(sheet_name, &worksheet_xml(rows)?, writer)
}

/// Wraps an already serialized worksheet part into a workbook package.
pub(crate) fn write_package<W: Write + Seek>(sheet_name: &str, worksheet: &[u8], writer: W) -> Result<W, SheetMergerError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELATIONSHIPS.as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(WORKBOOK_RELATIONSHIPS.as_bytes())?;
    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES.as_bytes())?;
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(&workbook_xml(sheet_name)?)?;
    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(worksheet)?;

    Ok(zip.finish()?)
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>, SheetMergerError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheets")))?;
    writer.write_event(Event::Empty(
        BytesStart::new("sheet").with_attributes([("name", sheet_name), ("sheetId", "1"), ("r:id", "rId1")]),
    ))?;
    writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner())
}

fn worksheet_xml(rows: &[Vec<Value>]) -> Result<Vec<u8>, SheetMergerError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)])))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
    for (row_index, row) in rows.iter().enumerate() {
        let number = (row_index + 1).to_string();
        writer.write_event(Event::Start(BytesStart::new("row").with_attributes([("r", number.as_str())])))?;
        for (col_index, value) in row.iter().enumerate() {
            write_cell(&mut writer, &index_to_reference(row_index, col_index), value)?;
        }
        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_cell(writer: &mut Writer<Vec<u8>>, reference: &str, value: &Value) -> Result<(), SheetMergerError> {
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference));
    let content = match value {
        Value::Null => return Ok(()),
        Value::Text(text) => {
            cell.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(cell))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            writer.write_event(Event::Start(BytesStart::new("t").with_attributes([("xml:space", "preserve")])))?;
            writer.write_event(Event::Text(BytesText::new(&escape_text(text))))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
            return Ok(());
        }
        Value::Bool(flag) => {
            cell.push_attribute(("t", "b"));
            String::from(if *flag { "1" } else { "0" })
        }
        Value::Int(number) => number.to_string(),
        Value::Float(number) if !number.is_finite() => return Ok(()),
        // Debug keeps a trailing ".0" so integral floats read back as floats
        Value::Float(number) => format!("{number:?}"),
        Value::Date(date) => {
            cell.push_attribute(("s", STYLE_DATE));
            let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
            datetime_to_serial(&midnight).to_string()
        }
        Value::DateTime(datetime) => {
            cell.push_attribute(("s", STYLE_DATETIME));
            datetime_to_serial(datetime).to_string()
        }
        Value::Time(time) => {
            cell.push_attribute(("s", STYLE_TIME));
            time_to_fraction(time).to_string()
        }
    };
    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(&content)))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}
