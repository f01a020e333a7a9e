//! # Workspace and Session
//!
//! [`Workspace`] owns the on-disk layout: the persisted template, the mapping
//! store and the output files. [`Session`] is the per-user context holding the
//! mapping currently being worked on; fill and merge only run once it has
//! been confirmed.
use crate::config::Config;
use crate::engine;
use crate::engine::join::JoinError;
use crate::engine::FillOptions;
use crate::engine::JoinMode;
use crate::error::ResultMessage;
use crate::error::SheetMergerError;
use crate::helpers::reader::Source;
use crate::loader;
use crate::mapping::ColumnMapping;
use crate::mapping::MappingStore;
use crate::mapping::SavedMapping;
use crate::spreadsheet;
use crate::table::Table;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use tracing::instrument;

/// Longest sample shown by [`preview`], in characters
pub const PREVIEW_WIDTH: usize = 20;

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Map at least one column")]
    NoMappedColumns,

    #[error("No template file found at '{0}'")]
    TemplateMissing(String),

    #[error("Confirm or load a column mapping first")]
    MappingNotConfirmed,
}

/// Paths and stores derived from a [`Config`].
#[derive(Clone, Debug)]
pub struct Workspace {
    config: Config,
    store: MappingStore,
}

impl Workspace {
    pub fn new(config: Config) -> Workspace {
        let store = MappingStore::new(config.mapping_path());
        Workspace { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.store
    }

    pub fn template_path(&self) -> PathBuf {
        self.config.template_path()
    }

    pub fn has_template(&self) -> bool {
        self.template_path().is_file()
    }

    /// The persisted template as a loader source.
    pub fn template_source(&self) -> Result<Source, SessionError> {
        let path = self.template_path();
        if path.is_file() {
            Ok(Source::Path(path))
        } else {
            Err(SessionError::TemplateMissing(path.display().to_string()))
        }
    }

    /// Loads one sheet of the persisted template.
    pub fn load_template(&self, sheet_name: &str) -> Result<Table, SheetMergerError> {
        let source = self.template_source()?;
        loader::load(&source, Some(sheet_name))
    }

    /// Replaces the template with `bytes` and clears `session`.
    ///
    /// The bytes must open as a workbook. They are written next to the
    /// template and renamed over it, so a failed write keeps the old file.
    #[instrument(name = "session::install_template", level = "info", skip_all, fields(bytes = bytes.len()))]
    pub fn install_template(&self, bytes: &[u8], session: &mut Session) -> Result<PathBuf, SheetMergerError> {
        let upload = Source::upload(self.config.template_file.to_owned(), bytes.to_vec());
        spreadsheet::sheet_names(&upload).with_prefix("Rejected template")?;

        let path = self.template_path();
        let directory = self.config.data_path();
        fs::create_dir_all(&directory)?;
        let staging = directory.join(format!(".{}.tmp", self.config.template_file));
        fs::write(&staging, bytes)?;
        if let Err(error) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(error.into());
        }
        session.reset();
        info!(path = %path.display(), "installed template");
        Ok(path)
    }

    /// Deletes the template and clears `session`. Returns false when there was none.
    pub fn remove_template(&self, session: &mut Session) -> Result<bool, SheetMergerError> {
        let path = self.template_path();
        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => false,
            Err(error) => Err(error)?,
        };
        session.reset();
        if removed {
            info!(path = %path.display(), "removed template");
        }
        Ok(removed)
    }

    /// Writes a result table to `path`, or to the configured fill output.
    pub fn write_filled(&self, table: &Table, path: Option<&Path>) -> Result<PathBuf, SheetMergerError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| self.config.filled_output_path());
        spreadsheet::writer::write_xlsx_file(table, &path)?;
        Ok(path)
    }

    /// Writes a result table to `path`, or to the configured merge output.
    pub fn write_merged(&self, table: &Table, path: Option<&Path>) -> Result<PathBuf, SheetMergerError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| self.config.merged_output_path());
        spreadsheet::writer::write_xlsx_file(table, &path)?;
        Ok(path)
    }
}

/// Mapping state of one user working against the template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    column_mapping: ColumnMapping,
    merge_keys: Vec<String>,
    confirmed: bool,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn column_mapping(&self) -> &ColumnMapping {
        &self.column_mapping
    }

    pub fn merge_keys(&self) -> &[String] {
        &self.merge_keys
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Forgets the current mapping.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    /// Accepts a mapping built by the user. It must map at least one column.
    pub fn confirm(&mut self, mapping: ColumnMapping, keys: Vec<String>) -> Result<(), SessionError> {
        if mapping.is_empty() {
            return Err(SessionError::NoMappedColumns);
        }
        self.column_mapping = mapping;
        self.merge_keys = keys;
        self.confirmed = true;
        Ok(())
    }

    /// Takes over a saved mapping document as the confirmed mapping.
    pub fn apply(&mut self, saved: SavedMapping) {
        self.column_mapping = saved.column_mapping;
        self.merge_keys = saved.merge_keys;
        self.confirmed = true;
    }

    /// The current mapping in its persisted form.
    pub fn to_saved(&self) -> Result<SavedMapping, SessionError> {
        self.ensure_confirmed()?;
        Ok(SavedMapping {
            column_mapping: self.column_mapping.to_owned(),
            merge_keys: self.merge_keys.to_owned(),
        })
    }

    /// Saves the confirmed mapping under `name`.
    pub fn save(&self, store: &MappingStore, name: &str) -> Result<PathBuf, SheetMergerError> {
        self.ensure_confirmed()?;
        store.save(name, &self.column_mapping, &self.merge_keys)
    }

    /// Fills the template from the source with the confirmed mapping.
    pub fn fill(&self, template: &Table, source: &Table, options: FillOptions) -> Result<Table, SheetMergerError> {
        self.ensure_confirmed()?;
        Ok(engine::fill_with(template, source, &self.column_mapping, options))
    }

    /// Joins the template (left, suffix `_A`) with the source (right, suffix `_B`).
    ///
    /// Merge keys are template column names. The template is renamed through
    /// the mapping first, so every key has to be mapped.
    pub fn merge(&self, template: &Table, source: &Table, mode: JoinMode) -> Result<Table, SheetMergerError> {
        self.ensure_confirmed()?;
        let mut keys = Vec::with_capacity(self.merge_keys.len());
        for key in &self.merge_keys {
            match self.column_mapping.get(key) {
                Some(source_key) => keys.push(source_key.to_owned()),
                None => Err(JoinError::MissingKeys(format!("'{key}' is not mapped to a source column")))?,
            }
        }
        engine::join(template, source, &self.column_mapping, &keys, mode)
    }

    fn ensure_confirmed(&self) -> Result<(), SessionError> {
        if self.confirmed {
            Ok(())
        } else {
            Err(SessionError::MappingNotConfirmed)
        }
    }
}

/// First values of one mapped column pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub template_column: String,
    pub source_column: String,
    pub template_value: String,
    pub source_value: String,
}

/// What a mapping would combine, shown before it is confirmed.
#[derive(Clone, Debug, PartialEq)]
pub struct Preview {
    pub template_rows: usize,
    pub source_rows: usize,
    pub samples: Vec<Sample>,
}

/// Samples the first non-null value of each side of every mapped pair.
pub fn preview(template: &Table, source: &Table, mapping: &ColumnMapping) -> Preview {
    let sample = |table: &Table, name: &str| -> String {
        table
            .column(name)
            .and_then(|column| column.first_non_null())
            .map(|value| value.to_string().chars().take(PREVIEW_WIDTH).collect())
            .unwrap_or_default()
    };
    let samples = mapping
        .iter()
        .map(|(template_column, source_column)| Sample {
            template_column: template_column.to_owned(),
            source_column: source_column.to_owned(),
            template_value: sample(template, template_column),
            source_value: sample(source, source_column),
        })
        .collect();
    Preview {
        template_rows: template.row_count(),
        source_rows: source.row_count(),
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::table::Value;
    use tempfile::TempDir;

    fn workspace(directory: &TempDir) -> Workspace {
        Workspace::new(Config {
            home: directory.path().to_path_buf(),
            ..Config::default()
        })
    }

    fn template() -> Table {
        Table::new(vec![
            Column::new("No", vec![Value::Null, Value::Null]),
            Column::new("Code", vec![Value::from("a"), Value::from("b")]),
            Column::new("Qty", vec![Value::Null, Value::Null]),
        ])
        .unwrap()
    }

    fn source() -> Table {
        Table::new(vec![
            Column::new("code", vec![Value::from("b"), Value::from("c")]),
            Column::new("quantity", vec![Value::Int(5), Value::Int(6)]),
        ])
        .unwrap()
    }

    fn mapping() -> ColumnMapping {
        [("Code", "code"), ("Qty", "quantity")]
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn operations_need_a_confirmed_mapping() {
        let session = Session::new();
        let error = session.fill(&template(), &source(), FillOptions::default()).unwrap_err();
        assert!(matches!(error, SheetMergerError::SessionError(SessionError::MappingNotConfirmed)));
        assert_eq!(session.to_saved(), Err(SessionError::MappingNotConfirmed));

        let mut session = Session::new();
        assert_eq!(session.confirm(ColumnMapping::new(), vec![]), Err(SessionError::NoMappedColumns));
        assert!(!session.is_confirmed());
    }

    #[test]
    fn fills_and_merges_through_the_mapping() {
        let mut session = Session::new();
        session.confirm(mapping(), vec!["Code".to_owned()]).unwrap();

        let filled = session.fill(&template(), &source(), FillOptions::default()).unwrap();
        assert_eq!(filled.column("No").unwrap().values, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(filled.column("Qty").unwrap().values, vec![Value::Int(5), Value::Int(6)]);

        let merged = session.merge(&template(), &source(), JoinMode::Outer).unwrap();
        assert_eq!(merged.column_names(), vec!["No", "code", "quantity_A", "quantity_B"]);
        assert_eq!(
            merged.column("code").unwrap().values,
            vec![Value::from("a"), Value::from("b"), Value::from("c")]
        );
        assert_eq!(
            merged.column("quantity_B").unwrap().values,
            vec![Value::Null, Value::Int(5), Value::Int(6)]
        );
    }

    #[test]
    fn merge_keys_must_be_mapped() {
        let mut session = Session::new();
        session.confirm(mapping(), vec!["No".to_owned()]).unwrap();
        let error = session.merge(&template(), &source(), JoinMode::Inner).unwrap_err();
        assert!(matches!(error, SheetMergerError::JoinError(JoinError::MissingKeys(_))));
    }

    #[test]
    fn previews_first_values() {
        let source = Table::new(vec![
            Column::new("code", vec![Value::Null, Value::from("a very long code value here")]),
            Column::new("quantity", vec![Value::Null, Value::Null]),
        ])
        .unwrap();
        let preview = preview(&template(), &source, &mapping());
        assert_eq!(preview.template_rows, 2);
        assert_eq!(preview.samples[0].template_value, "a");
        assert_eq!(preview.samples[0].source_value, "a very long code val");
        assert_eq!(preview.samples[1].source_value, "");
    }

    #[test]
    fn template_lifecycle_resets_the_session() {
        let directory = TempDir::new().unwrap();
        let workspace = workspace(&directory);
        let mut session = Session::new();
        assert!(!workspace.has_template());
        assert!(matches!(workspace.template_source(), Err(SessionError::TemplateMissing(_))));

        let mut bytes = std::io::Cursor::new(Vec::new());
        bytes = spreadsheet::writer::write_grid(
            "Sheet1",
            &[vec![Value::from("Code")], vec![Value::Null], vec![Value::from("a")]],
            bytes,
        )
        .unwrap();

        session.confirm(mapping(), vec![]).unwrap();
        let path = workspace.install_template(&bytes.into_inner(), &mut session).unwrap();
        assert_eq!(path, directory.path().join("data").join("template.xlsx"));
        assert!(!session.is_confirmed());
        assert_eq!(workspace.load_template("Sheet1").unwrap().column_names(), vec!["Code"]);

        let error = workspace.install_template(b"garbage", &mut session).unwrap_err();
        assert!(error.is_parse_failure());
        assert!(workspace.has_template());

        session.confirm(mapping(), vec![]).unwrap();
        assert!(workspace.remove_template(&mut session).unwrap());
        assert!(!session.is_confirmed());
        assert!(!workspace.remove_template(&mut session).unwrap());
    }
}
