//! # Mapping Store
//!
//! Named column mappings persisted as small JSON documents:
//!
//! ```json
//! {
//!   "column_mapping": { "Template Name": "Source Name" },
//!   "merge_keys": ["Template Name"]
//! }
//! ```
use crate::error::SheetMergerError;
use glob::Pattern;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use tracing::instrument;

/// Template column name -> source column name, in insertion order.
pub type ColumnMapping = IndexMap<String, String>;

const EXTENSION: &str = "json";

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Invalid mapping name '{0}'")]
    InvalidName(String),

    #[error("Mapping '{0}' not found")]
    NotFound(String),

    #[error("Mapping '{0}' is corrupt: {1}")]
    Corrupt(String, String),
}

/// A persisted mapping configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedMapping {
    pub column_mapping: ColumnMapping,
    pub merge_keys: Vec<String>,
}

/// Directory of `<name>.json` mapping documents.
#[derive(Clone, Debug)]
pub struct MappingStore {
    directory: PathBuf,
}

impl MappingStore {
    pub fn new<P: Into<PathBuf>>(directory: P) -> MappingStore {
        MappingStore {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Saves a mapping under `name`, replacing any previous document atomically.
    #[instrument(name = "mapping::save", level = "info", skip(self, mapping, keys))]
    pub fn save(&self, name: &str, mapping: &ColumnMapping, keys: &[String]) -> Result<PathBuf, SheetMergerError> {
        let name = validate_name(name)?;
        let document = SavedMapping {
            column_mapping: mapping.to_owned(),
            merge_keys: keys.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        fs::create_dir_all(&self.directory)?;
        let path = self.path(name);
        let staging = self.directory.join(format!(".{name}.{EXTENSION}.tmp"));
        fs::write(&staging, json)?;
        if let Err(error) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(error.into());
        }
        info!(path = %path.display(), columns = mapping.len(), keys = keys.len(), "saved mapping");
        Ok(path)
    }

    /// Loads the mapping saved under `name`; a trailing `.json` is accepted.
    #[instrument(name = "mapping::load", level = "info", skip(self))]
    pub fn load(&self, name: &str) -> Result<SavedMapping, SheetMergerError> {
        let name = validate_name(name)?;
        let path = self.path(name);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(error) if error.kind() == ErrorKind::NotFound => Err(MappingError::NotFound(name.to_owned()))?,
            Err(error) => Err(error)?,
        };
        let document = serde_json::from_str::<SavedMapping>(&json)
            .map_err(|error| MappingError::Corrupt(name.to_owned(), error.to_string()))?;
        Ok(document)
    }

    /// Names of all saved mappings, sorted.
    pub fn list(&self) -> Result<Vec<String>, SheetMergerError> {
        let pattern = format!(
            "{}/*.{EXTENSION}",
            Pattern::escape(&self.directory.to_string_lossy())
        );
        let mut names = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            if !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{EXTENSION}"))
    }
}

/// Trims the name, strips a `.json` suffix, and rejects names that would leave the store directory.
fn validate_name(name: &str) -> Result<&str, MappingError> {
    let trimmed = name.trim();
    let stem = trimmed.strip_suffix(".json").unwrap_or(trimmed);
    if stem.is_empty() || stem == "." || stem == ".." || stem.contains(['/', '\\']) {
        return Err(MappingError::InvalidName(name.to_owned()));
    }
    Ok(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapping(pairs: &[(&str, &str)]) -> ColumnMapping {
        pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    fn root_error(result: Result<SavedMapping, SheetMergerError>) -> MappingError {
        match result {
            Err(SheetMergerError::MappingError(error)) => error,
            other => panic!("expected mapping error, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_documents() {
        let directory = TempDir::new().unwrap();
        let store = MappingStore::new(directory.path().join("mappings"));
        let columns = mapping(&[("Zeta", "z"), ("Alpha", "a")]);
        let keys = vec!["Zeta".to_owned()];

        let path = store.save("monthly", &columns, &keys).unwrap();
        assert_eq!(path, directory.path().join("mappings").join("monthly.json"));

        let loaded = store.load("monthly.json").unwrap();
        assert_eq!(loaded.column_mapping, columns);
        assert_eq!(loaded.merge_keys, keys);
        assert_eq!(loaded.column_mapping.keys().collect::<Vec<_>>(), vec!["Zeta", "Alpha"]);

        let json = fs::read_to_string(path).unwrap();
        assert!(json.starts_with("{\n  \"column_mapping\": {\n    \"Zeta\": \"z\""));
    }

    #[test]
    fn lists_sorted_names() {
        let directory = TempDir::new().unwrap();
        let store = MappingStore::new(directory.path());
        assert!(store.list().unwrap().is_empty());
        store.save("b", &mapping(&[("x", "y")]), &[]).unwrap();
        store.save("a", &mapping(&[("x", "y")]), &[]).unwrap();
        fs::write(directory.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(store.list().unwrap(), vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn rejects_bad_names() {
        let directory = TempDir::new().unwrap();
        let store = MappingStore::new(directory.path());
        for name in ["", "  ", "..", "../escape", "a/b", "a\\b"] {
            let result = store.save(name, &mapping(&[("x", "y")]), &[]);
            assert!(matches!(result, Err(SheetMergerError::MappingError(MappingError::InvalidName(_)))), "{name}");
        }
    }

    #[test]
    fn reports_missing_and_corrupt_documents() {
        let directory = TempDir::new().unwrap();
        let store = MappingStore::new(directory.path());
        assert!(matches!(root_error(store.load("absent")), MappingError::NotFound(_)));

        fs::write(directory.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(root_error(store.load("broken")), MappingError::Corrupt(..)));

        fs::write(directory.path().join("partial.json"), r#"{"column_mapping": {}}"#).unwrap();
        assert!(matches!(root_error(store.load("partial")), MappingError::Corrupt(..)));
    }
}
