//! Workspace configuration, read from the environment with built-in defaults.

use crate::engine::FillOptions;
use crate::engine::JoinMode;
use std::path::PathBuf;
use tracing::warn;

pub const ENV_HOME: &str = "SHEET_MERGER_HOME";
pub const ENV_JOIN: &str = "SHEET_MERGER_JOIN";
pub const ENV_RENUMBER: &str = "SHEET_MERGER_RENUMBER";

/// Where the workspace lives and how fills and merges behave by default.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Workspace root; relative directories below resolve against it
    pub home: PathBuf,
    /// Directory holding the persisted template
    pub data_dir: String,
    /// Directory holding saved mapping documents
    pub mapping_dir: String,
    pub template_file: String,
    pub filled_output: String,
    pub merged_output: String,
    pub join_mode: JoinMode,
    pub renumber_first_column: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            home: PathBuf::from("."),
            data_dir: "data".to_owned(),
            mapping_dir: "mappings".to_owned(),
            template_file: "template.xlsx".to_owned(),
            filled_output: "filled_template.xlsx".to_owned(),
            merged_output: "merged_output.xlsx".to_owned(),
            join_mode: JoinMode::default(),
            renumber_first_column: true,
        }
    }
}

impl Config {
    /// Reads overrides from `SHEET_MERGER_HOME`, `SHEET_MERGER_JOIN` and `SHEET_MERGER_RENUMBER`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable lookup.
    /// Unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(home) = lookup(ENV_HOME).filter(|home| !home.trim().is_empty()) {
            config.home = PathBuf::from(home);
        }
        if let Some(raw) = lookup(ENV_JOIN) {
            match raw.parse::<JoinMode>() {
                Ok(mode) => config.join_mode = mode,
                Err(error) => warn!(variable = ENV_JOIN, %error, "ignored"),
            }
        }
        if let Some(raw) = lookup(ENV_RENUMBER) {
            match parse_flag(&raw) {
                Some(flag) => config.renumber_first_column = flag,
                None => warn!(variable = ENV_RENUMBER, value = %raw, "ignored, expected true or false"),
            }
        }
        config
    }

    pub fn data_path(&self) -> PathBuf {
        self.home.join(&self.data_dir)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.home.join(&self.mapping_dir)
    }

    pub fn template_path(&self) -> PathBuf {
        self.data_path().join(&self.template_file)
    }

    pub fn filled_output_path(&self) -> PathBuf {
        self.home.join(&self.filled_output)
    }

    pub fn merged_output_path(&self) -> PathBuf {
        self.home.join(&self.merged_output)
    }

    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            renumber_first_column: self.renumber_first_column,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let variables: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| variables.get(name).cloned())
    }

    #[test]
    fn defaults_match_the_workspace_layout() {
        let config = config(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.template_path(), PathBuf::from("./data/template.xlsx"));
        assert_eq!(config.mapping_path(), PathBuf::from("./mappings"));
        assert_eq!(config.filled_output_path(), PathBuf::from("./filled_template.xlsx"));
        assert!(config.fill_options().renumber_first_column);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[(ENV_HOME, "/srv/merger"), (ENV_JOIN, "Outer"), (ENV_RENUMBER, "no")]);
        assert_eq!(config.home, PathBuf::from("/srv/merger"));
        assert_eq!(config.join_mode, JoinMode::Outer);
        assert!(!config.renumber_first_column);
        assert_eq!(config.merged_output_path(), PathBuf::from("/srv/merger/merged_output.xlsx"));
    }

    #[test]
    fn ignores_bad_values() {
        let config = config(&[(ENV_JOIN, "sideways"), (ENV_RENUMBER, "maybe")]);
        assert_eq!(config.join_mode, JoinMode::Inner);
        assert!(config.renumber_first_column);
    }
}
