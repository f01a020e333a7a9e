//! # Sheet Merger
//!
//! Fills a spreadsheet template from a second spreadsheet or CSV file, or
//! merges the two on key columns, driven by a column mapping that can be
//! saved and reloaded as JSON.
//!
//! ## Pipeline
//!
//! - **Loader**: reads `.csv`, `.xlsx` and `.xlsm` sources into a [`Table`].
//!   Workbook sheets use a two-row header: row 1 holds a category label, row 2
//!   a sub-label, and data starts at row 3.
//! - **Mapping store**: named `{ "column_mapping", "merge_keys" }` documents.
//! - **Fill**: copies mapped source columns into the template by row position,
//!   renumbering the first column `1..=N`.
//! - **Join**: inner, left, right or outer join with `_A`/`_B` suffixes on
//!   colliding column names.
//! - **Writer**: serializes any result table as a single-sheet workbook.
//!
//! [`Workspace`] and [`Session`] tie these together the way the
//! `sheet-merger` command line does.

pub mod config;
pub mod engine;
pub mod error;
mod helpers;
pub mod loader;
pub mod mapping;
pub mod session;
pub mod spreadsheet;
pub mod table;

pub use config::Config;
pub use engine::fill;
pub use engine::fill_with;
pub use engine::join;
pub use engine::FillOptions;
pub use engine::JoinMode;
pub use error::SheetMergerError;
pub use helpers::reader::Source;
pub use loader::load;
pub use loader::sheet_names;
pub use mapping::ColumnMapping;
pub use mapping::MappingStore;
pub use mapping::SavedMapping;
pub use session::preview;
pub use session::Session;
pub use session::Workspace;
pub use spreadsheet::read_grid;
pub use spreadsheet::writer::write_grid;
pub use spreadsheet::writer::write_xlsx;
pub use spreadsheet::writer::write_xlsx_file;
pub use table::Column;
pub use table::Table;
pub use table::Value;
