//! # Reconciliation Engines
//!
//! Two ways of combining a template table with a source table:
//! [`fill`] copies mapped columns by row position, [`join`] matches rows on
//! merge keys.

pub mod fill;
pub mod join;

pub use fill::fill;
pub use fill::fill_with;
pub use fill::FillOptions;
pub use join::join;
pub use join::JoinMode;
