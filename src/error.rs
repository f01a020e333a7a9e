use thiserror::Error;

/// Main error type for the Sheet Merger crate.
/// Aggregates errors from various sources including standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum SheetMergerError {
    #[error("{message}: {source}")]
    WithContextError {
        message: String,
        #[source]
        source: Box<SheetMergerError>,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    GlobError(#[from] glob::GlobError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    UnifiedReaderError(#[from] crate::helpers::reader::UnifiedReaderError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Core module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    LoaderError(#[from] crate::loader::LoaderError),

    #[error("{0}")]
    MappingError(#[from] crate::mapping::MappingError),

    #[error("{0}")]
    JoinError(#[from] crate::engine::join::JoinError),

    #[error("{0}")]
    SessionError(#[from] crate::session::SessionError),
}

impl SheetMergerError {
    /// Strips any context prefixes and returns the underlying failure.
    pub fn root(&self) -> &SheetMergerError {
        match self {
            SheetMergerError::WithContextError { source, .. } => source.root(),
            _ => self,
        }
    }

    /// Returns true for failures caused by malformed spreadsheet or CSV bytes.
    pub fn is_parse_failure(&self) -> bool {
        match self.root() {
            SheetMergerError::ZipError(_)
            | SheetMergerError::XmlError(_)
            | SheetMergerError::XmlEncodingError(_)
            | SheetMergerError::XmlAttributeError(_)
            | SheetMergerError::XmlHelperError(_)
            | SheetMergerError::CsvError(_) => true,
            SheetMergerError::SpreadsheetError(error) => error.is_malformed(),
            SheetMergerError::LoaderError(error) => matches!(error, crate::loader::LoaderError::ParseFailure(_)),
            _ => false,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetMergerError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetMergerError::WithContextError {
            message: message.to_owned(),
            source: Box::new(e),
        })
    }
}
