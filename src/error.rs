use std::path::Path;
use thiserror::Error;

/// Main error type for the crate.
/// Aggregates errors from various sources including standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum TabError {
    #[error("{0}")]
    WithContextError(String),

    #[error("{0}")]
    AnyhowError(#[from] anyhow::Error),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

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

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Decoder module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),

    #[error("{0}")]
    HtmlError(#[from] crate::html::HtmlError),

    // Caller errors
    #[error("{0}")]
    ConfigError(#[from] ConfigError),

    #[error("Write to '{target}' failed: {source}")]
    DestinationError {
        target: String,
        source: std::io::Error,
    },
}

/// Misuse of the API or unsatisfiable options, detected before any data is decoded or written.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Source must be seekable to read '{0}'")]
    NotSeekable(&'static str),

    #[error("Table header is missing")]
    MissingHeader,

    #[error("No table loaded, call open first")]
    NotOpened,

    #[error("Unknown format '{0}'")]
    UnknownFormat(String),

    #[error("Writing '{0}' is not supported")]
    UnsupportedWriteFormat(&'static str),
}

/// Coarse classification of [`TabError`] for callers deciding how to react.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source could not be opened or read
    SourceAccess,
    /// The content was rejected as malformed
    Decode,
    /// The request itself cannot be satisfied
    Configuration,
    /// The destination could not be created or written
    DestinationAccess,
}

impl TabError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IoError(_) => ErrorKind::SourceAccess,
            Self::HtmlError(crate::html::HtmlError::ReadError(_)) => ErrorKind::SourceAccess,
            Self::ConfigError(_) => ErrorKind::Configuration,
            Self::DestinationError { .. } => ErrorKind::DestinationAccess,
            _ => ErrorKind::Decode,
        }
    }

    /// Reclassifies I/O failures raised while serializing as destination failures.
    pub(crate) fn at_destination(self, target: &str) -> TabError {
        match self {
            Self::IoError(source) | Self::ZipError(zip::result::ZipError::Io(source)) => {
                Self::DestinationError {
                    target: target.to_owned(),
                    source,
                }
            }
            Self::CsvError(error) if error.is_io_error() => match error.into_kind() {
                csv::ErrorKind::Io(source) => Self::DestinationError {
                    target: target.to_owned(),
                    source,
                },
                kind => Self::WithContextError(format!("{target}: {kind:?}")),
            },
            error => error,
        }
    }
}

/// Returns a mapper that turns an I/O error on `path` into a destination failure.
pub(crate) fn destination(path: &Path) -> impl FnOnce(std::io::Error) -> TabError + '_ {
    move |source| TabError::DestinationError {
        target: path.display().to_string(),
        source,
    }
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, TabError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| match e {
            // Only decode failures get the context, others keep their variant
            e if e.kind() != ErrorKind::Decode => e,
            e => TabError::WithContextError(format!("{}: {}", message, e)),
        })
    }
}
