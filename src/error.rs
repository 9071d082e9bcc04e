//! Error types for ipgeo.

use thiserror::Error;

use crate::AddressFamily;

/// Error type for ipgeo operations.
///
/// Every variant is fatal to the running tool or to service startup. Query
/// misses are never errors; they surface as `None` from the locator.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact ended before a declared section was complete
    #[error("artifact truncated while reading {section}")]
    Truncated { section: &'static str },

    /// Artifact carries bytes beyond its declared counts
    #[error("artifact has trailing data after the declared string table")]
    TrailingData,

    /// A record references a string that is not in the table
    #[error("string index {index} out of range (table has {len} entries)")]
    IndexOutOfRange { index: u32, len: usize },

    /// A stored string is not valid UTF-8
    #[error("string {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    /// Range starts are not strictly ascending
    #[error("{family} range at position {position} is not above its predecessor")]
    UnorderedRange {
        family: AddressFamily,
        position: u64,
    },

    /// Table grew beyond what a u32 count can describe
    #[error("{0} table exceeds the u32 count limit")]
    TooManyEntries(&'static str),

    /// String longer than its one-byte length prefix allows
    #[error("string of {0} bytes exceeds the 255 byte limit")]
    StringTooLong(usize),

    /// Source CSV row could not be decoded
    #[error("malformed row on line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),

    /// Vendor answered with a non-success status
    #[error("vendor returned HTTP {0}")]
    HttpStatus(u16),

    /// Vendor answered with a body too small to be an archive
    #[error("vendor response too small: {size} bytes (minimum {minimum})")]
    ResponseTooSmall { size: usize, minimum: usize },

    /// Archive container could not be read
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Missing vendor token
    #[error("environment variable {0} was not set")]
    MissingToken(&'static str),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for ipgeo operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a [`Error::MalformedRow`] from anything printable.
    pub(crate) fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Error::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}
