//! Crate-wide error type.
//!
//! Most malformed-input conditions are recovered locally by the importer, so
//! these errors mostly surface from the low-level readers and from the
//! top-level entry points when the byte stream itself is unusable.
use thiserror::Error;

/// Main error type for drawing import operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A header or payload extends past the end of its stream or container
    #[error("Truncated data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A declared record length exceeds the sanity ceiling
    #[error("Record length {length} at offset {offset} exceeds the allowed maximum")]
    LengthOverflow { offset: u64, length: u32 },

    /// Parse error occurred
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Corrupted or malformed data
    #[error("Corrupted data: {0}")]
    CorruptedFile(String),

    /// Shape, picture or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Embedded picture could not be decoded
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error only affects the current record.
    ///
    /// Truncation, overflow and corrupt content are all handled by skipping to
    /// the next sibling record; IO failures are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Io(_))
    }
}

/// Result type for drawing import operations.
pub type Result<T> = std::result::Result<T, Error>;
