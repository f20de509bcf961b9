//! Conversions from dependency and helper error types into [`Error`].

use super::types::Error;
use crate::common::binary::BinaryError;

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        match err {
            BinaryError::InsufficientData {
                expected,
                available,
            } => Error::Truncated {
                offset: available as u64,
                needed: expected.saturating_sub(available) as u64,
                available: available as u64,
            },
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::CorruptedFile(format!("embedded archive: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_error_becomes_truncated() {
        let err: Error = BinaryError::InsufficientData {
            expected: 10,
            available: 4,
        }
        .into();
        assert!(matches!(
            err,
            Error::Truncated {
                needed: 6,
                available: 4,
                ..
            }
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_io_is_not_recoverable() {
        let err: Error = std::io::Error::other("gone").into();
        assert!(!err.is_recoverable());
    }
}
