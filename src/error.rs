//! Error types for the kmlview library.

use std::io;
use thiserror::Error;

/// Result type alias for kmlview operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, laying out or serializing a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The markup is not well-formed (unbalanced tags, invalid entity,
    /// unknown tag or attribute, invalid attribute value).
    #[error("KML parse error: {0}")]
    Parse(String),

    /// Paragraph index is outside the document.
    #[error("Paragraph {index} is out of range (document has {count} paragraphs)")]
    OutOfRange {
        /// Requested paragraph index
        index: usize,
        /// Number of paragraphs in the document
        count: usize,
    },

    /// An inclusive paragraph range whose first index is past its last.
    #[error("Invalid paragraph range: {first}..={last}")]
    InvalidRange {
        /// First index of the range
        first: usize,
        /// Last index of the range (inclusive)
        last: usize,
    },

    /// Parser and format range builder disagree on the paragraph text.
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    /// Error during rendering (KML, JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a parse error that names the offending paragraph.
    pub fn in_paragraph(self, index: usize) -> Self {
        match self {
            Error::Parse(msg) => Error::Parse(format!("paragraph {}: {}", index, msg)),
            other => other,
        }
    }

    /// Check whether this is a markup parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
            _ => Error::Parse(err.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Parse(format!("malformed attribute: {}", err))
    }
}

/// Check `index < count`, producing [`Error::OutOfRange`] otherwise.
pub(crate) fn check_index(index: usize, count: usize) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(Error::OutOfRange { index, count })
    }
}

/// Check that `first..=last` is a non-empty range inside `0..count`.
pub(crate) fn check_range(first: usize, last: usize, count: usize) -> Result<()> {
    if first > last {
        return Err(Error::InvalidRange { first, last });
    }
    check_index(last, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OutOfRange { index: 10, count: 5 };
        assert_eq!(
            err.to_string(),
            "Paragraph 10 is out of range (document has 5 paragraphs)"
        );

        let err = Error::InvalidRange { first: 4, last: 2 };
        assert_eq!(err.to_string(), "Invalid paragraph range: 4..=2");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_in_paragraph_prefixes_parse_errors_only() {
        let err = Error::Parse("unclosed tag <b>".to_string()).in_paragraph(3);
        assert_eq!(err.to_string(), "KML parse error: paragraph 3: unclosed tag <b>");

        let err = Error::OutOfRange { index: 1, count: 0 }.in_paragraph(3);
        assert!(matches!(err, Error::OutOfRange { index: 1, count: 0 }));
    }

    #[test]
    fn test_range_checks() {
        assert!(check_index(0, 1).is_ok());
        assert!(matches!(
            check_index(1, 1),
            Err(Error::OutOfRange { index: 1, count: 1 })
        ));
        assert!(check_range(0, 2, 3).is_ok());
        assert!(matches!(
            check_range(2, 1, 3),
            Err(Error::InvalidRange { first: 2, last: 1 })
        ));
        assert!(matches!(check_range(0, 3, 3), Err(Error::OutOfRange { .. })));
    }
}
