//! Error types for Socket Monitor (sockmon)

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sockmon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
///
/// Field, address and line errors are always scoped to a single table line;
/// [`Error::SourceUnavailable`] is scoped to a single table file. None of them
/// abort a scan.
#[derive(Error, Debug)]
pub enum Error {
    /// A hex token failed strict whole-token conversion
    #[error("malformed field `{token}`: {reason}")]
    MalformedField { token: String, reason: String },

    /// An `address:port` token is missing its separator or has the wrong width
    #[error("malformed address `{token}`: {reason}")]
    MalformedAddress { token: String, reason: String },

    /// A table line could not be turned into a record
    #[error("malformed line: {reason}")]
    MalformedLine {
        reason: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// A connection table could not be opened
    #[error("source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while reading an already opened table
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn field(token: &str, reason: impl Into<String>) -> Self {
        Error::MalformedField {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn address(token: &str, reason: impl Into<String>) -> Self {
        Error::MalformedAddress {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn line(reason: impl Into<String>) -> Self {
        Error::MalformedLine {
            reason: reason.into(),
            source: None,
        }
    }

    /// Wrap a field or address error as a line-scoped error
    pub(crate) fn in_line(self, what: &str) -> Self {
        Error::MalformedLine {
            reason: format!("bad {}", what),
            source: Some(Box::new(self)),
        }
    }

    /// True for errors that only invalidate one line
    pub fn is_line_scoped(&self) -> bool {
        matches!(
            self,
            Error::MalformedField { .. } | Error::MalformedAddress { .. } | Error::MalformedLine { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_line_error_keeps_cause() {
        let err = Error::field("ZZ", "not hex").in_line("state");
        assert!(err.is_line_scoped());
        assert_eq!(err.to_string(), "malformed line: bad state");
        let cause = err.source().expect("cause");
        assert!(cause.to_string().contains("ZZ"));
    }

    #[test]
    fn test_source_unavailable_is_not_line_scoped() {
        let err = Error::SourceUnavailable {
            path: PathBuf::from("/proc/net/udp"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_line_scoped());
        assert!(err.to_string().contains("/proc/net/udp"));
    }
}
