//! Metadata Lookup Error Types

use derive_more::{Display, Error};
use exn::ResultExt;

/// A metadata lookup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata lookup operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not reach the service at all.
    #[display("metadata service unreachable")]
    Network,
    /// The service answered with a non-success status.
    #[display("metadata service responded with status {_0}")]
    Status(#[error(not(source))] u16),
    #[display("unexpected response from metadata service")]
    Parse,
    #[display("invalid metadata service URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Status(500..))
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None if err.is_decode() => Self::Parse,
            None => Self::Network,
        }
    }
}

/// Lifts a `reqwest` result, classifying the failure from the error itself.
#[track_caller]
pub(crate) fn http<T>(result: reqwest::Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            let kind = ErrorKind::from_reqwest(&err);
            Err(err).or_raise(|| kind)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Status(503).is_retryable());
        assert!(!ErrorKind::Status(404).is_retryable());
        assert!(!ErrorKind::Parse.is_retryable());
    }
}
