//! Resolution Error Types

use cassette_host::error::{Error as HostError, ErrorKind as HostErrorKind};
use derive_more::{Display, Error};

/// A resolution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid reference: {_0}")]
    InvalidReference(#[error(not(source))] String),
    #[display("network unavailable")]
    TransientNetwork,
    #[display("rejected by host: {_0}")]
    UpstreamRejected(#[error(not(source))] String),
    /// Anything else the host failed with (missing tool, garbage output...).
    #[display("media host failure: {_0}")]
    Host(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork)
    }

    /// Reclassify a media host error, preserving the host's `Exn` frame as a
    /// child in the error tree.
    #[track_caller]
    pub fn host(err: HostError) -> Error {
        let kind = match &*err {
            HostErrorKind::InvalidReference(reference) => Self::InvalidReference(reference.clone()),
            HostErrorKind::TransientNetwork => Self::TransientNetwork,
            HostErrorKind::UpstreamRejected(reason) => Self::UpstreamRejected(reason.clone()),
            other => Self::Host(other.to_string()),
        };
        err.raise(kind)
    }
}
