//! Batch Error Types
//!
//! Only batch-level failures live here; per-item failures are recorded in the
//! [`BatchResult`](super::BatchResult) instead.

use cassette_resolve::error::{Error as ResolveError, ErrorKind as ResolveErrorKind};
use derive_more::{Display, Error};

/// A batch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid url: {_0}")]
    InvalidReference(#[error(not(source))] String),
    /// Resolution kept failing with network errors.
    #[display("network unavailable after {_0} attempts")]
    ReattemptExhausted(#[error(not(source))] u32),
    #[display("rejected by host: {_0}")]
    UpstreamRejected(#[error(not(source))] String),
    /// The reference resolved, but to nothing that can be acquired.
    #[display("nothing to download")]
    NothingResolved,
    /// The destination or scratch directory is unusable.
    #[display("{_0}")]
    BatchSetup(#[error(not(source))] String),
    /// Resolution failed for any other reason (missing tool, bad host output).
    #[display("resolution failed")]
    Resolve,
    /// Building the external collaborators failed.
    #[display("{_0}")]
    Setup(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReattemptExhausted(_))
    }

    /// Reclassify a resolution error, preserving its `Exn` frame as a child in
    /// the error tree.
    #[track_caller]
    pub fn resolve(err: ResolveError) -> Error {
        let kind = match &*err {
            ResolveErrorKind::InvalidReference(reference) => Self::InvalidReference(reference.clone()),
            ResolveErrorKind::UpstreamRejected(reason) => Self::UpstreamRejected(reason.clone()),
            ResolveErrorKind::TransientNetwork | ResolveErrorKind::Host(_) => Self::Resolve,
        };
        err.raise(kind)
    }
}
