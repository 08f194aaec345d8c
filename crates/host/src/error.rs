//! Media Host Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! The first three variants are the classifications the rest of the pipeline
//! actually branches on; see [`ErrorKind::is_retryable`].

use derive_more::{Display, Error};

/// A media host error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media host operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported reference. Terminal; retrying cannot help.
    #[display("invalid reference: {_0}")]
    InvalidReference(#[error(not(source))] String),
    /// Name resolution or connectivity failure. Worth retrying.
    #[display("network unavailable")]
    TransientNetwork,
    /// The host explicitly refused this item (deleted, private, region
    /// locked...). Terminal for that item.
    #[display("rejected by host: {_0}")]
    UpstreamRejected(#[error(not(source))] String),
    /// A required external program is not installed.
    #[display("{_0} not detected on your system")]
    ToolNotFound(#[error(not(source))] &'static str),
    /// An external program failed in a way we could not classify.
    #[display("{_0}")]
    ToolFailed(#[error(not(source))] String),
    /// The host answered, but not with anything we could make sense of.
    #[display("unexpected response from host")]
    Parse,
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork)
    }
}
