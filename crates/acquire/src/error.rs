//! Acquisition Error Types
//!
//! Every variant is a per-item failure; none of them aborts a batch.

use derive_more::{Display, Error};

/// An acquisition error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for acquisition operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("download failed")]
    Download,
    #[display("conversion failed")]
    Convert,
    #[display("{_0} not detected on your system")]
    ToolNotFound(#[error(not(source))] &'static str),
    #[display("artwork unavailable")]
    Artwork,
    #[display("writing tags failed")]
    Tag,
    #[display("I/O error")]
    Io,
    /// The item ran past its timeout and must not publish anything.
    #[display("abandoned after timeout")]
    Abandoned,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Download | Self::Io)
    }
}
