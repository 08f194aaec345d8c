use std::any::Any;
use std::fmt;

/// Why a single item did not produce a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure<E> {
    /// The operation ran to completion and returned an error.
    Failed(E),
    /// The item exceeded the pool's soft timeout and was abandoned.
    Timeout,
    /// The operation panicked; carries the panic message when there was one.
    Panicked(String),
}

impl<E> Failure<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The operation's own error, if that is what happened.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "{e}"),
            Self::Timeout => f.write_str("timed out"),
            Self::Panicked(m) => write!(f, "panicked: {m}"),
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}
