use thiserror::Error;

pub const GENERIC_FETCH_FAILURE: &str = "Failed to fetch video information";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty or malformed URL, caught before any request.
    Validation,
    /// Metadata Service failure: bad status, bad body or network error.
    Service,
    /// An operation was triggered without its required state.
    Precondition,
    Config,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FormError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FormError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, message)
    }

    pub fn service_generic() -> Self {
        Self::new(ErrorKind::Service, GENERIC_FETCH_FAILURE)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transfer, message)
    }
}
