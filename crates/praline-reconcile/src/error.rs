//! Error types for praline-reconcile

use thiserror::Error;

/// Result type for praline-reconcile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding state to a host tree
#[derive(Debug, Error)]
pub enum Error {
    /// A binding was given an argument it cannot work with
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] praline_core::Error),
}

impl Error {
    /// Check if this error wraps `praline_core::Error::UnknownHandle`
    pub fn is_unknown_handle(&self) -> bool {
        matches!(self, Error::Core(praline_core::Error::UnknownHandle(_)))
    }
}
