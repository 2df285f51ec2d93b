//! Error types for praline-core

use crate::StateId;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The handle was never created by this store
    #[error("No state found for handle: {0}")]
    UnknownHandle(StateId),

    /// The cell behind a handle holds a value of a different type
    #[error("Type mismatch for {id}: expected {expected}")]
    TypeMismatch { id: StateId, expected: &'static str },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
