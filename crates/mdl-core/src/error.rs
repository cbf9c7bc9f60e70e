//! Error taxonomy shared by the runtime, the worker pool and the strategies.
//!
//! `InvalidInput` and `Dependency` are fatal and abort a run before any job
//! starts. `Download` describes one failed attempt; whether the pool retries
//! it is decided by [`MdlError::is_retryable`].

use thiserror::Error;

use crate::retry::classify_message;

#[derive(Debug, Clone, Error)]
pub enum MdlError {
    /// The request cannot be turned into an invocation (bad URL, bad template).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required external executable could not be located or bootstrapped.
    #[error("dependency error: {0}")]
    Dependency(String),

    /// A single attempt failed. `retryable` is set by the origin for failures
    /// known to be transient regardless of their message (spawn, timeout).
    #[error("{message}")]
    Download { message: String, retryable: bool },
}

impl MdlError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        MdlError::InvalidInput(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        MdlError::Dependency(msg.into())
    }

    /// Attempt failure whose retryability is decided from its message.
    pub fn download(msg: impl Into<String>) -> Self {
        MdlError::Download {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Attempt failure that is retryable whatever its message says.
    pub fn transient(msg: impl Into<String>) -> Self {
        MdlError::Download {
            message: msg.into(),
            retryable: true,
        }
    }

    /// True when the worker pool may schedule another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            MdlError::InvalidInput(_) | MdlError::Dependency(_) => false,
            MdlError::Download { message, retryable } => {
                *retryable || classify_message(message).is_retryable()
            }
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MdlError::Download { .. } => 1,
            MdlError::InvalidInput(_) => 2,
            MdlError::Dependency(_) => 3,
        }
    }
}
