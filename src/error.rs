//! Error types used by the servd runtime and handlers.
//!
//! This module defines two error enums:
//!
//! - [`ServdError`]: errors returned by [`Servd::run`](crate::Servd::run):
//!   configuration, state and handler failures.
//! - [`ContextError`]: why a [`WaitContext`](crate::WaitContext) gave up waiting.
//!
//! Both provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

use crate::status::Status;

/// Opaque error returned by a [`Handler`](crate::Handler).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the service runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServdError {
    /// The service was built without a handler.
    #[error("servd: no handler")]
    NoHandler,

    /// `run` was called when the service was no longer in [`Status::Created`].
    #[error("servd: cannot run in status '{status}'")]
    CannotRun {
        /// Status observed when `run` was attempted.
        status: Status,
    },

    /// A wait context was cancelled or its deadline passed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The handler failed; the error is passed through unchanged.
    #[error(transparent)]
    Handler(BoxError),
}

impl ServdError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servd::{ServdError, Status};
    ///
    /// let err = ServdError::CannotRun { status: Status::Stopped };
    /// assert_eq!(err.as_label(), "servd_cannot_run");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServdError::NoHandler => "servd_no_handler",
            ServdError::CannotRun { .. } => "servd_cannot_run",
            ServdError::Context(e) => e.as_label(),
            ServdError::Handler(_) => "servd_handler_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServdError::NoHandler => "no handler configured".to_string(),
            ServdError::CannotRun { status } => format!("cannot run in status {status}"),
            ServdError::Context(e) => e.as_message(),
            ServdError::Handler(e) => format!("handler: {e}"),
        }
    }

    /// Returns the handler's own error, if this is a handler failure.
    pub fn into_handler_error(self) -> Option<BoxError> {
        match self {
            ServdError::Handler(e) => Some(e),
            _ => None,
        }
    }
}

/// # Reasons a wait was abandoned.
///
/// Local to a single wait: it never changes the state of the service.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The wait context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The wait context was cancelled.
    #[error("context canceled")]
    Canceled,
}

impl ContextError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ContextError::DeadlineExceeded => "context_deadline_exceeded",
            ContextError::Canceled => "context_canceled",
        }
    }

    /// Returns a human-readable message.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
