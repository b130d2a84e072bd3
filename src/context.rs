//! # Wait contexts.
//!
//! A [`WaitContext`] bounds how long a caller is willing to wait in
//! [`Servd::wait_for_status`](crate::Servd::wait_for_status). It combines an
//! explicit [`CancellationToken`] with an optional deadline; whichever fires
//! first ends the wait with the matching [`ContextError`].
//!
//! A wait context is owned by the observer. Cancelling it (or letting its
//! deadline pass) abandons that single wait and never touches the service's own
//! shutdown signal.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use servd::{ContextError, WaitContext};
//!
//! let ctx = WaitContext::with_timeout(Duration::from_secs(1));
//! assert!(ctx.err().is_none());
//!
//! ctx.cancel();
//! assert_eq!(ctx.err(), Some(ContextError::Canceled));
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

/// Cancellation and deadline scope for a single wait.
#[derive(Clone, Debug, Default)]
pub struct WaitContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl WaitContext {
    /// A context that never expires on its own; it ends only via [`cancel`](Self::cancel).
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    ///
    /// Timeouts too large to represent are treated as "no deadline".
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context driven by an existing token (e.g. a child of an application-wide token).
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Adds (or tightens) a deadline `timeout` from now.
    pub fn and_timeout(mut self, timeout: Duration) -> Self {
        if let Some(at) = Instant::now().checked_add(timeout) {
            self.deadline = Some(self.deadline.map_or(at, |d| d.min(at)));
        }
        self
    }

    /// Cancels the context. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the error the context is already done with, if any.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(d) if d <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ContextError::Canceled,
                _ = time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_timeout_is_already_expired() {
        let ctx = WaitContext::with_timeout(Duration::ZERO);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_cancel_wins_over_deadline() {
        let ctx = WaitContext::with_timeout(Duration::ZERO);
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
        assert_eq!(ctx.done().await, ContextError::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_after_timeout() {
        let ctx = WaitContext::with_timeout(Duration::from_secs(30));
        assert!(ctx.err().is_none());

        let started = Instant::now();
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_background_ends_only_on_cancel() {
        let ctx = WaitContext::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.err().is_none());

        let clone = ctx.clone();
        tokio::spawn(async move { clone.cancel() });
        assert_eq!(ctx.done().await, ContextError::Canceled);
    }

    #[tokio::test]
    async fn test_and_timeout_keeps_earliest_deadline() {
        let short = WaitContext::with_timeout(Duration::from_secs(1));
        let first = short.deadline().unwrap();
        let ctx = short.and_timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(first));

        let ctx = WaitContext::background().and_timeout(Duration::from_secs(5));
        assert!(ctx.deadline().is_some());
    }
}
