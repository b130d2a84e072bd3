//! # Handler abstraction.
//!
//! A [`Handler`] is the application work a [`Servd`](crate::Servd) runs. It
//! receives a [`CancellationToken`] that fires when the service is asked to
//! stop, and must return promptly after that; the service stays
//! [`Running`](crate::Status::Running) until it does.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # Long-running, cancelable unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use servd::{BoxError, Handler};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Handler for Ticker {
///     async fn handle(&self, ctx: CancellationToken) -> Result<(), BoxError> {
///         // serve until asked to stop
///         ctx.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Runs until the work completes or `ctx` is cancelled.
    ///
    /// Errors are returned unchanged from [`Servd::run`](crate::Servd::run).
    async fn handle(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}
