//! # Closure-backed handler (`HandleFn`)
//!
//! [`HandleFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, so a handler
//! can be written inline without declaring a type.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use servd::{BoxError, HandleFn, HandlerRef};
//!
//! let h: HandlerRef = HandleFn::arc(|ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, BoxError>(())
//! });
//! # let _ = h;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::handlers::handler::Handler;

/// Function-backed handler implementation.
pub struct HandleFn<F> {
    f: F,
}

impl<F> HandleFn<F> {
    /// Wraps a closure.
    ///
    /// Prefer [`HandleFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> std::fmt::Debug for HandleFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Handler for HandleFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn handle(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.f)(ctx).await
    }
}
