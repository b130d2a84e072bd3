//! # Handler abstractions.
//!
//! This module provides the handler-related types:
//! - [`Handler`] - trait for the long-running, cancelable unit a service drives
//! - [`HandleFn`] - closure-backed handler implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler>`)

mod handle_fn;
mod handler;

pub use handle_fn::HandleFn;
pub use handler::{Handler, HandlerRef};
