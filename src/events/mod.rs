//! Lifecycle events: types and broadcast bus.
//!
//! Every [`Servd`](crate::Servd) owns a [`Bus`] and publishes an [`Event`] on
//! each status change and stop request. Events are purely observational: the
//! status/waiter machinery never depends on them being delivered.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Servd` (status changes, stop requests, handler failures,
//!   OS signals) and `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: [`Servd::subscribe`](crate::Servd::subscribe) receivers and
//!   the listener feeding [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
