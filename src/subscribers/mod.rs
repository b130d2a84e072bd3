//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! that drives subscribers, and (behind the `logging` feature) the built-in
//! [`LogWriter`].
//!
//! ## Architecture
//! ```text
//!   Servd ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                     ┌─────────┼─────────┐
//!                                                     ▼         ▼         ▼
//!                                                  worker1   worker2   workerN
//!                                                     ▼         ▼         ▼
//!                                               sub1.on_event ...   subN.on_event
//! ```
//!
//! Subscribers only observe. They cannot delay a status change and are not the
//! mechanism behind [`Servd::wait_for_status`](crate::Servd::wait_for_status).

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
