//! Runtime core: the service state machine and its wiring.
//!
//! The public API from this module is [`Servd`], its [`ServdBuilder`] and
//! [`Config`].
//!
//! Internal modules:
//! - [`servd`]: status transitions, stop, waiting, subscriber listener;
//! - [`registry`]: waiters blocked on a target status;
//! - [`builder`]: assembles a service from config, handler and subscribers;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod registry;
mod servd;
mod shutdown;

pub use builder::ServdBuilder;
pub use config::Config;
pub use servd::Servd;
pub use shutdown::wait_for_shutdown_signal;
