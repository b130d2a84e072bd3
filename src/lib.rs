//! # servd
//!
//! **servd** gives a long-running piece of work (a *handler*) a standard
//! service lifecycle: run it, ask it to stop, and wait until it has reached a
//! given status.
//!
//! ## Architecture
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!   run() ──────────►│ Servd                                        │
//!   stop() ─────────►│  - Status (Created → Running → Stopped)      │
//!   wait_for_status()│  - CancellationToken handed to the handler   │
//!        ▲           │  - Registry (target status → oneshot waiters)│
//!        │ wake      │  - Bus (broadcast lifecycle events)          │
//!        └───────────┴──────┬──────────────────────────────┬────────┘
//!                           │ handle(token)                │ Event
//!                           ▼                              ▼
//!                     ┌───────────┐               ┌────────────────┐
//!                     │  Handler  │               │ SubscriberSet  │
//!                     │ (user)    │               │  ─► Subscribe  │
//!                     └───────────┘               └────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──run()──► Running ──handler returns──► Stopped
//! Created ──stop()─────────────────────────────► Stopped   (handler never runs)
//! Running ──stop()──► token cancelled ──handler returns──► Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                 |
//! |-------------------|----------------------------------------------------------|------------------------------------|
//! | **Lifecycle**     | Run, stop and observe a single-shot service.             | [`Servd`], [`Status`]              |
//! | **Handlers**      | Implement the work as a trait object or closure.         | [`Handler`], [`HandleFn`]          |
//! | **Waiting**       | Bound waits by cancellation or deadline.                 | [`WaitContext`]                    |
//! | **Events**        | Observe lifecycle events.                                | [`Event`], [`Subscribe`]           |
//! | **Errors**        | Typed errors for configuration, state and waits.         | [`ServdError`], [`ContextError`]   |
//! | **Configuration** | Name the service and size its event bus.                 | [`Config`], [`ServdBuilder`]       |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber, which renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use servd::{BoxError, Config, HandleFn, Servd, Status, WaitContext};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let d = Arc::new(
//!         Servd::builder(Config::named("worker"))
//!             .with_handler(HandleFn::arc(|ctx: CancellationToken| async move {
//!                 while !ctx.is_cancelled() {
//!                     tokio::time::sleep(Duration::from_millis(10)).await;
//!                 }
//!                 Ok::<_, BoxError>(())
//!             }))
//!             .build(),
//!     );
//!
//!     let runner = tokio::spawn({
//!         let d = Arc::clone(&d);
//!         async move { d.run().await }
//!     });
//!
//!     let ctx = WaitContext::with_timeout(Duration::from_secs(1));
//!     d.wait_for_status(&ctx, Status::Running).await?;
//!     assert_eq!(d.stop_and_wait(&ctx).await?, Status::Stopped);
//!
//!     runner.await??;
//!     Ok(())
//! }
//! ```
mod context;
mod core;
mod error;
mod events;
mod handlers;
mod status;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Config, Servd, ServdBuilder, wait_for_shutdown_signal};
pub use context::WaitContext;
pub use error::{BoxError, ContextError, ServdError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{HandleFn, Handler, HandlerRef};
pub use status::Status;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
