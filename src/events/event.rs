//! # Lifecycle events emitted by a service.
//!
//! The [`EventKind`] enum classifies events into two groups:
//! - **Service events**: status changes, stop requests, OS signals, handler failures
//! - **Subscriber events**: problems delivering events to a [`Subscribe`](crate::Subscribe) implementor
//!
//! The [`Event`] struct carries optional metadata (source name, statuses, reason).
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use servd::{Event, EventKind, Status};
//!
//! let ev = Event::status_changed("api", Status::Created, Status::Running);
//!
//! assert_eq!(ev.kind, EventKind::StatusChanged);
//! assert_eq!(ev.source.as_deref(), Some("api"));
//! assert_eq!(ev.status, Some(Status::Running));
//! assert_eq!(ev.previous, Some(Status::Created));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::status::Status;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Service events ===
    /// The service moved to a new status.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `previous`: status before the change
    /// - `status`: new status
    StatusChanged,

    /// `stop()` fired the cancellation token of a running handler.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `status`: status at the time of the request
    StopRequested,

    /// An OS termination signal was observed by `run_until_signal`.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `reason`: signal name (e.g. "SIGTERM")
    ShutdownSignal,

    /// The handler returned an error.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `reason`: error message
    HandlerFailed,

    // === Subscriber events ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Process-wide, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Service or subscriber name.
    pub source: Option<Arc<str>>,
    /// Status after the event.
    pub status: Option<Status>,
    /// Status before the event (status changes only).
    pub previous: Option<Status>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            status: None,
            previous: None,
            reason: None,
        }
    }

    /// Attaches the service or subscriber name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches the status after the event.
    #[inline]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a status change event.
    pub fn status_changed(source: impl Into<Arc<str>>, from: Status, to: Status) -> Self {
        let mut ev = Event::new(EventKind::StatusChanged)
            .with_source(source)
            .with_status(to);
        ev.previous = Some(from);
        ev
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    /// True for reports about a subscriber (`SubscriberOverflow`, `SubscriberPanicked`).
    ///
    /// Failing to deliver or handle one of these never produces another report.
    #[inline]
    pub(crate) fn is_subscriber_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
