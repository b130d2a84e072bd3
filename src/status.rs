//! # Service lifecycle status.
//!
//! [`Status`] describes the phase a [`Servd`](crate::Servd) is in. The three
//! values form a strictly ordered sequence and a service only ever moves forward:
//!
//! ```text
//! Created ──run()──► Running ──handler returns──► Stopped
//!    │                                               ▲
//!    └──────────────────stop()───────────────────────┘
//! ```
//!
//! `Stopped` is terminal. Because the order is total, "has the service reached
//! `X` yet?" is simply `status >= X`.

use std::fmt;

/// Lifecycle phase of a service.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// The service was created but not started yet.
    #[default]
    Created = 0,
    /// The handler is running.
    Running = 1,
    /// The handler returned, or the service was stopped before it ever ran.
    Stopped = 2,
}

impl Status {
    /// All statuses in lifecycle order.
    pub const ALL: [Status; 3] = [Status::Created, Status::Running, Status::Stopped];

    /// Returns the stable, human-readable name of the status.
    ///
    /// # Example
    /// ```
    /// use servd::Status;
    ///
    /// assert_eq!(Status::Running.name(), "Running");
    /// assert_eq!(Status::Stopped.to_string(), "Stopped");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Status::Created => "Created",
            Status::Running => "Running",
            Status::Stopped => "Stopped",
        }
    }

    /// True for the terminal status.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Stopped)
    }

    /// Decodes the value stored by the service's atomic status cell.
    ///
    /// Out of range values saturate to [`Status::Stopped`].
    #[inline]
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Status::Created,
            1 => Status::Running,
            _ => Status::Stopped,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
