//! # LogWriter: tracing event renderer
//!
//! A minimal subscriber that renders incoming [`Event`]s as `tracing` records
//! under the `servd::events` target.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO servd::events: status changed service="api" from=Created to=Running
//! INFO servd::events: stop requested service="api"
//! WARN servd::events: handler failed service="api" err="address in use"
//! INFO servd::events: status changed service="api" from=Running to=Stopped
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, EventKind};
use crate::status::Status;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::StatusChanged => {
                let from = e.previous.as_ref().map_or("unknown", Status::name);
                let to = e.status.as_ref().map_or("unknown", Status::name);
                info!(target: "servd::events", service = source, %from, %to, "status changed");
            }
            EventKind::StopRequested => {
                info!(target: "servd::events", service = source, "stop requested");
            }
            EventKind::ShutdownSignal => {
                info!(target: "servd::events", service = source, signal = reason, "shutdown signal received");
            }
            EventKind::HandlerFailed => {
                warn!(target: "servd::events", service = source, err = reason, "handler failed");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "servd::events", subscriber = source, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "servd::events", subscriber = source, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_status_change_renders_plain_names() {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let log = LogWriter::new();
        log.on_event(&Event::status_changed("api", Status::Created, Status::Running))
            .await;
        log.on_event(&Event::subscriber_overflow("audit", "full")).await;

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("status changed"), "{text}");
        assert!(text.contains("from=Created to=Running"), "{text}");
        assert!(!text.contains("Some("), "{text}");
        assert!(text.contains("subscriber dropped event"), "{text}");
    }
}
