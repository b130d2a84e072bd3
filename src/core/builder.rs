use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::Config, servd::Servd, servd::subscriber_listener};
use crate::{
    events::Bus,
    handlers::HandlerRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Servd`] with optional features.
pub struct ServdBuilder {
    cfg: Config,
    handler: Option<HandlerRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServdBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            handler: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the handler the service runs.
    ///
    /// Without a handler the service builds fine, but `run` fails with
    /// [`ServdError::NoHandler`](crate::ServdError::NoHandler).
    pub fn with_handler(mut self, handler: HandlerRef) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the service.
    ///
    /// With subscribers configured this spawns their workers and must be called
    /// from within a tokio runtime; without subscribers it spawns nothing.
    pub fn build(self) -> Servd {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            let stop = CancellationToken::new();
            subscriber_listener(&bus, set, stop.clone());
            Some(stop.drop_guard())
        };

        Servd::new_internal(self.cfg, self.handler, bus, listener)
    }
}
