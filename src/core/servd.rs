//! # Servd: single-shot service lifecycle around one handler.
//!
//! The [`Servd`] owns the service [`Status`], the cancellation token handed to
//! the handler, and the registry of callers blocked in
//! [`Servd::wait_for_status`].
//!
//! ## State machine
//! ```text
//!            run()                       handler returns
//! Created ───────────► Running ─────────────────────────────► Stopped
//!    │                    │ stop(): cancel token (once)          ▲
//!    │                    └──────────────────────────────────────┤
//!    └──────────────────── stop() before run() ──────────────────┘
//! ```
//!
//! ## Rules
//! - Status only moves forward; `Stopped` is terminal.
//! - Status changes, waiter registration and waiter removal happen under one
//!   lock, so a waiter can never miss the transition it waits for.
//! - A status change wakes waiters with non-blocking single-slot sends and
//!   publishes an [`Event`]; neither can stall the service.
//! - The wait context of an observer only ends that observer's wait.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use servd::{BoxError, HandleFn, Servd, Status, WaitContext};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let d = Arc::new(Servd::new(HandleFn::arc(|ctx: CancellationToken| async move {
//!         // wait until shutdown is initiated
//!         ctx.cancelled().await;
//!         Ok::<_, BoxError>(())
//!     })));
//!
//!     let runner = tokio::spawn({
//!         let d = Arc::clone(&d);
//!         async move { d.run().await }
//!     });
//!
//!     let ctx = WaitContext::with_timeout(Duration::from_secs(1));
//!     assert_eq!(d.wait_for_status(&ctx, Status::Running).await?, Status::Running);
//!
//!     d.stop();
//!     assert_eq!(d.wait_for_status(&ctx, Status::Stopped).await?, Status::Stopped);
//!
//!     runner.await??;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::context::WaitContext;
use crate::core::builder::ServdBuilder;
use crate::core::config::Config;
use crate::core::registry::{Registry, WaiterId};
use crate::core::shutdown;
use crate::error::{ContextError, ServdError};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::HandlerRef;
use crate::status::Status;
use crate::subscribers::SubscriberSet;

/// Mutable state guarded by [`Servd::state`].
struct State {
    /// Cancellation token of the running handler; set together with `Running`.
    stop: Option<CancellationToken>,
    registry: Registry,
}

/// Service daemon: drives one handler through `Created → Running → Stopped`.
///
/// All methods take `&self`; share the service between tasks with an `Arc`.
pub struct Servd {
    cfg: Config,
    handler: Option<HandlerRef>,
    /// Lock-free mirror of the status; written only while `state` is locked.
    status: AtomicU8,
    state: Mutex<State>,
    bus: Bus,
    /// Stops the subscriber listener when the service is dropped.
    _listener: Option<DropGuard>,
}

impl Servd {
    /// Creates a service for `handler` with the default [`Config`] and no subscribers.
    pub fn new(handler: HandlerRef) -> Self {
        Self::builder(Config::default()).with_handler(handler).build()
    }

    /// Returns a builder for a service with the given configuration.
    pub fn builder(cfg: Config) -> ServdBuilder {
        ServdBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        handler: Option<HandlerRef>,
        bus: Bus,
        listener: Option<DropGuard>,
    ) -> Self {
        Self {
            cfg,
            handler,
            status: AtomicU8::new(Status::Created as u8),
            state: Mutex::new(State {
                stop: None,
                registry: Registry::new(),
            }),
            bus,
            _listener: listener,
        }
    }

    /// Service name from the configuration.
    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    /// Current status. Never blocks.
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Returns a receiver for the lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of callers currently blocked in [`wait_for_status`](Self::wait_for_status).
    pub fn pending_waiters(&self) -> usize {
        self.lock_state().registry.len()
    }

    /// Runs the handler and returns its result.
    ///
    /// Moves the service to `Running`, hands the handler a fresh cancellation
    /// token, awaits it, then moves the service to `Stopped`. The move to
    /// `Stopped` also happens if this future is dropped or the handler panics.
    ///
    /// ### Errors
    /// - [`ServdError::NoHandler`] if the service was built without a handler
    /// - [`ServdError::CannotRun`] if the service is not `Created` (already
    ///   running, finished, or stopped before it started)
    /// - [`ServdError::Handler`] with the handler's own error
    ///
    /// Configuration and state errors leave the status untouched.
    pub async fn run(&self) -> Result<(), ServdError> {
        let handler = self.handler.clone().ok_or(ServdError::NoHandler)?;

        let token = {
            let mut st = self.lock_state();
            let status = self.status();
            if status != Status::Created {
                return Err(ServdError::CannotRun { status });
            }
            let token = CancellationToken::new();
            st.stop = Some(token.clone());
            self.change_status(&mut st, Status::Running);
            token
        };
        let _stopped = StopOnDrop(self);

        let span = info_span!("servd", service = %self.cfg.name);
        let res = handler.handle(token).instrument(span).await;

        if let Err(e) = &res {
            warn!(service = %self.cfg.name, error = %e, "handler failed");
            self.bus.publish(
                Event::new(EventKind::HandlerFailed)
                    .with_source(self.name())
                    .with_reason(e.to_string()),
            );
        }
        res.map_err(ServdError::Handler)
    }

    /// Runs the service and stops it when the process receives a termination signal.
    ///
    /// After the signal the handler is cancelled and still awaited, so the
    /// result is the handler's result. If signal handlers cannot be installed
    /// a warning is logged and the service simply runs to completion.
    ///
    /// Once installed, tokio's handlers replace the default action of these
    /// signals for the rest of the process: a second Ctrl-C does not kill it.
    /// A handler that ignores its cancellation token keeps the process alive
    /// until something else (e.g. `SIGKILL`) ends it.
    pub async fn run_until_signal(&self) -> Result<(), ServdError> {
        let run = self.run();
        tokio::pin!(run);

        tokio::select! {
            res = &mut run => return res,
            sig = shutdown::wait_for_shutdown_signal() => match sig {
                Ok(signal) => {
                    info!(service = %self.cfg.name, signal, "shutdown signal received");
                    self.bus.publish(
                        Event::new(EventKind::ShutdownSignal)
                            .with_source(self.name())
                            .with_reason(signal),
                    );
                    self.stop();
                }
                Err(e) => {
                    warn!(service = %self.cfg.name, error = %e, "cannot install signal handlers");
                }
            },
        }
        run.await
    }

    /// Waits until the service reaches `target` or `ctx` is done.
    ///
    /// If the status is already `>= target` the current status is returned
    /// immediately, whatever the state of `ctx`. Otherwise the call registers a
    /// waiter and returns the status that released it (`target`, or a later
    /// status when the service skipped over it).
    ///
    /// ### Errors
    /// The [`ContextError`] of `ctx`. The waiter is removed from the registry and
    /// the service is not affected. Dropping the returned future also removes it.
    pub async fn wait_for_status(
        &self,
        ctx: &WaitContext,
        target: Status,
    ) -> Result<Status, ContextError> {
        let (waiter, rx) = {
            let mut st = self.lock_state();
            let current = self.status();
            if current >= target {
                return Ok(current);
            }
            st.registry.register(target)
        };
        let _registration = Deregister {
            servd: self,
            waiter,
        };

        tokio::select! {
            biased;
            woken = rx => Ok(woken.unwrap_or_else(|_| self.status())),
            err = ctx.done() => Err(err),
        }
    }

    /// Requests shutdown.
    ///
    /// - `Created`: moves straight to `Stopped`; the handler never runs.
    /// - `Running`: fires the handler's cancellation token.
    ///
    /// Returns `true` the first time it causes a transition or fires the token,
    /// `false` for every redundant call afterwards (token already fired, or the
    /// service already stopped). Never blocks.
    pub fn stop(&self) -> bool {
        let mut st = self.lock_state();
        match self.status() {
            Status::Created => {
                self.change_status(&mut st, Status::Stopped);
                true
            }
            Status::Running => {
                let Some(token) = st.stop.as_ref().filter(|t| !t.is_cancelled()) else {
                    return false;
                };
                token.cancel();
                info!(service = %self.cfg.name, "stop requested");
                self.bus.publish(
                    Event::new(EventKind::StopRequested)
                        .with_source(self.name())
                        .with_status(Status::Running),
                );
                true
            }
            Status::Stopped => false,
        }
    }

    /// Calls [`stop`](Self::stop) and then waits for `Stopped`.
    pub async fn stop_and_wait(&self, ctx: &WaitContext) -> Result<Status, ContextError> {
        self.stop();
        self.wait_for_status(ctx, Status::Stopped).await
    }

    /// Moves the status forward and wakes every waiter it satisfies.
    ///
    /// Backward or repeated transitions are ignored.
    fn change_status(&self, st: &mut State, next: Status) {
        let prev = self.status();
        if next <= prev {
            return;
        }
        self.status.store(next as u8, Ordering::Release);

        let woken = st.registry.notify(next);
        debug!(service = %self.cfg.name, from = %prev, to = %next, woken, "status changed");
        self.bus
            .publish(Event::status_changed(self.name(), prev, next));
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Servd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Servd")
            .field("name", &self.cfg.name)
            .field("status", &self.status())
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

/// Moves the service to `Stopped` when `run` finishes, however it finishes.
struct StopOnDrop<'a>(&'a Servd);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        let mut st = self.0.lock_state();
        self.0.change_status(&mut st, Status::Stopped);
    }
}

/// Removes an abandoned waiter from the registry.
struct Deregister<'a> {
    servd: &'a Servd,
    waiter: WaiterId,
}

impl Drop for Deregister<'_> {
    fn drop(&mut self) {
        self.servd.lock_state().registry.deregister(self.waiter);
    }
}

/// Subscribes to the bus and forwards events to the subscriber set until `stop` fires.
///
/// The receiver is created before returning, so no event published afterwards is missed.
pub(crate) fn subscriber_listener(bus: &Bus, set: SubscriberSet, stop: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handlers::HandleFn;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    fn wait_for_cancel() -> HandlerRef {
        HandleFn::arc(|ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Ok::<(), BoxError>(())
        })
    }

    fn ctx() -> WaitContext {
        WaitContext::with_timeout(Duration::from_secs(2))
    }

    fn spawn_run(d: &Arc<Servd>) -> tokio::task::JoinHandle<Result<(), ServdError>> {
        let d = Arc::clone(d);
        tokio::spawn(async move { d.run().await })
    }

    async fn until_waiters(d: &Servd, n: usize) {
        while d.pending_waiters() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_run_wait_stop_lifecycle() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        assert_eq!(d.status(), Status::Created);
        let runner = spawn_run(&d);

        assert_eq!(
            d.wait_for_status(&ctx(), Status::Running).await,
            Ok(Status::Running)
        );
        assert!(d.stop());
        assert_eq!(
            d.wait_for_status(&ctx(), Status::Stopped).await,
            Ok(Status::Stopped)
        );

        assert!(runner.await.unwrap().is_ok());
        assert_eq!(d.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_stop_before_run_skips_handler() {
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let d = Servd::new(HandleFn::arc(move |_ctx: CancellationToken| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            }
        }));

        assert!(d.stop());
        assert_eq!(d.status(), Status::Stopped);
        assert!(!d.stop());

        let err = d.run().await.unwrap_err();
        assert!(matches!(
            err,
            ServdError::CannotRun {
                status: Status::Stopped
            }
        ));
        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(d.status(), Status::Stopped);
    }

    #[tokio::test]
    async fn test_run_without_handler() {
        let d = Servd::builder(Config::default()).build();
        let err = d.run().await.unwrap_err();
        assert!(matches!(err, ServdError::NoHandler));
        assert_eq!(d.status(), Status::Created);
    }

    #[tokio::test]
    async fn test_run_twice_is_state_error() {
        let d = Servd::new(HandleFn::arc(|_ctx: CancellationToken| async {
            Ok::<(), BoxError>(())
        }));
        d.run().await.unwrap();
        assert_eq!(d.status(), Status::Stopped);

        let err = d.run().await.unwrap_err();
        assert!(matches!(
            err,
            ServdError::CannotRun {
                status: Status::Stopped
            }
        ));
        assert_eq!(d.status(), Status::Stopped);
    }

    #[tokio::test]
    async fn test_run_while_running_is_state_error() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        let runner = spawn_run(&d);
        d.wait_for_status(&ctx(), Status::Running).await.unwrap();

        let err = d.run().await.unwrap_err();
        assert!(matches!(
            err,
            ServdError::CannotRun {
                status: Status::Running
            }
        ));
        assert_eq!(d.status(), Status::Running);

        assert!(d.stop());
        assert!(runner.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let d = Servd::new(HandleFn::arc(|_ctx: CancellationToken| async {
            Err::<(), BoxError>(
                std::io::Error::new(std::io::ErrorKind::AddrInUse, "bind failed").into(),
            )
        }));
        let mut events = d.subscribe();

        let err = d.run().await.unwrap_err();
        assert_eq!(err.to_string(), "bind failed");
        let inner = err.into_handler_error().unwrap();
        let io = inner.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::AddrInUse);
        assert_eq!(d.status(), Status::Stopped);

        let mut failed = false;
        while let Ok(ev) = events.try_recv() {
            failed |= ev.kind == EventKind::HandlerFailed;
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_stop_fires_cancellation_once() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        let runner = spawn_run(&d);
        d.wait_for_status(&ctx(), Status::Running).await.unwrap();

        assert!(d.stop());
        assert!(!d.stop());
        assert!(runner.await.unwrap().is_ok());
        assert!(!d.stop());
    }

    #[tokio::test]
    async fn test_fast_path_ignores_expired_context() {
        let d = Servd::new(wait_for_cancel());
        let expired = WaitContext::with_timeout(Duration::ZERO);

        assert_eq!(
            d.wait_for_status(&expired, Status::Created).await,
            Ok(Status::Created)
        );

        d.stop();
        assert_eq!(
            d.wait_for_status(&expired, Status::Running).await,
            Ok(Status::Stopped)
        );
        assert_eq!(d.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_expired_context_leaves_no_waiter() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        let expired = WaitContext::with_timeout(Duration::ZERO);

        assert_eq!(
            d.wait_for_status(&expired, Status::Running).await,
            Err(ContextError::DeadlineExceeded)
        );
        assert_eq!(d.pending_waiters(), 0);
        assert_eq!(d.status(), Status::Created);

        let runner = spawn_run(&d);
        assert_eq!(
            d.wait_for_status(&ctx(), Status::Running).await,
            Ok(Status::Running)
        );
        assert_eq!(d.stop_and_wait(&ctx()).await, Ok(Status::Stopped));
        assert!(runner.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_wait_does_not_touch_service() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        let wait_ctx = WaitContext::background();

        let waiter = tokio::spawn({
            let d = Arc::clone(&d);
            let wait_ctx = wait_ctx.clone();
            async move { d.wait_for_status(&wait_ctx, Status::Stopped).await }
        });
        until_waiters(&d, 1).await;

        wait_ctx.cancel();
        assert_eq!(waiter.await.unwrap(), Err(ContextError::Canceled));
        assert_eq!(d.pending_waiters(), 0);
        assert_eq!(d.status(), Status::Created);
        assert!(d.stop());
    }

    #[tokio::test]
    async fn test_dropped_wait_deregisters() {
        let d = Servd::new(wait_for_cancel());
        let background = WaitContext::background();

        let res = tokio::time::timeout(
            Duration::from_millis(10),
            d.wait_for_status(&background, Status::Running),
        )
        .await;
        assert!(res.is_err());
        assert_eq!(d.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_waiter_released_when_status_is_skipped() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        let waiter = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.wait_for_status(&ctx(), Status::Running).await }
        });
        until_waiters(&d, 1).await;

        assert!(d.stop());
        assert_eq!(waiter.await.unwrap(), Ok(Status::Stopped));
        assert_eq!(d.pending_waiters(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_waiters_all_woken() {
        let d = Arc::new(Servd::new(wait_for_cancel()));
        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let d = Arc::clone(&d);
                tokio::spawn(async move { d.wait_for_status(&ctx(), Status::Running).await })
            })
            .collect();

        let runner = spawn_run(&d);
        for w in waiters {
            assert_eq!(w.await.unwrap(), Ok(Status::Running));
        }

        assert!(d.stop());
        assert!(runner.await.unwrap().is_ok());
        assert_eq!(d.status(), Status::Stopped);
    }

    #[tokio::test]
    async fn test_dropped_run_still_stops() {
        let d = Servd::new(wait_for_cancel());
        let res = tokio::time::timeout(Duration::from_millis(10), d.run()).await;
        assert!(res.is_err());
        assert_eq!(d.status(), Status::Stopped);
        assert!(!d.stop());
    }

    #[tokio::test]
    async fn test_status_events_are_ordered() {
        let d = Servd::builder(Config::named("svc"))
            .with_handler(HandleFn::arc(|_ctx: CancellationToken| async {
                Ok::<(), BoxError>(())
            }))
            .build();
        let mut events = d.subscribe();
        d.run().await.unwrap();

        let mut seen = Vec::new();
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::StatusChanged {
                assert_eq!(ev.source.as_deref(), Some("svc"));
                seen.push((ev.previous.unwrap(), ev.status.unwrap()));
            }
        }
        assert_eq!(
            seen,
            vec![
                (Status::Created, Status::Running),
                (Status::Running, Status::Stopped)
            ]
        );
    }

    struct Faulty {
        name: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::subscribers::Subscribe for Faulty {
        async fn on_event(&self, _ev: &Event) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("{} always fails", self.name);
        }
        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_panicking_subscribers_settle() {
        let faulty = |name| {
            Arc::new(Faulty {
                name,
                calls: AtomicUsize::new(0),
            })
        };
        let (a, b) = (faulty("a"), faulty("b"));
        let d = Servd::builder(Config::named("svc"))
            .with_handler(HandleFn::arc(|_ctx: CancellationToken| async {
                Ok::<(), BoxError>(())
            }))
            .with_subscribers(vec![
                a.clone() as Arc<dyn crate::subscribers::Subscribe>,
                b.clone() as _,
            ])
            .build();
        let mut events = d.subscribe();
        d.run().await.unwrap();

        // 2 status changes each, then one report from the other subscriber per panic
        let calls = || a.calls.load(Ordering::SeqCst) + b.calls.load(Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(1), async {
            while calls() < 8 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(a.calls.load(Ordering::SeqCst), 4);
        assert_eq!(b.calls.load(Ordering::SeqCst), 4);

        let mut panicked = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::SubscriberPanicked {
                panicked += 1;
            }
        }
        assert_eq!(panicked, 4);
    }

    #[tokio::test]
    async fn test_run_until_signal_returns_handler_result() {
        let d = Servd::new(HandleFn::arc(|_ctx: CancellationToken| async {
            Ok::<(), BoxError>(())
        }));
        assert!(d.run_until_signal().await.is_ok());
        assert_eq!(d.status(), Status::Stopped);
    }
}
