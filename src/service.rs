//! Async alert service.
//!
//! [`AlertService`] owns an [`AlertManager`] on a single tokio task and is
//! driven by three sources:
//!
//! - commands sent through cloneable [`AlertHandle`]s (mpsc + oneshot reply)
//! - navigation changes published on a [`NavigationSignal`] (broadcast)
//! - the earliest pending removal timer (`sleep_until`)
//!
//! Every mutation happens on the service task, so the manager needs no lock.

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::holder::{HolderSnapshot, HolderStats};
use crate::lifecycle::{AlertId, AlertState};
use crate::manager::{AlertManager, BatchReport, RenderOutcome};
use crate::request::AlertRequest;
use crate::surface::Surface;

/// Default capacity of the command channel.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Default capacity of the navigation broadcast channel.
pub const DEFAULT_NAVIGATION_CAPACITY: usize = 16;

/// A route or page change observed by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationEvent {
    /// New location, when the host knows it.
    pub location: Option<String>,
}

impl NavigationEvent {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }
}

/// Publisher of navigation changes.
///
/// Cloneable; every running service subscribed to it sees each change.
#[derive(Debug, Clone)]
pub struct NavigationSignal {
    tx: broadcast::Sender<NavigationEvent>,
}

impl NavigationSignal {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a navigation change. Returns the number of services notified.
    pub fn navigate(&self, event: NavigationEvent) -> usize {
        tracing::debug!(location = ?event.location, "Publishing navigation change");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.tx.subscribe()
    }
}

impl Default for NavigationSignal {
    fn default() -> Self {
        Self::new(DEFAULT_NAVIGATION_CAPACITY)
    }
}

enum Command {
    Render {
        request: AlertRequest,
        reply: oneshot::Sender<Result<RenderOutcome, ServiceError>>,
    },
    RenderBatch {
        requests: Vec<AlertRequest>,
        reply: oneshot::Sender<BatchReport>,
    },
    ClearAll {
        target: Option<String>,
        reply: oneshot::Sender<usize>,
    },
    ClearStamp {
        stamp: String,
        reply: oneshot::Sender<usize>,
    },
    Dismiss {
        id: AlertId,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        target: Option<String>,
        reply: oneshot::Sender<HolderStats>,
    },
    Holders {
        reply: oneshot::Sender<Vec<HolderSnapshot>>,
    },
    State {
        id: AlertId,
        reply: oneshot::Sender<Option<AlertState>>,
    },
}

/// Client side of a running [`AlertService`].
///
/// Every call fails with [`ServiceError::Closed`] once the service stopped.
#[derive(Debug, Clone)]
pub struct AlertHandle {
    tx: mpsc::Sender<Command>,
}

impl AlertHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    /// Render one alert request.
    pub async fn render(&self, request: AlertRequest) -> Result<RenderOutcome, ServiceError> {
        self.call(|reply| Command::Render { request, reply }).await?
    }

    /// Render a batch in severity order.
    pub async fn render_batch(&self, requests: Vec<AlertRequest>) -> Result<BatchReport, ServiceError> {
        self.call(|reply| Command::RenderBatch { requests, reply }).await
    }

    /// Remove every alert, or only those in `target`'s holder.
    pub async fn clear_all(&self, target: Option<&str>) -> Result<usize, ServiceError> {
        let target = target.map(str::to_string);
        self.call(|reply| Command::ClearAll { target, reply }).await
    }

    /// Remove every alert carrying `stamp`.
    pub async fn clear_by_stamp(&self, stamp: &str) -> Result<usize, ServiceError> {
        let stamp = stamp.to_string();
        self.call(|reply| Command::ClearStamp { stamp, reply }).await
    }

    pub async fn dismiss(&self, id: AlertId) -> Result<bool, ServiceError> {
        self.call(|reply| Command::Dismiss { id, reply }).await
    }

    pub async fn stats(&self, target: Option<&str>) -> Result<HolderStats, ServiceError> {
        let target = target.map(str::to_string);
        self.call(|reply| Command::Stats { target, reply }).await
    }

    pub async fn holders(&self) -> Result<Vec<HolderSnapshot>, ServiceError> {
        self.call(|reply| Command::Holders { reply }).await
    }

    pub async fn state(&self, id: AlertId) -> Result<Option<AlertState>, ServiceError> {
        self.call(|reply| Command::State { id, reply }).await
    }
}

/// Tokio task wrapper around an [`AlertManager`].
pub struct AlertService<S> {
    manager: AlertManager<S>,
    commands: mpsc::Receiver<Command>,
    navigation: broadcast::Receiver<NavigationEvent>,
}

impl<S: Surface> AlertService<S> {
    /// Create a service listening to `signal`, and the handle to drive it.
    pub fn new(manager: AlertManager<S>, signal: &NavigationSignal) -> (Self, AlertHandle) {
        Self::with_capacity(manager, signal, DEFAULT_COMMAND_CAPACITY)
    }

    pub fn with_capacity(
        manager: AlertManager<S>,
        signal: &NavigationSignal,
        capacity: usize,
    ) -> (Self, AlertHandle) {
        let (tx, commands) = mpsc::channel(capacity);
        let service = Self {
            manager,
            commands,
            navigation: signal.subscribe(),
        };
        (service, AlertHandle { tx })
    }

    /// Run until cancelled or until every handle is dropped, then hand the
    /// manager back.
    ///
    /// Branch priority: cancellation, navigation, due timers, commands.
    pub async fn run(mut self, cancel: CancellationToken) -> AlertManager<S> {
        tracing::debug!("Alert service started");
        let mut navigation_open = true;

        loop {
            let deadline = self.manager.next_deadline();

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!("Alert service shutting down gracefully");
                    break;
                }
                event = self.navigation.recv(), if navigation_open => match event {
                    Ok(event) => {
                        tracing::trace!(location = ?event.location, "Navigation event received");
                        self.manager.navigation_changed();
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        let (queued, open) = drain_navigation(&mut self.navigation);
                        navigation_open = open;
                        tracing::debug!(missed, queued, "Navigation receiver lagged, treating as one change");
                        self.manager.navigation_changed();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Navigation signal closed");
                        navigation_open = false;
                    }
                },
                _ = wait_for(deadline) => {
                    let removed = self.manager.advance(now());
                    tracing::trace!(removed, "Removal timers fired");
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        tracing::debug!("All alert handles dropped");
                        break;
                    }
                },
            }
        }

        self.manager
    }

    fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller gave up waiting.
        match command {
            Command::Render { request, reply } => {
                let result = self.manager.render(request, now()).map_err(Into::into);
                let _ = reply.send(result);
            }
            Command::RenderBatch { requests, reply } => {
                let _ = reply.send(self.manager.render_batch(requests, now()));
            }
            Command::ClearAll { target, reply } => {
                let _ = reply.send(self.manager.clear_all(target.as_deref()));
            }
            Command::ClearStamp { stamp, reply } => {
                let _ = reply.send(self.manager.clear_by_stamp(&stamp));
            }
            Command::Dismiss { id, reply } => {
                let _ = reply.send(self.manager.dismiss(id));
            }
            Command::Stats { target, reply } => {
                let _ = reply.send(self.manager.stats(target.as_deref()));
            }
            Command::Holders { reply } => {
                let _ = reply.send(self.manager.holders());
            }
            Command::State { id, reply } => {
                let _ = reply.send(self.manager.state(id));
            }
        }
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// Discard the events still queued behind a lag, so the burst counts once.
/// Returns how many were dropped and whether the signal is still open.
fn drain_navigation(rx: &mut broadcast::Receiver<NavigationEvent>) -> (usize, bool) {
    let mut drained = 0;
    loop {
        match rx.try_recv() {
            Ok(_) => drained += 1,
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(broadcast::error::TryRecvError::Empty) => return (drained, true),
            Err(broadcast::error::TryRecvError::Closed) => return (drained, false),
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn wait_for(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
