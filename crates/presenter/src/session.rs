//! Presenter session lifecycle.
//!
//! Wires the controller, the resync loop, and the liveness monitor over one
//! bus handle, and tears all of it down together. Teardown is mandatory:
//! it closes any open game, stops the heartbeat timer, and releases the
//! broadcast channel handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use podium_bus::{Bus, BusHandle, BusSubscription};
use podium_domain::DomainError;
use podium_protocol::{BusMessage, Slide};

use crate::controller::PresentationController;
use crate::monitor::{ConnectionMonitor, HeartbeatConfig, LinkStateObserver};

/// A running presenter: canonical state plus the protocol plumbing.
pub struct PresenterSession {
    controller: Arc<Mutex<PresentationController>>,
    monitor: ConnectionMonitor,
    resync_task: JoinHandle<()>,
    handle: Arc<BusHandle>,
}

impl PresenterSession {
    /// Open the lesson channel and start serving resyncs and heartbeats.
    pub fn start(
        bus: &Bus,
        channel: &str,
        slides: Vec<Slide>,
        roster: &[String],
        heartbeat: HeartbeatConfig,
    ) -> Result<Self, DomainError> {
        let handle = Arc::new(bus.open(channel));
        let controller = Arc::new(Mutex::new(PresentationController::new(
            Arc::clone(&handle),
            slides,
            roster,
        )?));

        // Subscribe before spawning: a resync request published right after
        // start() returns must be buffered, not dropped. The protocol has no
        // retry, so a missed STATE_REQUEST leaves that window waiting until
        // the next presenter mutation.
        let resync_sub = handle.subscribe();
        let resync_task = tokio::spawn(serve_resyncs(resync_sub, Arc::clone(&controller)));
        let monitor = ConnectionMonitor::start(Arc::clone(&handle), heartbeat);

        tracing::info!(channel = %channel, "Presenter session started");
        Ok(Self {
            controller,
            monitor,
            resync_task,
            handle,
        })
    }

    /// Lock the controller for a user-driven mutation.
    ///
    /// Mutations publish synchronously inside the lock, so the audience
    /// window never observes a snapshot older than the latest mutation.
    pub fn controller(&self) -> MutexGuard<'_, PresentationController> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Derived audience-link state for the UI.
    pub fn link(&self) -> LinkStateObserver {
        self.monitor.observer()
    }

    /// Ask the audience window to close itself.
    pub fn close_audience(&self) {
        self.handle.publish(BusMessage::CloseAudience);
    }

    /// Tear the session down: close any open game, stop the probe, release
    /// the channel handle.
    pub fn shutdown(mut self) {
        self.controller().teardown();
        self.monitor.stop();
        self.resync_task.abort();
        tracing::info!(channel = %self.handle.channel(), "Presenter session stopped");
    }
}

impl Drop for PresenterSession {
    fn drop(&mut self) {
        self.resync_task.abort();
    }
}

async fn serve_resyncs(mut sub: BusSubscription, controller: Arc<Mutex<PresentationController>>) {
    while let Some(message) = sub.recv().await {
        if matches!(message, BusMessage::StateRequest) {
            controller
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle_resync();
        }
    }
}
