//! Connection liveness monitor.
//!
//! Emits `HEARTBEAT` on a fixed interval and derives the link state from
//! "time since the last `HEARTBEAT_ACK` observed". The state machine has
//! exactly two states: `Disconnected -> Connected` on the first ack,
//! `Connected -> Disconnected` when silence outlasts the timeout window.
//!
//! The monitor exposes only the derived state, never raw timestamps, so the
//! liveness contract survives retuning of the timing constants. Timing runs
//! on the tokio clock; tests pause it and get deterministic transitions.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use podium_bus::BusHandle;
use podium_protocol::BusMessage;

/// Derived connection state for the audience link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No ack within the timeout window (or none ever).
    Disconnected,
    /// An ack arrived recently enough.
    Connected,
}

impl LinkState {
    fn to_u8(self) -> u8 {
        match self {
            LinkState::Disconnected => 0,
            LinkState::Connected => 1,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => LinkState::Connected,
            _ => LinkState::Disconnected,
        }
    }
}

/// Heartbeat timing. The defaults (3 s probe, 10 s timeout, roughly three
/// missed beats) absorb normal message-passing jitter without reporting a
/// disconnect.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Observable link state for UI binding.
///
/// Clones share the underlying state; observers outlive nothing - once the
/// monitor stops, the state reads `Disconnected`.
#[derive(Clone)]
pub struct LinkStateObserver {
    state: Arc<AtomicU8>,
}

impl LinkStateObserver {
    pub fn state(&self) -> LinkState {
        LinkState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }
}

/// Presenter-side heartbeat loop with a start/stop lifecycle.
///
/// Stopping (or dropping) aborts the timer task and resets the derived
/// state; teardown is mandatory or the probe keeps the channel busy for the
/// life of the process.
pub struct ConnectionMonitor {
    state: Arc<AtomicU8>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionMonitor {
    /// Start probing over an open bus handle.
    pub fn start(handle: Arc<BusHandle>, config: HeartbeatConfig) -> Self {
        let state = Arc::new(AtomicU8::new(LinkState::Disconnected.to_u8()));
        let task = tokio::spawn(run(handle, config, Arc::clone(&state)));
        Self {
            state,
            task: Some(task),
        }
    }

    pub fn observer(&self) -> LinkStateObserver {
        LinkStateObserver {
            state: Arc::clone(&self.state),
        }
    }

    /// Stop probing and reset to `Disconnected`.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.state
            .store(LinkState::Disconnected.to_u8(), Ordering::SeqCst);
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

async fn run(handle: Arc<BusHandle>, config: HeartbeatConfig, state: Arc<AtomicU8>) {
    let mut sub = handle.subscribe();
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_ack: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                handle.publish(BusMessage::Heartbeat { timestamp: epoch_millis() });
                let alive = last_ack.is_some_and(|at| at.elapsed() < config.timeout);
                let next = if alive { LinkState::Connected } else { LinkState::Disconnected };
                let prev = LinkState::from_u8(state.swap(next.to_u8(), Ordering::SeqCst));
                if prev == LinkState::Connected && next == LinkState::Disconnected {
                    tracing::warn!(
                        timeout_secs = config.timeout.as_secs(),
                        "Audience link lost: no heartbeat ack within the timeout window"
                    );
                }
            }
            maybe = sub.recv() => {
                match maybe {
                    Some(BusMessage::HeartbeatAck { .. }) => {
                        last_ack = Some(Instant::now());
                        let prev = LinkState::from_u8(
                            state.swap(LinkState::Connected.to_u8(), Ordering::SeqCst),
                        );
                        if prev == LinkState::Disconnected {
                            tracing::info!("Audience link established");
                        }
                    }
                    Some(_) => {}
                    None => {
                        state.store(LinkState::Disconnected.to_u8(), Ordering::SeqCst);
                        break;
                    }
                }
            }
        }
    }
}
