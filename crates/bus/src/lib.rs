//! Typed broadcast transport between presenter and audience windows.
//!
//! Wraps a process-wide, same-origin pub/sub primitive with the contract the
//! sync protocol is built on:
//!
//! - delivery is at-most-once and fire-and-forget: publishing with no
//!   listener is silently dropped, with no error and no retry;
//! - a slow receiver that overflows the channel loses the oldest messages
//!   and keeps going - acceptable because every state-bearing message is a
//!   self-contained snapshot ("last write observed wins");
//! - a handle **must** be closed (dropped) on component teardown, or the
//!   channel and its resources leak for the life of the process; closing the
//!   last handle of a channel tears the channel down.
//!
//! One handle is opened per logical participant (presenter, audience);
//! logical topics multiplex over the one physical channel by message-type
//! discrimination.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use podium_protocol::BusMessage;

/// Buffered messages per channel before a slow receiver starts lagging.
///
/// Deliberately small: the protocol has no use for deep history, and a
/// lagging audience should jump forward, not replay stale snapshots.
const CHANNEL_CAPACITY: usize = 16;

struct ChannelEntry {
    tx: broadcast::Sender<BusMessage>,
    handles: usize,
}

type Registry = Arc<Mutex<HashMap<String, ChannelEntry>>>;

/// The same-origin broadcast scope.
///
/// Participants that share a `Bus` (clones included) can reach each other;
/// nothing else can. Equivalent to the browser's origin boundary.
#[derive(Clone, Default)]
pub struct Bus {
    registry: Registry,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a handle on a named channel, creating the channel on first open.
    pub fn open(&self, channel: &str) -> BusHandle {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = registry.entry(channel.to_string()).or_insert_with(|| {
            tracing::debug!(channel = %channel, "Broadcast channel created");
            ChannelEntry {
                tx: broadcast::channel(CHANNEL_CAPACITY).0,
                handles: 0,
            }
        });
        entry.handles += 1;
        BusHandle {
            channel: channel.to_string(),
            tx: entry.tx.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

/// One participant's handle on a channel.
///
/// Dropping the handle is the teardown path; `close()` only makes it
/// explicit at call sites.
pub struct BusHandle {
    channel: String,
    tx: broadcast::Sender<BusMessage>,
    registry: Registry,
}

impl BusHandle {
    /// Publish fire-and-forget. A message nobody is listening for is
    /// dropped silently per the transport contract - callers must never
    /// assume delivery.
    pub fn publish(&self, message: BusMessage) {
        if self.tx.send(message).is_err() {
            tracing::trace!(channel = %self.channel, "Published with no listener; dropped");
        }
    }

    /// Subscribe to everything published on this channel from now on.
    ///
    /// A handle can carry several subscriptions (e.g. the resync loop and
    /// the liveness monitor); they still share the one physical channel.
    pub fn subscribe(&self) -> BusSubscription {
        BusSubscription {
            channel: self.channel.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Channel name this handle was opened on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Release the handle; the last close releases the channel itself.
    pub fn close(self) {}
}

impl Drop for BusHandle {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = registry.get_mut(&self.channel) {
            entry.handles -= 1;
            if entry.handles == 0 {
                registry.remove(&self.channel);
                tracing::debug!(channel = %self.channel, "Broadcast channel released");
            }
        }
    }
}

/// Receiving side of a channel.
pub struct BusSubscription {
    channel: String,
    rx: broadcast::Receiver<BusMessage>,
}

impl BusSubscription {
    /// Receive the next message, or `None` once the channel is gone
    /// (every handle closed).
    ///
    /// Overflow is not an error here: the oldest messages are skipped and
    /// reception continues, which is exactly the last-write-wins contract.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        channel = %self.channel,
                        skipped = skipped,
                        "Receiver lagged; skipping to newer messages"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive without waiting; `None` when nothing is buffered (or the
    /// channel is gone). Publishing is synchronous, so a caller that just
    /// published can drain its own traffic with this.
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(
                    broadcast::error::TryRecvError::Empty
                    | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_listener_is_silently_dropped() {
        let bus = Bus::new();
        let handle = bus.open("lesson");
        // No subscriber exists; this must not panic or error.
        handle.publish(BusMessage::StateRequest);
    }

    #[tokio::test]
    async fn two_participants_on_one_channel_cross_deliver() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = bus.open("lesson");

        let mut from_presenter = audience.subscribe();
        let mut from_audience = presenter.subscribe();

        audience.publish(BusMessage::StateRequest);
        presenter.publish(BusMessage::Heartbeat { timestamp: 5 });

        assert_eq!(from_audience.recv().await, Some(BusMessage::StateRequest));
        // The audience subscription also sees its own publish first; the
        // transport is a broadcast, not a point-to-point link.
        assert_eq!(from_presenter.recv().await, Some(BusMessage::StateRequest));
        assert_eq!(
            from_presenter.recv().await,
            Some(BusMessage::Heartbeat { timestamp: 5 })
        );
    }

    #[tokio::test]
    async fn lagged_receiver_skips_forward_instead_of_failing() {
        let bus = Bus::new();
        let handle = bus.open("lesson");
        let mut sub = handle.subscribe();

        let total = CHANNEL_CAPACITY as u64 * 3;
        for ts in 0..total {
            handle.publish(BusMessage::Heartbeat { timestamp: ts });
        }

        // The first message received is no longer the first published.
        let first = sub.recv().await.expect("channel open");
        assert_ne!(first, BusMessage::Heartbeat { timestamp: 0 });

        // Draining ends on the newest message with nothing lost after it.
        let mut last = first;
        for _ in 1..CHANNEL_CAPACITY {
            last = sub.recv().await.expect("channel open");
        }
        assert_eq!(last, BusMessage::Heartbeat { timestamp: total - 1 });
    }

    #[tokio::test]
    async fn closing_the_last_handle_releases_the_channel() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = bus.open("lesson");
        let mut sub = audience.subscribe();

        presenter.publish(BusMessage::GameClose);
        assert_eq!(sub.recv().await, Some(BusMessage::GameClose));

        presenter.close();
        // One handle still open: the channel survives.
        audience.publish(BusMessage::StudentClear);
        assert_eq!(sub.recv().await, Some(BusMessage::StudentClear));

        audience.close();
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn channels_are_isolated_by_name_and_by_bus() {
        let bus = Bus::new();
        let lesson = bus.open("lesson");
        let other_channel = bus.open("other");
        let other_origin = Bus::new().open("lesson");

        let mut sub = lesson.subscribe();
        other_channel.publish(BusMessage::GameClose);
        other_origin.publish(BusMessage::GameClose);
        lesson.publish(BusMessage::StateRequest);

        // Only the same-name, same-bus publish arrives.
        assert_eq!(sub.recv().await, Some(BusMessage::StateRequest));
    }
}
