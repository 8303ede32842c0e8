//! Publish contract for pushing events to connected clients.
//!
//! The refresh loop publishes through the [`Publisher`] trait rather than
//! a process-global transport, so the broadcast sink is an injected
//! capability and tests can substitute a recorder. [`BroadcastPublisher`]
//! is the production implementation over a `tokio` broadcast channel;
//! transports (the SSE bridge, a future websocket layer) subscribe to it
//! and forward events as they see fit.

use serde::Serialize;
use tokio::sync::broadcast;

/// Event name fresh global snapshots are published under.
pub const METRICS_EVENT: &str = "metrics:update";

/// Broadcast channel depth. Slow subscribers past this lag and drop the
/// oldest events rather than applying backpressure to the publisher.
const CHANNEL_CAPACITY: usize = 32;

/// One broadcast event: a well-known name plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedEvent {
    /// Event name subscribers dispatch on.
    pub name: String,
    /// Event payload.
    pub payload: serde_json::Value,
}

/// Fire-and-forget broadcast to every connected subscriber.
///
/// No acknowledgement and no ordering guarantee across distinct events.
pub trait Publisher: Send + Sync {
    /// Sends the event to all current subscribers. Never blocks and
    /// never fails; delivery to nobody is a no-op.
    fn broadcast(&self, name: &str, payload: serde_json::Value);
}

/// [`Publisher`] backed by a `tokio` broadcast channel.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<PublishedEvent>,
}

impl BroadcastPublisher {
    /// Creates a publisher with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Opens a new subscription receiving every event broadcast from now
    /// on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for BroadcastPublisher {
    fn broadcast(&self, name: &str, payload: serde_json::Value) {
        let event = PublishedEvent {
            name: name.to_owned(),
            payload,
        };
        match self.tx.send(event) {
            Ok(receivers) => {
                log::debug!("Broadcast {name} to {receivers} subscribers");
            }
            Err(_) => {
                // A send only errors when nobody is subscribed.
                log::debug!("Broadcast {name} with no subscribers, dropped");
            }
        }
    }
}
