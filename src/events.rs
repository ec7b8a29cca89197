use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ts_rs::TS;
use utoipa::ToSchema;

/// FieldUpdate
///
/// One field-level change to a stored row, broadcast to live admin sessions
/// so open forms can refresh without polling.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FieldUpdate {
    pub collection: String,
    pub row_id: String,
    pub field: String,
    pub value: String,
    /// Account id of the actor who made the change.
    pub updated_by: String,
}

/// FieldUpdateBus
///
/// Injectable publish/subscribe channel for field updates, carried in the
/// application state instead of a process-wide singleton. Delivery is
/// at-least-once to subscribers that exist at publish time; nothing is
/// persisted across restarts. Subscribing hands out a receiver; dropping the
/// receiver is the unsubscribe.
#[derive(Clone)]
pub struct FieldUpdateBus {
    tx: broadcast::Sender<FieldUpdate>,
}

impl FieldUpdateBus {
    /// Creates a bus able to buffer `capacity` in-flight updates per
    /// subscriber before lagging subscribers start missing messages.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// publish
    ///
    /// Delivers the update to all current subscribers. An update published
    /// while nobody is listening is dropped, which is the intended behavior
    /// for a live-refresh channel.
    pub fn publish(&self, update: FieldUpdate) {
        let receivers = self.tx.receiver_count();
        if self.tx.send(update).is_err() {
            tracing::debug!("field update published with no subscribers");
        } else {
            tracing::debug!(receivers, "field update broadcast");
        }
    }

    /// subscribe
    ///
    /// Registers a new subscriber. The returned receiver sees every update
    /// published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<FieldUpdate> {
        self.tx.subscribe()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for FieldUpdateBus {
    fn default() -> Self {
        Self::new(64)
    }
}
