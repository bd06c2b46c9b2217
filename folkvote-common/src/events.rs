//! Notification event types and the event bus
//!
//! The voting core communicates with the (external) notification/mailer
//! subsystem through broadcast events. Delivery is fire-and-forget: an
//! emit never fails the transaction that produced it, and having no
//! subscribers is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification events emitted by the voting core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    /// A user voted on someone else's cover
    ///
    /// Emitted only when the vote is newly created and the voter is not
    /// the cover's submitter.
    VoteReceived {
        submitter_id: Uuid,
        voter_id: Uuid,
        cover_id: Uuid,
        value: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new cover was added to a song
    ///
    /// Fanned out by the notification consumer to users who previously
    /// voted on the song's other covers.
    NewCoverOnSong {
        song_id: Uuid,
        cover_id: Uuid,
        submitter_id: Option<Uuid>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// One-to-many notification broadcasting over tokio::broadcast
pub struct EventBus {
    tx: broadcast::Sender<NotificationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Old events are dropped once the buffer is full; the notification
    /// subsystem tolerates loss.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: NotificationEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);

        // Must not panic or error with nobody listening
        bus.emit_lossy(NotificationEvent::NewCoverOnSong {
            song_id: Uuid::new_v4(),
            cover_id: Uuid::new_v4(),
            submitter_id: None,
            timestamp: chrono::Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let cover_id = Uuid::new_v4();
        bus.emit_lossy(NotificationEvent::VoteReceived {
            submitter_id: Uuid::new_v4(),
            voter_id: Uuid::new_v4(),
            cover_id,
            value: 1,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            NotificationEvent::VoteReceived { cover_id: got, value, .. } => {
                assert_eq!(got, cover_id);
                assert_eq!(value, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = NotificationEvent::VoteReceived {
            submitter_id: Uuid::new_v4(),
            voter_id: Uuid::new_v4(),
            cover_id: Uuid::new_v4(),
            value: -1,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "VoteReceived");
        assert_eq!(json["value"], -1);
    }
}
