//! Board Events
//!
//! Typed notifications for observers (UI, playback). Events are published
//! after a mutation has been persisted and committed, so a subscriber that
//! reads the manager on receipt sees the new state.
//!
//! Subscribing is [`EventBus::subscribe`]; dropping the receiver unsubscribes.

use serde::Serialize;
use soundboard_core::types::{BoardId, SoundId};
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber before the slowest one starts lagging
const DEFAULT_CAPACITY: usize = 64;

/// Events emitted by the board manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BoardEvent {
    /// Initial load (or reload) completed
    Loaded {
        board_count: usize,
        recovered: usize,
        dropped: usize,
    },

    /// The board list changed (boards added, removed, renamed, or sounds changed)
    BoardsChanged { board_count: usize },

    /// A different board (or a renamed current board) is now current
    CurrentBoardChanged { board_id: BoardId, name: String },

    /// A placeholder tile is shown while the file is copied
    SoundProcessing { board_id: BoardId, sid: SoundId },

    /// A sound was copied, persisted, and attached to a board
    SoundAdded {
        board_id: BoardId,
        sid: SoundId,
        uri: String,
    },

    /// Adding a sound failed and its placeholder was rolled back
    SoundAddFailed {
        board_id: BoardId,
        sid: SoundId,
        reason: String,
    },

    /// A sound was removed from a board
    SoundRemoved { board_id: BoardId, sid: SoundId },

    /// A write did not reach the store; in-memory state was left as it was
    PersistenceFailed { key: String, reason: String },

    /// Every playing sound should stop
    StopAllSounds,
}

/// Broadcast channel owned by the board manager
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BoardEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a listener
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.sender.subscribe()
    }

    /// Deliver `event` to every current subscriber
    pub fn publish(&self, event: BoardEvent) {
        trace!(?event, "Publishing board event");
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(BoardEvent::StopAllSounds);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(BoardEvent::StopAllSounds);

        assert_eq!(first.recv().await.unwrap(), BoardEvent::StopAllSounds);
        assert_eq!(second.recv().await.unwrap(), BoardEvent::StopAllSounds);
    }

    #[test]
    fn test_dropping_receiver_unsubscribes() {
        let bus = EventBus::default();
        let receiver = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(receiver);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
