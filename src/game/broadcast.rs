//! Room-scoped event fan-out
//!
//! One broadcast channel per game id. Publishing never blocks and never
//! fails: a room with no listeners simply drops the event, and a
//! disconnected listener is forgotten the moment its receiver is dropped.

use crate::game::types::{Claim, ClaimType};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Live events delivered to a game room.
///
/// Tag and field names are the wire contract; `INIT` is sent directly to a
/// joining listener (exactly once, never broadcast).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GameEvent {
    #[serde(rename = "INIT")]
    Init {
        #[serde(rename = "calledNumbers")]
        called_numbers: Vec<u8>,
    },

    #[serde(rename = "NUMBER_CALLED")]
    NumberCalled { number: u8 },

    #[serde(rename = "CLAIM_SUBMITTED")]
    ClaimSubmitted { claim: Claim },

    #[serde(rename = "CLAIM_APPROVED")]
    ClaimApproved {
        #[serde(rename = "claimType")]
        claim_type: ClaimType,
        #[serde(rename = "claimantName")]
        claimant_name: String,
    },
}

/// A live subscription to one game room.
///
/// Dropping the subscription unsubscribes; nothing else is required on
/// disconnect.
#[derive(Debug)]
pub struct RoomSubscription {
    pub game_id: u64,
    receiver: broadcast::Receiver<GameEvent>,
}

impl RoomSubscription {
    /// Receive the next room event.
    ///
    /// Returns `None` once the room channel is closed. A lagged receiver
    /// (slower than the channel capacity) skips ahead rather than erroring;
    /// capacity is sized far above the 90 calls a game can ever produce.
    pub async fn next_event(&mut self) -> Option<GameEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(game_id = self.game_id, skipped, "room subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Delivers events to every listener of a game room.
///
/// Owned by the process, constructed once at startup, and handed to the
/// session registry and the WebSocket layer by `Arc` handle.
pub struct BroadcastCoordinator {
    rooms: DashMap<u64, broadcast::Sender<GameEvent>>,
    capacity: usize,
}

impl BroadcastCoordinator {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe a new listener to a game room.
    pub fn subscribe(&self, game_id: u64) -> RoomSubscription {
        let receiver = self.sender(game_id).subscribe();
        RoomSubscription { game_id, receiver }
    }

    /// Deliver an event to every current listener of the room.
    ///
    /// Returns the number of listeners the event was queued for. Delivery
    /// failures (no listeners) are normal and swallowed.
    pub fn publish(&self, game_id: u64, event: GameEvent) -> usize {
        match self.rooms.get(&game_id) {
            Some(sender) => match sender.send(event) {
                Ok(count) => count,
                Err(_) => {
                    debug!(game_id, "no listeners in room, event dropped");
                    0
                }
            },
            None => 0,
        }
    }

    /// Currently connected listeners for a room.
    pub fn listener_count(&self, game_id: u64) -> usize {
        self.rooms
            .get(&game_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Drop the channel for a room nobody is listening to.
    pub fn prune(&self, game_id: u64) {
        self.rooms
            .remove_if(&game_id, |_, sender| sender.receiver_count() == 0);
    }

    fn sender(&self, game_id: u64) -> broadcast::Sender<GameEvent> {
        self.rooms
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for BroadcastCoordinator {
    fn default() -> Self {
        // 256 comfortably exceeds a full game (90 numbers + claims).
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_room_scoped_delivery() {
        let coordinator = BroadcastCoordinator::default();
        let mut room_a = coordinator.subscribe(1);
        let mut room_b = coordinator.subscribe(2);

        coordinator.publish(1, GameEvent::NumberCalled { number: 17 });
        coordinator.publish(2, GameEvent::NumberCalled { number: 53 });

        assert_eq!(
            room_a.next_event().await,
            Some(GameEvent::NumberCalled { number: 17 })
        );
        assert_eq!(
            room_b.next_event().await,
            Some(GameEvent::NumberCalled { number: 53 })
        );
    }

    #[tokio::test]
    async fn test_publish_without_listeners_is_silent() {
        let coordinator = BroadcastCoordinator::default();
        assert_eq!(
            coordinator.publish(9, GameEvent::NumberCalled { number: 1 }),
            0
        );
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let coordinator = BroadcastCoordinator::default();
        let subscription = coordinator.subscribe(5);
        assert_eq!(coordinator.listener_count(5), 1);

        drop(subscription);
        assert_eq!(coordinator.listener_count(5), 0);
        assert_eq!(
            coordinator.publish(5, GameEvent::NumberCalled { number: 2 }),
            0
        );

        coordinator.prune(5);
        assert_eq!(coordinator.listener_count(5), 0);
    }

    #[tokio::test]
    async fn test_each_listener_sees_event_once() {
        let coordinator = BroadcastCoordinator::default();
        let mut first = coordinator.subscribe(3);
        let mut second = coordinator.subscribe(3);

        let delivered = coordinator.publish(3, GameEvent::NumberCalled { number: 88 });
        assert_eq!(delivered, 2);

        for sub in [&mut first, &mut second] {
            assert_eq!(
                sub.next_event().await,
                Some(GameEvent::NumberCalled { number: 88 })
            );
        }
    }

    #[test]
    fn test_wire_format() {
        let event = GameEvent::Init {
            called_numbers: vec![4, 17, 90],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "INIT");
        assert_eq!(json["calledNumbers"], serde_json::json!([4, 17, 90]));

        let event = GameEvent::ClaimApproved {
            claim_type: ClaimType::FullHouse,
            claimant_name: "Asha".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CLAIM_APPROVED");
        assert_eq!(json["claimType"], "full_house");
        assert_eq!(json["claimantName"], "Asha");
    }
}
