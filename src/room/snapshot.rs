//! Replicated-state broadcast with change detection.
//!
//! After every processed command the coordinator rebuilds the full room
//! projection; only a projection that differs from the previously published
//! one goes out on the wire.

use uuid::Uuid;

use crate::ws::protocol::{GamePhase, Light, RoomSnapshot, ServerMsg};

use super::outbox::Outbox;
use super::players::PlayerRegistry;

/// Builds room projections and suppresses unchanged re-broadcasts
#[derive(Debug, Default)]
pub struct SnapshotBroadcaster {
    last: Option<RoomSnapshot>,
}

impl SnapshotBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the full read-only projection of the room
    pub fn build(
        phase: GamePhase,
        round: u8,
        host_id: Option<Uuid>,
        light: Option<Light>,
        finish_line: u32,
        players: &PlayerRegistry,
    ) -> RoomSnapshot {
        RoomSnapshot {
            phase,
            round,
            host_id,
            light,
            finish_line,
            players: players.snapshots(),
        }
    }

    /// Broadcast the snapshot if it differs from the last published one.
    /// Returns whether a broadcast went out.
    pub fn publish_if_changed(&mut self, snapshot: RoomSnapshot, outbox: &Outbox) -> bool {
        if self.last.as_ref() == Some(&snapshot) {
            return false;
        }
        outbox.broadcast(ServerMsg::RoomState {
            state: snapshot.clone(),
        });
        self.last = Some(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::outbox::test_support::{capturing_outbox, drain};
    use crate::room::players::Player;

    fn snapshot_with_points(players: &PlayerRegistry) -> RoomSnapshot {
        SnapshotBroadcaster::build(GamePhase::Lobby, 1, None, None, 500, players)
    }

    #[test]
    fn unchanged_state_is_not_rebroadcast() {
        let (outbox, mut rx) = capturing_outbox();
        let mut broadcaster = SnapshotBroadcaster::new();
        let mut players = PlayerRegistry::new();
        players.insert(Player::new(
            Uuid::new_v4(),
            "ana".to_string(),
            "#aabbcc".to_string(),
        ));

        assert!(broadcaster.publish_if_changed(snapshot_with_points(&players), &outbox));
        assert!(!broadcaster.publish_if_changed(snapshot_with_points(&players), &outbox));
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn mutated_state_is_rebroadcast() {
        let (outbox, mut rx) = capturing_outbox();
        let mut broadcaster = SnapshotBroadcaster::new();
        let mut players = PlayerRegistry::new();
        let id = Uuid::new_v4();
        players.insert(Player::new(id, "ana".to_string(), "#aabbcc".to_string()));

        broadcaster.publish_if_changed(snapshot_with_points(&players), &outbox);
        players.get_mut(&id).unwrap().award(5);
        assert!(broadcaster.publish_if_changed(snapshot_with_points(&players), &outbox));
        assert_eq!(drain(&mut rx).len(), 2);
    }
}
