//! Session-scoped player records

use std::collections::HashMap;

use uuid::Uuid;

use crate::ws::protocol::{PlayerSnapshot, PlayerSummary};

/// A connected player's authoritative record
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    /// Cumulative tournament points
    pub points: u32,
    /// Track position, used only during RLGL rounds
    pub position: u32,
    pub puzzles_completed: u32,
    /// Currently a participant of a non-completed 1v1 match
    pub in_game: bool,
    /// Parked as the odd player out until an opponent frees up
    pub waiting_for_match: bool,
    pub has_finished_round: bool,
}

impl Player {
    pub fn new(id: Uuid, name: String, color: String) -> Self {
        Self {
            id,
            name,
            color,
            points: 0,
            position: 0,
            puzzles_completed: 0,
            in_game: false,
            waiting_for_match: false,
            has_finished_round: false,
        }
    }

    pub fn award(&mut self, points: u32) {
        self.points += points;
    }

    /// Deduct points, never dropping below zero
    pub fn penalize(&mut self, points: u32) {
        self.points = self.points.saturating_sub(points);
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            points: self.points,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            points: self.points,
            position: self.position,
            puzzles_completed: self.puzzles_completed,
            in_game: self.in_game,
            waiting_for_match: self.waiting_for_match,
            has_finished_round: self.has_finished_round,
        }
    }
}

/// Insertion-ordered registry of the room's players.
///
/// Registration order is load-bearing: host reassignment picks the earliest
/// remaining player, the matchmaker pairs in arrival order, and the default
/// final tie-break follows it.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<Uuid, Player>,
    order: Vec<Uuid>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.players.contains_key(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Register a player. Returns false if the id is already present.
    pub fn insert(&mut self, player: Player) -> bool {
        if self.players.contains_key(&player.id) {
            return false;
        }
        self.order.push(player.id);
        self.players.insert(player.id, player);
        true
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Player> {
        let removed = self.players.remove(id);
        if removed.is_some() {
            self.order.retain(|p| p != id);
        }
        removed
    }

    /// Earliest-registered player still present
    pub fn first_id(&self) -> Option<Uuid> {
        self.order.first().copied()
    }

    pub fn ids_in_order(&self) -> Vec<Uuid> {
        self.order.clone()
    }

    pub fn iter_in_order(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn name_of(&self, id: &Uuid) -> Option<String> {
        self.players.get(id).map(|p| p.name.clone())
    }

    /// Clear per-round transient fields on every player.
    /// Cumulative points and puzzle counters are untouched.
    pub fn reset_round_state(&mut self) {
        for player in self.players.values_mut() {
            player.position = 0;
            player.has_finished_round = false;
            player.in_game = false;
            player.waiting_for_match = false;
        }
    }

    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.iter_in_order().map(Player::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str) -> Player {
        Player::new(Uuid::new_v4(), name.to_string(), "#112233".to_string())
    }

    #[test]
    fn penalty_floors_at_zero() {
        let mut p = player("ana");
        p.award(3);
        p.penalize(5);
        assert_eq!(p.points, 0);
    }

    #[test]
    fn registration_order_survives_removal() {
        let mut registry = PlayerRegistry::new();
        let a = player("a");
        let b = player("b");
        let c = player("c");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        registry.insert(a);
        registry.insert(b);
        registry.insert(c);

        registry.remove(&idb);
        assert_eq!(registry.ids_in_order(), vec![ida, idc]);
        assert_eq!(registry.first_id(), Some(ida));

        registry.remove(&ida);
        registry.remove(&idc);
        assert!(registry.is_empty());
        assert_eq!(registry.first_id(), None);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut registry = PlayerRegistry::new();
        let p = player("a");
        let dup = p.clone();
        assert!(registry.insert(p));
        assert!(!registry.insert(dup));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn round_reset_keeps_cumulative_fields() {
        let mut registry = PlayerRegistry::new();
        let mut p = player("a");
        p.points = 12;
        p.puzzles_completed = 2;
        p.position = 450;
        p.has_finished_round = true;
        p.in_game = true;
        let id = p.id;
        registry.insert(p);

        registry.reset_round_state();
        let p = registry.get(&id).unwrap();
        assert_eq!(p.points, 12);
        assert_eq!(p.puzzles_completed, 2);
        assert_eq!(p.position, 0);
        assert!(!p.has_finished_round);
        assert!(!p.in_game);
    }
}
