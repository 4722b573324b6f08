//! Pairs idle players into 1v1 contests for the adversarial minigames.

use tracing::info;
use uuid::Uuid;

use crate::room::outbox::Outbox;
use crate::room::players::PlayerRegistry;
use crate::ws::protocol::ServerMsg;

/// Pair every idle player, two at a time, in arrival order into the idle
/// pool: a player already parked waiting queues ahead of players whose
/// match just resolved, so the odd player out is never stranded.
///
/// Both members of each returned pair are flagged `in_game` before this
/// returns. A single leftover player is flagged `waiting_for_match` and
/// notified, once per wait.
pub fn pair_idle(players: &mut PlayerRegistry, outbox: &Outbox) -> Vec<(Uuid, Uuid)> {
    let waiting: Vec<Uuid> = players
        .iter_in_order()
        .filter(|p| !p.in_game && p.waiting_for_match)
        .map(|p| p.id)
        .collect();
    let fresh: Vec<Uuid> = players
        .iter_in_order()
        .filter(|p| !p.in_game && !p.waiting_for_match)
        .map(|p| p.id)
        .collect();
    let idle: Vec<Uuid> = waiting.into_iter().chain(fresh).collect();

    let mut pairs = Vec::new();
    for chunk in idle.chunks(2) {
        match *chunk {
            [a, b] => {
                for id in [a, b] {
                    if let Some(player) = players.get_mut(&id) {
                        player.in_game = true;
                        player.waiting_for_match = false;
                    }
                }
                pairs.push((a, b));
            }
            [odd] => {
                if let Some(player) = players.get_mut(&odd) {
                    if !player.waiting_for_match {
                        player.waiting_for_match = true;
                        info!(player_id = %odd, "Player waiting for an opponent");
                        outbox.broadcast(ServerMsg::WaitingForMatch { player_id: odd });
                    }
                }
            }
            _ => {}
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::outbox::test_support::{capturing_outbox, drain};
    use crate::room::players::Player;

    fn join(players: &mut PlayerRegistry, name: &str) -> Uuid {
        let p = Player::new(Uuid::new_v4(), name.to_string(), "#000000".to_string());
        let id = p.id;
        players.insert(p);
        id
    }

    fn waiting_count(players: &PlayerRegistry) -> usize {
        players
            .iter_in_order()
            .filter(|p| p.waiting_for_match)
            .count()
    }

    #[test]
    fn pairs_in_registration_order() {
        let (outbox, _rx) = capturing_outbox();
        let mut players = PlayerRegistry::new();
        let a = join(&mut players, "a");
        let b = join(&mut players, "b");
        let c = join(&mut players, "c");
        let d = join(&mut players, "d");

        let pairs = pair_idle(&mut players, &outbox);
        assert_eq!(pairs, vec![(a, b), (c, d)]);
        assert!(players.iter_in_order().all(|p| p.in_game));
    }

    #[test]
    fn odd_player_is_marked_waiting_once() {
        let (outbox, mut rx) = capturing_outbox();
        let mut players = PlayerRegistry::new();
        join(&mut players, "a");
        join(&mut players, "b");
        let c = join(&mut players, "c");

        let pairs = pair_idle(&mut players, &outbox);
        assert_eq!(pairs.len(), 1);
        assert!(players.get(&c).unwrap().waiting_for_match);
        assert_eq!(waiting_count(&players), 1);

        let notices = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e.msg, ServerMsg::WaitingForMatch { player_id } if player_id == c))
            .count();
        assert_eq!(notices, 1);

        // Re-running with no new players does not spam the notice
        let pairs = pair_idle(&mut players, &outbox);
        assert!(pairs.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn waiting_player_is_paired_when_an_opponent_frees_up() {
        let (outbox, _rx) = capturing_outbox();
        let mut players = PlayerRegistry::new();
        let a = join(&mut players, "a");
        let b = join(&mut players, "b");
        let c = join(&mut players, "c");
        pair_idle(&mut players, &outbox);
        assert!(players.get(&c).unwrap().waiting_for_match);

        // First match resolves and frees its players; the waiting player
        // queues ahead of them
        for id in [a, b] {
            players.get_mut(&id).unwrap().in_game = false;
        }
        let pairs = pair_idle(&mut players, &outbox);
        assert_eq!(pairs, vec![(c, a)]);
        assert!(players.get(&b).unwrap().waiting_for_match);
        assert_eq!(waiting_count(&players), 1);
    }

    #[test]
    fn at_most_one_waiting_after_any_call() {
        let (outbox, _rx) = capturing_outbox();
        let mut players = PlayerRegistry::new();
        for name in ["a", "b", "c", "d", "e"] {
            join(&mut players, name);
        }
        pair_idle(&mut players, &outbox);
        assert_eq!(waiting_count(&players), 1);
        let paired = players.iter_in_order().filter(|p| p.in_game).count();
        assert_eq!(paired, 4);
    }
}
