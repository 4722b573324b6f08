//! Leaderboard computation - pure functions over the player registry

use std::collections::HashMap;
use std::str::FromStr;

use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

use super::outbox::Outbox;
use super::players::PlayerRegistry;

/// How equal point totals are ordered in the final standings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Earlier-registered player ranks higher
    JoinOrder,
    /// More completed puzzles ranks higher, then registration order
    MostPuzzles,
}

impl FromStr for TieBreak {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join_order" => Ok(Self::JoinOrder),
            "most_puzzles" => Ok(Self::MostPuzzles),
            _ => Err(()),
        }
    }
}

/// One row of the ranked leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub id: Uuid,
    pub name: String,
    pub points: u32,
}

/// Rank all players by points, descending.
///
/// The sort is stable over registration order, so `JoinOrder` needs no
/// extra key.
pub fn standings(players: &PlayerRegistry, tie_break: TieBreak) -> Vec<Standing> {
    let mut entries: Vec<_> = players.iter_in_order().collect();
    match tie_break {
        TieBreak::JoinOrder => entries.sort_by(|a, b| b.points.cmp(&a.points)),
        TieBreak::MostPuzzles => entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.puzzles_completed.cmp(&a.puzzles_completed))
        }),
    }
    entries
        .into_iter()
        .map(|p| Standing {
            id: p.id,
            name: p.name.clone(),
            points: p.points,
        })
        .collect()
}

/// Top of the leaderboard, if the room has any players
pub fn winner(players: &PlayerRegistry, tie_break: TieBreak) -> Option<Standing> {
    standings(players, tie_break).into_iter().next()
}

/// Authoritative id -> points map
pub fn points_by_player(players: &PlayerRegistry) -> HashMap<Uuid, u32> {
    players.iter_in_order().map(|p| (p.id, p.points)).collect()
}

/// Push current totals to every client
pub fn broadcast_points(players: &PlayerRegistry, outbox: &Outbox) {
    outbox.broadcast(ServerMsg::PointsUpdate {
        points: points_by_player(players),
    });
}

/// Push current totals to a single client
pub fn send_points(players: &PlayerRegistry, outbox: &Outbox, to: Uuid) {
    outbox.send_to(
        to,
        ServerMsg::PointsUpdate {
            points: points_by_player(players),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::players::Player;

    fn registry(points: &[(&str, u32, u32)]) -> (PlayerRegistry, Vec<Uuid>) {
        let mut reg = PlayerRegistry::new();
        let mut ids = Vec::new();
        for (name, pts, puzzles) in points {
            let mut p = Player::new(Uuid::new_v4(), name.to_string(), "#000000".to_string());
            p.points = *pts;
            p.puzzles_completed = *puzzles;
            ids.push(p.id);
            reg.insert(p);
        }
        (reg, ids)
    }

    #[test]
    fn standings_rank_by_points_descending() {
        let (reg, _) = registry(&[("low", 3, 0), ("high", 9, 0), ("mid", 5, 0)]);
        let ranked = standings(&reg, TieBreak::JoinOrder);
        let names: Vec<_> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn join_order_breaks_ties() {
        let (reg, ids) = registry(&[("first", 7, 0), ("second", 7, 3)]);
        let top = winner(&reg, TieBreak::JoinOrder).unwrap();
        assert_eq!(top.id, ids[0]);
    }

    #[test]
    fn most_puzzles_breaks_ties_before_join_order() {
        let (reg, ids) = registry(&[("first", 7, 0), ("second", 7, 3)]);
        let top = winner(&reg, TieBreak::MostPuzzles).unwrap();
        assert_eq!(top.id, ids[1]);
    }

    #[test]
    fn tie_break_parses_from_config_strings() {
        assert_eq!("join_order".parse(), Ok(TieBreak::JoinOrder));
        assert_eq!("most_puzzles".parse(), Ok(TieBreak::MostPuzzles));
        assert!("random".parse::<TieBreak>().is_err());
    }
}
