//! Rock-Paper-Scissors engine, matchmaker-backed.
//!
//! Each duel holds at most one pending throw per participant. A draw clears
//! both throws and restarts the duel in place; the pairing survives until a
//! decisive throw or a disconnect. There is no cap on consecutive draws.

use tracing::{debug, info};
use uuid::Uuid;

use crate::room::outbox::Outbox;
use crate::room::players::PlayerRegistry;
use crate::room::scoring;
use crate::ws::protocol::{ServerMsg, Throw};

use super::matchmaker;

/// Points for winning a duel
pub const WIN_AWARD: u32 = 7;

/// A single 1v1 duel
#[derive(Debug)]
pub struct RpsDuel {
    pub player_one: Uuid,
    pub player_two: Uuid,
    move_one: Option<Throw>,
    move_two: Option<Throw>,
}

impl RpsDuel {
    fn new(player_one: Uuid, player_two: Uuid) -> Self {
        Self {
            player_one,
            player_two,
            move_one: None,
            move_two: None,
        }
    }

    fn involves(&self, id: Uuid) -> bool {
        self.player_one == id || self.player_two == id
    }
}

pub struct RockPaperScissors {
    duels: Vec<RpsDuel>,
}

impl RockPaperScissors {
    pub fn new() -> Self {
        Self { duels: Vec::new() }
    }

    pub fn active_duels(&self) -> usize {
        self.duels.len()
    }

    /// Start the phase: pair everyone who is idle
    pub fn begin(&mut self, players: &mut PlayerRegistry, outbox: &Outbox) {
        info!("Starting Rock-Paper-Scissors");
        self.rematch(players, outbox);
    }

    /// Pair newly-idle players into fresh duels
    pub fn rematch(&mut self, players: &mut PlayerRegistry, outbox: &Outbox) {
        for (player_one, player_two) in matchmaker::pair_idle(players, outbox) {
            info!(player_one = %player_one, player_two = %player_two, "RPS duel started");
            self.duels.push(RpsDuel::new(player_one, player_two));
            outbox.broadcast(ServerMsg::RpsStarted {
                player_one,
                player_two,
            });
        }
    }

    /// Record a throw; resolve once both sides have thrown
    pub fn handle_move(
        &mut self,
        player_id: Uuid,
        throw: Throw,
        players: &mut PlayerRegistry,
        outbox: &Outbox,
    ) {
        let Some(pos) = self.duels.iter().position(|d| d.involves(player_id)) else {
            return;
        };

        let duel = &mut self.duels[pos];
        if duel.player_one == player_id {
            duel.move_one = Some(throw);
        } else {
            duel.move_two = Some(throw);
        }
        debug!(player_id = %player_id, ?throw, "RPS throw recorded");

        let (Some(one), Some(two)) = (duel.move_one, duel.move_two) else {
            return;
        };

        if one == two {
            // Draw: clear pending throws and go again with the same pairing
            duel.move_one = None;
            duel.move_two = None;
            info!(player_one = %duel.player_one, player_two = %duel.player_two, "RPS draw, restarting");
            outbox.broadcast(ServerMsg::RpsDraw {
                player_one: duel.player_one,
                player_two: duel.player_two,
            });
            return;
        }

        let (player_one, player_two) = (duel.player_one, duel.player_two);
        let winner_id = if one.beats(two) { player_one } else { player_two };
        self.duels.remove(pos);

        if let Some(winner) = players.get_mut(&winner_id) {
            winner.award(WIN_AWARD);
        }
        info!(winner = %winner_id, "RPS duel completed");
        scoring::broadcast_points(players, outbox);
        outbox.broadcast(ServerMsg::RpsCompleted {
            winner_id,
            player_one,
            player_two,
        });

        for id in [player_one, player_two] {
            if let Some(player) = players.get_mut(&id) {
                player.in_game = false;
                player.waiting_for_match = false;
            }
        }
        self.rematch(players, outbox);
    }

    /// A mid-duel disconnect resolves the duel for the remaining player;
    /// no points change hands. The survivor goes back through matchmaking.
    pub fn handle_player_leave(
        &mut self,
        player_id: Uuid,
        players: &mut PlayerRegistry,
        outbox: &Outbox,
    ) {
        let Some(pos) = self.duels.iter().position(|d| d.involves(player_id)) else {
            return;
        };
        let duel = self.duels.remove(pos);
        let remaining = if duel.player_one == player_id {
            duel.player_two
        } else {
            duel.player_one
        };

        if let Some(opponent) = players.get_mut(&remaining) {
            opponent.in_game = false;
            opponent.waiting_for_match = false;
        }
        info!(leaver = %player_id, winner = %remaining, "RPS duel forfeited");
        outbox.broadcast(ServerMsg::RpsCompleted {
            winner_id: remaining,
            player_one: duel.player_one,
            player_two: duel.player_two,
        });
        self.rematch(players, outbox);
    }
}

impl Default for RockPaperScissors {
    fn default() -> Self {
        Self::new()
    }
}
