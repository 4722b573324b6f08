//! Sliding-puzzle engine for the final round.
//!
//! Shuffling and solving live on the client; the server only records
//! completion reports and runs the round countdown. When the countdown
//! expires the round ends for everyone and the tournament winner is
//! computed from total points.

use tracing::{debug, info};
use uuid::Uuid;

use crate::room::outbox::Outbox;
use crate::room::players::PlayerRegistry;
use crate::room::scoring::{self, TieBreak};
use crate::ws::protocol::ServerMsg;

/// Points per solved puzzle
pub const COMPLETION_AWARD: u32 = 25;
/// Completion count that pays the clear bonus
pub const TARGET_COMPLETIONS: u32 = 7;
/// Bonus for reaching the target count
pub const TARGET_BONUS: u32 = 500;

pub struct SlidingPuzzle {
    finished: bool,
    tie_break: TieBreak,
}

impl SlidingPuzzle {
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            finished: false,
            tie_break,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record a solved puzzle and pay out the per-completion award, plus
    /// the clear bonus on the target completion.
    pub fn handle_completion(
        &mut self,
        player_id: Uuid,
        elapsed_time_ms: u64,
        players: &mut PlayerRegistry,
        outbox: &Outbox,
    ) {
        if self.finished {
            return;
        }
        let Some(player) = players.get_mut(&player_id) else {
            return;
        };

        player.puzzles_completed += 1;
        player.award(COMPLETION_AWARD);
        debug!(
            player_id = %player_id,
            completed = player.puzzles_completed,
            elapsed_time_ms,
            "Puzzle completed"
        );

        if player.puzzles_completed == TARGET_COMPLETIONS {
            player.award(TARGET_BONUS);
            info!(player_id = %player_id, "Player cleared every puzzle");
        }

        scoring::broadcast_points(players, outbox);
    }

    /// Countdown expiry: end the round for everyone and announce the
    /// tournament winner by total points.
    pub fn finish(&mut self, players: &PlayerRegistry, outbox: &Outbox) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Some(winner) = scoring::winner(players, self.tie_break) {
            info!(winner = %winner.name, points = winner.points, "Final round over");
            outbox.broadcast(ServerMsg::GameOver {
                winner_name: winner.name,
                total_points: winner.points,
            });
        }
    }
}
