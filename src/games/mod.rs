//! Minigame engines and the matchmaker

pub mod matchmaker;
pub mod red_light;
pub mod rps;
pub mod sliding_puzzle;
pub mod tic_tac_toe;

pub use red_light::RedLightGreenLight;
pub use rps::RockPaperScissors;
pub use sliding_puzzle::SlidingPuzzle;
pub use tic_tac_toe::TicTacToe;

use uuid::Uuid;

use crate::room::outbox::Outbox;
use crate::room::players::PlayerRegistry;

/// The engine slot owned by a session coordinator.
///
/// At most one minigame runs per room; constructing the next engine goes
/// through the coordinator's phase transition, never through module state.
pub enum ActiveGame {
    None,
    RedLight(RedLightGreenLight),
    TicTacToe(TicTacToe),
    Rps(RockPaperScissors),
    Puzzle(SlidingPuzzle),
}

impl ActiveGame {
    /// Let the running engine resolve anything in flight for a leaver
    /// before the coordinator drops the player record.
    pub fn handle_player_leave(
        &mut self,
        player_id: Uuid,
        players: &mut PlayerRegistry,
        outbox: &Outbox,
    ) {
        match self {
            ActiveGame::RedLight(engine) => engine.handle_player_leave(player_id),
            ActiveGame::TicTacToe(engine) => engine.handle_player_leave(player_id, players, outbox),
            ActiveGame::Rps(engine) => engine.handle_player_leave(player_id, players, outbox),
            ActiveGame::None | ActiveGame::Puzzle(_) => {}
        }
    }
}
