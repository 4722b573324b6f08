//! Tic-Tac-Toe engine, matchmaker-backed.
//!
//! Runs any number of concurrent 1v1 matches. A resolved match is removed
//! immediately and its participants returned to the idle pool, so a player
//! id is in at most one active match at a time.

use tracing::{debug, info};
use uuid::Uuid;

use crate::room::outbox::Outbox;
use crate::room::players::PlayerRegistry;
use crate::room::scoring;
use crate::ws::protocol::{Mark, ServerMsg, TttOutcome};

use super::matchmaker;

/// Points for winning a match
pub const WIN_AWARD: u32 = 7;
/// Points each side takes from a draw
pub const DRAW_AWARD: u32 = 4;

/// The 8 canonical winning triples of a 3x3 board
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A single 1v1 contest
#[derive(Debug)]
pub struct TicTacToeMatch {
    pub player_x: Uuid,
    pub player_o: Uuid,
    pub board: [Option<Mark>; 9],
    pub current_turn: Mark,
}

impl TicTacToeMatch {
    fn new(player_x: Uuid, player_o: Uuid) -> Self {
        Self {
            player_x,
            player_o,
            board: [None; 9],
            current_turn: Mark::X,
        }
    }

    fn involves(&self, id: Uuid) -> bool {
        self.player_x == id || self.player_o == id
    }

    fn mark_of(&self, id: Uuid) -> Option<Mark> {
        if self.player_x == id {
            Some(Mark::X)
        } else if self.player_o == id {
            Some(Mark::O)
        } else {
            None
        }
    }

    fn player_of(&self, mark: Mark) -> Uuid {
        match mark {
            Mark::X => self.player_x,
            Mark::O => self.player_o,
        }
    }

    /// Mark owning a full winning triple, if any
    fn winner(&self) -> Option<Mark> {
        WIN_LINES.iter().find_map(|&[a, b, c]| {
            match (self.board[a], self.board[b], self.board[c]) {
                (Some(m1), Some(m2), Some(m3)) if m1 == m2 && m2 == m3 => Some(m1),
                _ => None,
            }
        })
    }

    fn is_full(&self) -> bool {
        self.board.iter().all(Option::is_some)
    }

    fn restart(&mut self) {
        self.board = [None; 9];
        self.current_turn = Mark::X;
    }
}

pub struct TicTacToe {
    matches: Vec<TicTacToeMatch>,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
        }
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    /// Start the phase: pair everyone who is idle
    pub fn begin(&mut self, players: &mut PlayerRegistry, outbox: &Outbox) {
        info!("Starting Tic-Tac-Toe");
        self.rematch(players, outbox);
    }

    /// Pair newly-idle players into fresh matches
    pub fn rematch(&mut self, players: &mut PlayerRegistry, outbox: &Outbox) {
        for (player_x, player_o) in matchmaker::pair_idle(players, outbox) {
            info!(player_x = %player_x, player_o = %player_o, "Tic-Tac-Toe match started");
            self.matches.push(TicTacToeMatch::new(player_x, player_o));
            outbox.broadcast(ServerMsg::TicTacToeStarted { player_x, player_o });
        }
    }

    /// Place a mark. Out-of-turn moves, occupied cells, out-of-range
    /// indices, and players with no active match are silent no-ops.
    pub fn handle_move(
        &mut self,
        player_id: Uuid,
        index: usize,
        players: &mut PlayerRegistry,
        outbox: &Outbox,
    ) {
        if index >= 9 {
            return;
        }
        let Some(pos) = self.matches.iter().position(|m| m.involves(player_id)) else {
            return;
        };

        let game = &mut self.matches[pos];
        let Some(mark) = game.mark_of(player_id) else {
            return;
        };
        if mark != game.current_turn || game.board[index].is_some() {
            debug!(player_id = %player_id, index, "Ignoring illegal Tic-Tac-Toe move");
            return;
        }

        game.board[index] = Some(mark);

        if let Some(winning_mark) = game.winner() {
            let board = game.board;
            let turn = game.current_turn;
            let winner_id = game.player_of(winning_mark);
            let loser_id = game.player_of(winning_mark.opponent());
            let outcome = match winning_mark {
                Mark::X => TttOutcome::X,
                Mark::O => TttOutcome::O,
            };
            self.matches.remove(pos);

            if let Some(winner) = players.get_mut(&winner_id) {
                winner.award(WIN_AWARD);
            }
            info!(winner = %winner_id, loser = %loser_id, "Tic-Tac-Toe match won");
            outbox.broadcast(ServerMsg::MoveMade {
                board,
                current_turn: turn,
                winner: Some(outcome),
            });
            outbox.broadcast(ServerMsg::GameCompleted { winner: outcome });
            scoring::broadcast_points(players, outbox);
            self.release(winner_id, loser_id, players, outbox);
        } else if game.is_full() {
            let board = game.board;
            let turn = game.current_turn;
            let (x, o) = (game.player_x, game.player_o);
            self.matches.remove(pos);

            for id in [x, o] {
                if let Some(player) = players.get_mut(&id) {
                    player.award(DRAW_AWARD);
                }
            }
            info!(player_x = %x, player_o = %o, "Tic-Tac-Toe match drawn");
            outbox.broadcast(ServerMsg::MoveMade {
                board,
                current_turn: turn,
                winner: Some(TttOutcome::Draw),
            });
            outbox.broadcast(ServerMsg::GameCompleted {
                winner: TttOutcome::Draw,
            });
            scoring::broadcast_points(players, outbox);
            self.release(x, o, players, outbox);
        } else {
            game.current_turn = game.current_turn.opponent();
            outbox.broadcast(ServerMsg::MoveMade {
                board: game.board,
                current_turn: game.current_turn,
                winner: None,
            });
        }
    }

    /// Restart the sender's match in place: cleared board, X to move
    pub fn handle_reset(&mut self, player_id: Uuid, outbox: &Outbox) {
        let Some(game) = self.matches.iter_mut().find(|m| m.involves(player_id)) else {
            return;
        };
        game.restart();
        info!(player_id = %player_id, "Tic-Tac-Toe match reset");
        outbox.broadcast(ServerMsg::TicTacToeStarted {
            player_x: game.player_x,
            player_o: game.player_o,
        });
    }

    /// A mid-match disconnect forfeits the match to the remaining player;
    /// no points change hands. The survivor goes back through matchmaking.
    pub fn handle_player_leave(
        &mut self,
        player_id: Uuid,
        players: &mut PlayerRegistry,
        outbox: &Outbox,
    ) {
        let Some(pos) = self.matches.iter().position(|m| m.involves(player_id)) else {
            return;
        };
        let game = self.matches.remove(pos);
        let remaining = if game.player_x == player_id {
            game.player_o
        } else {
            game.player_x
        };

        if let Some(opponent) = players.get_mut(&remaining) {
            opponent.in_game = false;
            opponent.waiting_for_match = false;
        }
        info!(leaver = %player_id, winner = %remaining, "Tic-Tac-Toe match forfeited");
        outbox.send_to(
            remaining,
            ServerMsg::OpponentLeft {
                opponent_id: player_id,
            },
        );
        self.rematch(players, outbox);
    }

    fn release(&mut self, a: Uuid, b: Uuid, players: &mut PlayerRegistry, outbox: &Outbox) {
        for id in [a, b] {
            if let Some(player) = players.get_mut(&id) {
                player.in_game = false;
                player.waiting_for_match = false;
            }
        }
        self.rematch(players, outbox);
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}
