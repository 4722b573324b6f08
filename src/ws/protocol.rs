//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Session phase driving which minigame engine is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Players gathering before the tournament starts
    Lobby,
    RlglRound1,
    RlglRound2,
    RlglRound3,
    TicTacToe,
    RockPaperScissors,
    /// Final sliding-puzzle round, played against the countdown
    FinalPuzzle,
    /// Between-round standings screen
    RoundWinner,
    GameWinner,
    TournamentOver,
}

impl GamePhase {
    /// Which RLGL round this phase is, if any
    pub fn rlgl_round(self) -> Option<u8> {
        match self {
            Self::RlglRound1 => Some(1),
            Self::RlglRound2 => Some(2),
            Self::RlglRound3 => Some(3),
            _ => None,
        }
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Lobby
    }
}

/// Traffic light state for Red-Light-Green-Light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Light {
    Red,
    Green,
}

impl Light {
    pub fn toggled(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::Red
    }
}

/// Tic-Tac-Toe mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

/// Result of a completed Tic-Tac-Toe match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TttOutcome {
    X,
    O,
    #[serde(rename = "draw")]
    Draw,
}

/// A Rock-Paper-Scissors throw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Throw {
    Rock,
    Paper,
    Scissors,
}

impl Throw {
    /// Standard cyclic dominance: rock > scissors > paper > rock
    pub fn beats(self, other: Throw) -> bool {
        matches!(
            (self, other),
            (Throw::Rock, Throw::Scissors)
                | (Throw::Scissors, Throw::Paper)
                | (Throw::Paper, Throw::Rock)
        )
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Register in the room's lobby with a display name and color
    JoinLobby { name: String, color: String },

    /// Leave the room
    LeaveLobby,

    /// Switch the session to another phase (host only)
    ChangeGame { game: GamePhase },

    /// End the current RLGL round (host only)
    EndRound,

    /// Take a step in Red-Light-Green-Light
    RlglMove,

    /// Place a mark on the sender's Tic-Tac-Toe board
    Move { index: usize },

    /// Restart the sender's Tic-Tac-Toe match in place
    ResetGame,

    /// Submit a Rock-Paper-Scissors throw
    RpsMove {
        #[serde(rename = "move")]
        throw: Throw,
    },

    /// Report a solved sliding puzzle
    CompletePuzzle { elapsed_time_ms: u64 },

    /// Request a points snapshot for the sender only
    RequestPoints,

    /// Ping for latency measurement
    Ping { t: u64 },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { player_id: Uuid, server_time: u64 },

    /// A player registered in the lobby
    PlayerJoined { player: PlayerSummary },

    /// A player left the room
    PlayerLeft { player_id: Uuid },

    /// Host assigned or reassigned
    HostAssigned { host_id: Uuid },

    /// The session switched phase
    GameChanged { game: GamePhase },

    /// RLGL light toggled
    LightUpdate { light: Light },

    /// A player's track position changed
    PlayerUpdate { id: Uuid, position: u32 },

    /// A player crossed the finish line (place is 1-based finish order)
    PlayerFinished { id: Uuid, place: usize },

    /// RLGL round results by display name
    RoundOver {
        round: u8,
        winner: Option<String>,
        second: Option<String>,
        third: Option<String>,
    },

    /// Tournament result
    GameOver { winner_name: String, total_points: u32 },

    /// A Tic-Tac-Toe match started
    TicTacToeStarted { player_x: Uuid, player_o: Uuid },

    /// A Tic-Tac-Toe move was accepted
    MoveMade {
        board: [Option<Mark>; 9],
        current_turn: Mark,
        winner: Option<TttOutcome>,
    },

    /// A Tic-Tac-Toe match finished
    GameCompleted { winner: TttOutcome },

    /// The sender's opponent disconnected mid-match
    OpponentLeft { opponent_id: Uuid },

    /// A Rock-Paper-Scissors duel started
    RpsStarted { player_one: Uuid, player_two: Uuid },

    /// A Rock-Paper-Scissors duel resolved
    RpsCompleted {
        winner_id: Uuid,
        player_one: Uuid,
        player_two: Uuid,
    },

    /// Both throws matched; the duel restarts in place
    RpsDraw { player_one: Uuid, player_two: Uuid },

    /// An odd player is parked until an opponent frees up
    WaitingForMatch { player_id: Uuid },

    /// Authoritative point totals
    PointsUpdate { points: HashMap<Uuid, u32> },

    /// Full replicated room state (sent when it changed)
    RoomState { state: RoomSnapshot },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong { t: u64 },
}

/// Player info for join/leave notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub points: u32,
}

/// Read-only projection of the room replicated to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub phase: GamePhase,
    pub round: u8,
    pub host_id: Option<Uuid>,
    /// Present only while an RLGL round is active
    pub light: Option<Light>,
    pub finish_line: u32,
    pub players: Vec<PlayerSnapshot>,
}

/// Per-player slice of the replicated state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub points: u32,
    pub position: u32,
    pub puzzles_completed: u32,
    pub in_game: bool,
    pub waiting_for_match: bool,
    pub has_finished_round: bool,
}
