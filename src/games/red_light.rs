//! Red-Light-Green-Light engine.
//!
//! The light toggles on a fixed per-round interval owned by the coordinator;
//! a firing arrives here as a command like any player action. Moving on
//! Green advances the player toward the finish line, moving on Red sends
//! them back to the start and costs points.

use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::room::outbox::Outbox;
use crate::room::players::PlayerRegistry;
use crate::room::scoring;
use crate::ws::protocol::{Light, ServerMsg};

/// Track units gained per accepted move
pub const MOVE_STEP: u32 = 50;
/// Track position a player must reach to finish the round
pub const FINISH_LINE: u32 = 500;
/// Points for each accepted move on Green
pub const MOVE_AWARD: u32 = 1;
/// Points lost for moving on Red (floored at zero)
pub const RED_LIGHT_PENALTY: u32 = 2;
/// Placement bonuses for 1st, 2nd, 3rd across the line
pub const PLACEMENT_AWARDS: [u32; 3] = [10, 8, 6];
/// Bonus for finishing outside the podium
pub const FINISHER_AWARD: u32 = 4;
/// Consolation points for players who never finished
pub const PARTICIPATION_AWARD: u32 = 2;

/// Light-toggle period for a given round; later rounds flip faster
pub fn toggle_interval(round: u8) -> Duration {
    match round {
        1 => Duration::from_millis(3000),
        2 => Duration::from_millis(2500),
        _ => Duration::from_millis(2000),
    }
}

pub struct RedLightGreenLight {
    round: u8,
    light: Light,
    finish_order: Vec<Uuid>,
    round_over: bool,
}

impl RedLightGreenLight {
    pub fn new(round: u8) -> Self {
        Self {
            round,
            light: Light::Red,
            finish_order: Vec::new(),
            round_over: false,
        }
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn light(&self) -> Light {
        self.light
    }

    pub fn is_round_over(&self) -> bool {
        self.round_over
    }

    /// Begin the round: the opening toggle flips the initial Red to Green
    /// so players can move as soon as the round starts.
    pub fn start(&mut self, outbox: &Outbox) {
        info!(round = self.round, "Starting Red-Light-Green-Light");
        self.toggle_light(outbox);
    }

    /// Flip the light and tell everyone
    pub fn toggle_light(&mut self, outbox: &Outbox) {
        if self.round_over {
            return;
        }
        self.light = self.light.toggled();
        outbox.broadcast(ServerMsg::LightUpdate { light: self.light });
    }

    /// Process one step attempt from a player
    pub fn handle_move(&mut self, player_id: Uuid, players: &mut PlayerRegistry, outbox: &Outbox) {
        if self.round_over {
            return;
        }
        let Some(player) = players.get_mut(&player_id) else {
            return;
        };
        if player.has_finished_round {
            return;
        }

        match self.light {
            Light::Green => {
                player.position += MOVE_STEP;
                player.award(MOVE_AWARD);
                let position = player.position;
                outbox.broadcast(ServerMsg::PlayerUpdate {
                    id: player_id,
                    position,
                });
                scoring::broadcast_points(players, outbox);
                self.check_finish_line(player_id, players, outbox);
            }
            Light::Red => {
                player.position = 0;
                player.penalize(RED_LIGHT_PENALTY);
                debug!(player_id = %player_id, "Moved on Red, sent back to start");
                outbox.broadcast(ServerMsg::PlayerUpdate {
                    id: player_id,
                    position: 0,
                });
                scoring::broadcast_points(players, outbox);
            }
        }
    }

    fn check_finish_line(&mut self, player_id: Uuid, players: &mut PlayerRegistry, outbox: &Outbox) {
        let Some(player) = players.get_mut(&player_id) else {
            return;
        };
        if player.position < FINISH_LINE || player.has_finished_round {
            return;
        }

        player.has_finished_round = true;
        self.finish_order.push(player_id);
        let place = self.finish_order.len();
        info!(player_id = %player_id, place, "Player reached the finish line");
        outbox.broadcast(ServerMsg::PlayerFinished {
            id: player_id,
            place,
        });

        if players.iter_in_order().all(|p| p.has_finished_round) {
            self.end_round(players, outbox);
        }
    }

    /// Close out the round: placement awards, participation points, results
    /// broadcast. The coordinator stops the toggle timer once this engine
    /// reports the round over; the phase itself only advances on a host
    /// command.
    pub fn end_round(&mut self, players: &mut PlayerRegistry, outbox: &Outbox) {
        if self.round_over {
            return;
        }
        self.round_over = true;
        info!(round = self.round, finishers = self.finish_order.len(), "Ending RLGL round");

        for (place, id) in self.finish_order.iter().enumerate() {
            if let Some(player) = players.get_mut(id) {
                let bonus = PLACEMENT_AWARDS.get(place).copied().unwrap_or(FINISHER_AWARD);
                player.award(bonus);
            }
        }
        let finished: Vec<Uuid> = self.finish_order.clone();
        for id in players.ids_in_order() {
            if !finished.contains(&id) {
                if let Some(player) = players.get_mut(&id) {
                    player.award(PARTICIPATION_AWARD);
                }
            }
        }

        scoring::broadcast_points(players, outbox);

        let name_at = |idx: usize| {
            self.finish_order
                .get(idx)
                .and_then(|id| players.name_of(id))
        };
        outbox.broadcast(ServerMsg::RoundOver {
            round: self.round,
            winner: name_at(0),
            second: name_at(1),
            third: name_at(2),
        });

        // Track positions are round-scoped; clear them with the results out
        for id in players.ids_in_order() {
            if let Some(player) = players.get_mut(&id) {
                player.position = 0;
            }
        }
    }

    /// Resolve a mid-round disconnect: the leaver no longer occupies a
    /// finish place.
    pub fn handle_player_leave(&mut self, player_id: Uuid) {
        self.finish_order.retain(|id| *id != player_id);
    }
}
