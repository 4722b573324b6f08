//! Session coordinator: the per-room actor.
//!
//! Every inbound effect on a room - player commands, transport lifecycle,
//! timer firings - is a `RoomCommand` drained one at a time by `Room::run`.
//! The coordinator is the sole writer of the room's shared state; engines
//! mutate players only when it dispatches to them. Timer firings carry the
//! epoch they were scheduled under, and every phase transition bumps the
//! epoch, so a firing from a cancelled phase that is already queued is
//! discarded instead of mutating the new phase.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::games::{
    red_light, ActiveGame, RedLightGreenLight, RockPaperScissors, SlidingPuzzle, TicTacToe,
};
use crate::ws::protocol::{ClientMsg, GamePhase, ServerMsg};

use super::outbox::Outbox;
use super::players::{Player, PlayerRegistry};
use super::scoring;
use super::snapshot::SnapshotBroadcaster;

/// Queue depth for inbound room commands
const COMMAND_QUEUE_DEPTH: usize = 256;
/// Broadcast buffer per room
const BROADCAST_BUFFER: usize = 256;

/// One unit of work for the room actor
#[derive(Debug)]
pub enum RoomCommand {
    /// Transport connected; the client still has to send `join_lobby`
    ClientConnected { player_id: Uuid },
    /// Transport dropped
    ClientDisconnected { player_id: Uuid },
    /// A parsed message from a connected client
    Client { player_id: Uuid, msg: ClientMsg },
    /// RLGL light-toggle timer fired
    LightTimerFired { epoch: u64 },
    /// Final-round countdown ran out
    CountdownExpired { epoch: u64 },
}

/// Rejection reasons that are reported back to the sender
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("only the host may do this")]
    NotHost,
}

impl CommandError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotHost => "not_host",
        }
    }
}

/// Cloneable handle for routing into a running room
#[derive(Clone)]
pub struct RoomHandle {
    pub code: String,
    pub cmd_tx: mpsc::Sender<RoomCommand>,
    pub outbox: Outbox,
    player_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// One isolated tournament session
pub struct Room {
    code: String,
    config: Arc<Config>,
    phase: GamePhase,
    round: u8,
    host_id: Option<Uuid>,
    players: PlayerRegistry,
    game: ActiveGame,
    outbox: Outbox,
    cmd_tx: mpsc::Sender<RoomCommand>,
    cmd_rx: mpsc::Receiver<RoomCommand>,
    snapshots: SnapshotBroadcaster,
    player_count: Arc<AtomicUsize>,
    /// Bumped on every phase transition; stale timer firings are dropped
    timer_epoch: u64,
    light_timer: Option<JoinHandle<()>>,
    countdown_timer: Option<JoinHandle<()>>,
    /// Open transport connections; the room disposes when the last closes
    connections: usize,
    had_connection: bool,
}

impl Room {
    pub fn new(code: String, config: Arc<Config>) -> (Self, RoomHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let outbox = Outbox::new(BROADCAST_BUFFER);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            code: code.clone(),
            cmd_tx: cmd_tx.clone(),
            outbox: outbox.clone(),
            player_count: player_count.clone(),
        };

        let room = Self {
            code,
            config,
            phase: GamePhase::Lobby,
            round: 1,
            host_id: None,
            players: PlayerRegistry::new(),
            game: ActiveGame::None,
            outbox,
            cmd_tx,
            cmd_rx,
            snapshots: SnapshotBroadcaster::new(),
            player_count,
            timer_epoch: 0,
            light_timer: None,
            countdown_timer: None,
            connections: 0,
            had_connection: false,
        };

        (room, handle)
    }

    /// Drive the actor until the last connection closes
    pub async fn run(mut self) {
        info!(room = %self.code, "Room created");

        while let Some(cmd) = self.cmd_rx.recv().await {
            self.apply(cmd);
            self.publish_state();

            if self.had_connection && self.connections == 0 {
                break;
            }
        }

        self.dispose();
    }

    fn dispose(&mut self) {
        self.stop_timers();
        info!(room = %self.code, "Room disposed");
    }

    /// Process a single command. All state mutation funnels through here.
    pub fn apply(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::ClientConnected { player_id } => {
                self.connections += 1;
                self.had_connection = true;
                debug!(room = %self.code, player_id = %player_id, "Client connected");
            }
            RoomCommand::ClientDisconnected { player_id } => {
                self.connections = self.connections.saturating_sub(1);
                debug!(room = %self.code, player_id = %player_id, "Client disconnected");
                self.remove_player(player_id);
            }
            RoomCommand::Client { player_id, msg } => self.handle_client(player_id, msg),
            RoomCommand::LightTimerFired { epoch } => {
                if epoch != self.timer_epoch {
                    debug!(room = %self.code, epoch, "Dropping stale light timer firing");
                    return;
                }
                if let ActiveGame::RedLight(engine) = &mut self.game {
                    engine.toggle_light(&self.outbox);
                }
            }
            RoomCommand::CountdownExpired { epoch } => {
                if epoch != self.timer_epoch {
                    debug!(room = %self.code, epoch, "Dropping stale countdown firing");
                    return;
                }
                if let ActiveGame::Puzzle(engine) = &mut self.game {
                    engine.finish(&self.players, &self.outbox);
                }
            }
        }
    }

    fn handle_client(&mut self, player_id: Uuid, msg: ClientMsg) {
        match msg {
            ClientMsg::JoinLobby { name, color } => self.join_lobby(player_id, name, color),
            ClientMsg::LeaveLobby => self.remove_player(player_id),
            ClientMsg::ChangeGame { game } => {
                if let Err(err) = self.change_game(player_id, game) {
                    self.reject(player_id, err);
                }
            }
            ClientMsg::EndRound => {
                if let Err(err) = self.end_round(player_id) {
                    self.reject(player_id, err);
                }
            }
            ClientMsg::RlglMove => {
                let round_over = if let ActiveGame::RedLight(engine) = &mut self.game {
                    engine.handle_move(player_id, &mut self.players, &self.outbox);
                    engine.is_round_over()
                } else {
                    false
                };
                if round_over {
                    self.stop_timers();
                }
            }
            ClientMsg::Move { index } => {
                if let ActiveGame::TicTacToe(engine) = &mut self.game {
                    engine.handle_move(player_id, index, &mut self.players, &self.outbox);
                }
            }
            ClientMsg::ResetGame => {
                if let ActiveGame::TicTacToe(engine) = &mut self.game {
                    engine.handle_reset(player_id, &self.outbox);
                }
            }
            ClientMsg::RpsMove { throw } => {
                if let ActiveGame::Rps(engine) = &mut self.game {
                    engine.handle_move(player_id, throw, &mut self.players, &self.outbox);
                }
            }
            ClientMsg::CompletePuzzle { elapsed_time_ms } => {
                if let ActiveGame::Puzzle(engine) = &mut self.game {
                    engine.handle_completion(
                        player_id,
                        elapsed_time_ms,
                        &mut self.players,
                        &self.outbox,
                    );
                }
            }
            ClientMsg::RequestPoints => {
                scoring::send_points(&self.players, &self.outbox, player_id)
            }
            ClientMsg::Ping { t } => self.outbox.send_to(player_id, ServerMsg::Pong { t }),
        }
    }

    fn join_lobby(&mut self, player_id: Uuid, name: String, color: String) {
        if self.players.contains(&player_id) {
            debug!(room = %self.code, player_id = %player_id, "Already in the lobby");
            return;
        }

        let name = if name.trim().is_empty() {
            "Anonymous".to_string()
        } else {
            name
        };
        let player = Player::new(player_id, name.clone(), color);
        let summary = player.summary();
        self.players.insert(player);
        self.player_count.store(self.players.len(), Ordering::Relaxed);

        info!(room = %self.code, player_id = %player_id, name = %name, "Player joined the lobby");
        self.outbox.broadcast(ServerMsg::PlayerJoined { player: summary });

        if self.host_id.is_none() {
            self.host_id = Some(player_id);
            info!(room = %self.code, host_id = %player_id, "Host assigned");
            self.outbox
                .broadcast(ServerMsg::HostAssigned { host_id: player_id });
        }

        // A newcomer mid-adversarial-phase is a matchmaking candidate
        self.rematch_if_adversarial();
    }

    fn remove_player(&mut self, player_id: Uuid) {
        if !self.players.contains(&player_id) {
            debug!(room = %self.code, player_id = %player_id, "Leaver was not in the lobby");
            return;
        }

        // The active engine resolves any in-flight match or finish place
        // before the record goes away
        self.game
            .handle_player_leave(player_id, &mut self.players, &self.outbox);

        self.players.remove(&player_id);
        self.player_count.store(self.players.len(), Ordering::Relaxed);
        info!(room = %self.code, player_id = %player_id, "Player left the lobby");
        self.outbox.broadcast(ServerMsg::PlayerLeft { player_id });

        if self.host_id == Some(player_id) {
            self.host_id = self.players.first_id();
            if let Some(new_host) = self.host_id {
                info!(room = %self.code, host_id = %new_host, "Host reassigned");
                self.outbox
                    .broadcast(ServerMsg::HostAssigned { host_id: new_host });
            }
        }

        self.rematch_if_adversarial();
    }

    /// A join or leave changes the idle pool, so while an adversarial
    /// phase is live the matchmaker runs again.
    fn rematch_if_adversarial(&mut self) {
        match &mut self.game {
            ActiveGame::TicTacToe(engine) => engine.rematch(&mut self.players, &self.outbox),
            ActiveGame::Rps(engine) => engine.rematch(&mut self.players, &self.outbox),
            _ => {}
        }
    }

    fn change_game(&mut self, requestor: Uuid, target: GamePhase) -> Result<(), CommandError> {
        self.require_host(requestor)?;
        info!(room = %self.code, ?target, "Changing game");
        self.transition(target);
        Ok(())
    }

    fn end_round(&mut self, requestor: Uuid) -> Result<(), CommandError> {
        self.require_host(requestor)?;
        let ended = if let ActiveGame::RedLight(engine) = &mut self.game {
            engine.end_round(&mut self.players, &self.outbox);
            true
        } else {
            false
        };
        if ended {
            self.stop_timers();
        }
        Ok(())
    }

    /// Phase transition: cancel outgoing timers, clear per-round transient
    /// player state, start the incoming engine, announce the change.
    fn transition(&mut self, target: GamePhase) {
        self.stop_timers();
        self.players.reset_round_state();
        self.game = ActiveGame::None;
        self.phase = target;
        self.outbox.broadcast(ServerMsg::GameChanged { game: target });

        if let Some(round) = target.rlgl_round() {
            self.round = round;
            let mut engine = RedLightGreenLight::new(round);
            engine.start(&self.outbox);
            self.game = ActiveGame::RedLight(engine);
            self.start_light_timer(red_light::toggle_interval(round));
            return;
        }

        match target {
            GamePhase::TicTacToe => {
                let mut engine = TicTacToe::new();
                engine.begin(&mut self.players, &self.outbox);
                self.game = ActiveGame::TicTacToe(engine);
            }
            GamePhase::RockPaperScissors => {
                let mut engine = RockPaperScissors::new();
                engine.begin(&mut self.players, &self.outbox);
                self.game = ActiveGame::Rps(engine);
            }
            GamePhase::FinalPuzzle => {
                self.game = ActiveGame::Puzzle(SlidingPuzzle::new(self.config.tie_break));
                self.start_countdown(self.config.puzzle_countdown);
            }
            GamePhase::RoundWinner => {
                scoring::broadcast_points(&self.players, &self.outbox);
            }
            GamePhase::GameWinner | GamePhase::TournamentOver => {
                self.announce_tournament_winner();
            }
            GamePhase::Lobby => {}
            // RLGL rounds handled above
            _ => {}
        }
    }

    fn announce_tournament_winner(&self) {
        if let Some(winner) = scoring::winner(&self.players, self.config.tie_break) {
            info!(room = %self.code, winner = %winner.name, points = winner.points, "Tournament over");
            self.outbox.broadcast(ServerMsg::GameOver {
                winner_name: winner.name,
                total_points: winner.points,
            });
        }
    }

    fn require_host(&self, player_id: Uuid) -> Result<(), CommandError> {
        if self.host_id == Some(player_id) {
            Ok(())
        } else {
            Err(CommandError::NotHost)
        }
    }

    fn reject(&self, player_id: Uuid, err: CommandError) {
        warn!(room = %self.code, player_id = %player_id, error = %err, "Rejected command");
        self.outbox.send_to(
            player_id,
            ServerMsg::Error {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        );
    }

    /// Cancel all outstanding timers. Bumping the epoch first means a
    /// firing that already made it into the command queue is dead on
    /// arrival.
    fn stop_timers(&mut self) {
        self.timer_epoch += 1;
        if let Some(handle) = self.light_timer.take() {
            handle.abort();
        }
        if let Some(handle) = self.countdown_timer.take() {
            handle.abort();
        }
    }

    fn start_light_timer(&mut self, period: Duration) {
        let epoch = self.timer_epoch;
        let cmd_tx = self.cmd_tx.clone();
        self.light_timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval yields immediately on the first tick
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if cmd_tx
                    .send(RoomCommand::LightTimerFired { epoch })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    fn start_countdown(&mut self, duration: Duration) {
        let epoch = self.timer_epoch;
        let cmd_tx = self.cmd_tx.clone();
        self.countdown_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = cmd_tx.send(RoomCommand::CountdownExpired { epoch }).await;
        }));
    }

    /// Rebuild the replicated projection; only changes hit the wire
    fn publish_state(&mut self) {
        let light = match &self.game {
            ActiveGame::RedLight(engine) => Some(engine.light()),
            _ => None,
        };
        let snapshot = SnapshotBroadcaster::build(
            self.phase,
            self.round,
            self.host_id,
            light,
            red_light::FINISH_LINE,
            &self.players,
        );
        self.snapshots.publish_if_changed(snapshot, &self.outbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::outbox::test_support::drain;
    use crate::room::outbox::{Envelope, Recipient};
    use crate::ws::protocol::{Light, Throw};
    use tokio::sync::broadcast;
    use tokio::time::{timeout, Duration};

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.puzzle_countdown = Duration::from_millis(50);
        Arc::new(config)
    }

    fn new_room() -> (Room, RoomHandle, broadcast::Receiver<Envelope>) {
        let (room, handle) = Room::new("TEST".to_string(), test_config());
        let rx = handle.outbox.subscribe();
        (room, handle, rx)
    }

    fn join(room: &mut Room, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        room.apply(RoomCommand::ClientConnected { player_id: id });
        room.apply(RoomCommand::Client {
            player_id: id,
            msg: ClientMsg::JoinLobby {
                name: name.to_string(),
                color: "#123456".to_string(),
            },
        });
        id
    }

    fn client(room: &mut Room, player_id: Uuid, msg: ClientMsg) {
        room.apply(RoomCommand::Client { player_id, msg });
    }

    async fn expect_msg<F>(rx: &mut broadcast::Receiver<Envelope>, mut pred: F) -> Envelope
    where
        F: FnMut(&Envelope) -> bool,
    {
        timeout(Duration::from_secs(1), async {
            loop {
                let env = rx.recv().await.expect("channel open");
                if pred(&env) {
                    return env;
                }
            }
        })
        .await
        .expect("expected message before timeout")
    }

    #[tokio::test]
    async fn first_joiner_becomes_host() {
        let (mut room, _handle, mut rx) = new_room();
        let a = join(&mut room, "a");
        join(&mut room, "b");

        assert_eq!(room.host_id, Some(a));
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e.msg,
            ServerMsg::HostAssigned { host_id } if host_id == a
        )));
    }

    #[tokio::test]
    async fn non_host_game_change_is_rejected() {
        let (mut room, _handle, mut rx) = new_room();
        join(&mut room, "host");
        let b = join(&mut room, "b");

        client(&mut room, b, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound1,
        });

        assert_eq!(room.phase, GamePhase::Lobby);
        let rejection = drain(&mut rx).into_iter().find(|e| {
            matches!(&e.msg, ServerMsg::Error { code, .. } if code == "not_host")
        });
        assert_eq!(rejection.expect("rejection sent").to, Recipient::One(b));
    }

    #[tokio::test]
    async fn host_leaving_reassigns_to_next_registered() {
        let (mut room, _handle, mut rx) = new_room();
        let a = join(&mut room, "a");
        let b = join(&mut room, "b");

        room.apply(RoomCommand::ClientDisconnected { player_id: a });

        assert_eq!(room.host_id, Some(b));
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e.msg,
            ServerMsg::HostAssigned { host_id } if host_id == b
        )));
    }

    #[tokio::test]
    async fn rlgl_round_runs_to_a_finish() {
        let (mut room, _handle, mut rx) = new_room();
        let host = join(&mut room, "host");
        let b = join(&mut room, "b");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound1,
        });
        // The round opens on Green
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e.msg,
            ServerMsg::LightUpdate {
                light: Light::Green
            }
        )));

        for _ in 0..10 {
            client(&mut room, host, ClientMsg::RlglMove);
        }
        let finished = drain(&mut rx).into_iter().any(|e| {
            matches!(e.msg, ServerMsg::PlayerFinished { id, place: 1 } if id == host)
        });
        assert!(finished);

        // Host ends the round; the straggler gets participation points
        client(&mut room, host, ClientMsg::EndRound);
        assert_eq!(
            room.players.get(&b).unwrap().points,
            red_light::PARTICIPATION_AWARD
        );
    }

    #[tokio::test]
    async fn stale_light_timer_firings_are_discarded() {
        let (mut room, _handle, mut rx) = new_room();
        let host = join(&mut room, "host");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound1,
        });
        let live_epoch = room.timer_epoch;
        drain(&mut rx);

        // A firing scheduled before the transition is dead on arrival
        room.apply(RoomCommand::LightTimerFired {
            epoch: live_epoch - 1,
        });
        assert!(drain(&mut rx)
            .iter()
            .all(|e| !matches!(e.msg, ServerMsg::LightUpdate { .. })));

        // Leaving the phase invalidates the epoch that was live during it
        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::Lobby,
        });
        drain(&mut rx);
        room.apply(RoomCommand::LightTimerFired { epoch: live_epoch });
        assert!(drain(&mut rx)
            .iter()
            .all(|e| !matches!(e.msg, ServerMsg::LightUpdate { .. })));
        assert!(room.light_timer.is_none());
    }

    #[tokio::test]
    async fn live_light_timer_firing_toggles_the_light() {
        let (mut room, _handle, mut rx) = new_room();
        let host = join(&mut room, "host");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound1,
        });
        drain(&mut rx);

        room.apply(RoomCommand::LightTimerFired {
            epoch: room.timer_epoch,
        });
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e.msg,
            ServerMsg::LightUpdate { light: Light::Red }
        )));
    }

    #[tokio::test]
    async fn transition_resets_transient_state_but_not_points() {
        let (mut room, _handle, _rx) = new_room();
        let host = join(&mut room, "host");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound1,
        });
        for _ in 0..3 {
            client(&mut room, host, ClientMsg::RlglMove);
        }
        let points = room.players.get(&host).unwrap().points;
        assert!(points > 0);
        assert!(room.players.get(&host).unwrap().position > 0);

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound2,
        });
        let player = room.players.get(&host).unwrap();
        assert_eq!(player.position, 0);
        assert!(!player.has_finished_round);
        assert_eq!(player.points, points);
        assert_eq!(room.round, 2);
    }

    #[tokio::test]
    async fn adversarial_phase_matches_on_entry_and_on_join() {
        let (mut room, _handle, mut rx) = new_room();
        let host = join(&mut room, "host");
        join(&mut room, "b");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::TicTacToe,
        });
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e.msg, ServerMsg::TicTacToeStarted { .. })));

        // A third player joining mid-phase queues for a match
        let c = join(&mut room, "c");
        assert!(room.players.get(&c).unwrap().waiting_for_match);
    }

    #[tokio::test]
    async fn rps_commands_route_to_the_rps_engine() {
        let (mut room, _handle, mut rx) = new_room();
        let host = join(&mut room, "host");
        let b = join(&mut room, "b");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RockPaperScissors,
        });
        drain(&mut rx);

        client(&mut room, host, ClientMsg::RpsMove { throw: Throw::Rock });
        client(&mut room, b, ClientMsg::RpsMove { throw: Throw::Rock });
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e.msg, ServerMsg::RpsDraw { .. })));

        client(&mut room, host, ClientMsg::RpsMove { throw: Throw::Rock });
        client(&mut room, b, ClientMsg::RpsMove { throw: Throw::Paper });
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e.msg,
            ServerMsg::RpsCompleted { winner_id, .. } if winner_id == b
        )));
    }

    #[tokio::test]
    async fn tournament_over_announces_the_points_leader() {
        let (mut room, _handle, mut rx) = new_room();
        let host = join(&mut room, "host");
        let b = join(&mut room, "b");
        room.players.get_mut(&b).unwrap().points = 42;
        drain(&mut rx);

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::TournamentOver,
        });
        let game_over = drain(&mut rx).into_iter().find_map(|e| match e.msg {
            ServerMsg::GameOver {
                winner_name,
                total_points,
            } => Some((winner_name, total_points)),
            _ => None,
        });
        assert_eq!(game_over, Some(("b".to_string(), 42)));
    }

    #[tokio::test]
    async fn request_points_is_unicast_to_the_sender() {
        let (mut room, _handle, mut rx) = new_room();
        let a = join(&mut room, "a");
        join(&mut room, "b");
        drain(&mut rx);

        client(&mut room, a, ClientMsg::RequestPoints);
        let reply = drain(&mut rx)
            .into_iter()
            .find(|e| matches!(e.msg, ServerMsg::PointsUpdate { .. }))
            .expect("points reply");
        assert_eq!(reply.to, Recipient::One(a));
    }

    #[tokio::test]
    async fn countdown_expiry_ends_the_final_round() {
        let (room, handle, mut rx) = {
            let (room, handle) = Room::new("TEST".to_string(), test_config());
            let rx = handle.outbox.subscribe();
            (room, handle, rx)
        };
        let room_task = tokio::spawn(room.run());

        let host = Uuid::new_v4();
        handle
            .cmd_tx
            .send(RoomCommand::ClientConnected { player_id: host })
            .await
            .unwrap();
        handle
            .cmd_tx
            .send(RoomCommand::Client {
                player_id: host,
                msg: ClientMsg::JoinLobby {
                    name: "host".to_string(),
                    color: "#000000".to_string(),
                },
            })
            .await
            .unwrap();
        handle
            .cmd_tx
            .send(RoomCommand::Client {
                player_id: host,
                msg: ClientMsg::ChangeGame {
                    game: GamePhase::FinalPuzzle,
                },
            })
            .await
            .unwrap();
        handle
            .cmd_tx
            .send(RoomCommand::Client {
                player_id: host,
                msg: ClientMsg::CompletePuzzle {
                    elapsed_time_ms: 9_000,
                },
            })
            .await
            .unwrap();

        // The 50ms test countdown expires and the winner is announced
        let env = expect_msg(&mut rx, |e| matches!(e.msg, ServerMsg::GameOver { .. })).await;
        match env.msg {
            ServerMsg::GameOver {
                winner_name,
                total_points,
            } => {
                assert_eq!(winner_name, "host");
                assert_eq!(total_points, crate::games::sliding_puzzle::COMPLETION_AWARD);
            }
            _ => unreachable!(),
        }

        // Last transport closing disposes the room
        handle
            .cmd_tx
            .send(RoomCommand::ClientDisconnected { player_id: host })
            .await
            .unwrap();
        timeout(Duration::from_secs(1), room_task)
            .await
            .expect("room task exits")
            .expect("room task not panicked");
    }

    #[tokio::test]
    async fn all_players_finishing_stops_the_toggle_timer() {
        let (mut room, _handle, _rx) = new_room();
        let host = join(&mut room, "host");

        client(&mut room, host, ClientMsg::ChangeGame {
            game: GamePhase::RlglRound1,
        });
        assert!(room.light_timer.is_some());

        for _ in 0..10 {
            client(&mut room, host, ClientMsg::RlglMove);
        }
        assert!(room.light_timer.is_none());
    }
}
