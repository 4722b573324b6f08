//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::room::outbox::{Envelope, Recipient};
use crate::room::{RoomCommand, RoomHandle};
use crate::util::rate_limit::PlayerRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Room every connection lands in unless it names one
const DEFAULT_ROOM: &str = "lobby";

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Join code of the room to enter; created on demand
    pub room: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let code = query.room.unwrap_or_else(|| DEFAULT_ROOM.to_string());
    let room = state.rooms.get_or_create(&code);

    // Connection-scoped identity, stable for the socket's lifetime
    let player_id = Uuid::new_v4();
    info!(room = %room.code, player_id = %player_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, player_id, room))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, player_id: Uuid, room: RoomHandle) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Tell the client its id before anything else
    let welcome = ServerMsg::Welcome {
        player_id,
        server_time: unix_millis(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(player_id = %player_id, error = %e, "Failed to send welcome");
        return;
    }

    // Subscribe before announcing the connection so no event is missed
    let mut events_rx = room.outbox.subscribe();
    if room
        .cmd_tx
        .send(RoomCommand::ClientConnected { player_id })
        .await
        .is_err()
    {
        error!(player_id = %player_id, "Room command queue closed");
        return;
    }

    // Writer task: room broadcasts -> WebSocket, filtered by recipient
    let writer_player_id = player_id;
    let writer_handle = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(Envelope { to, msg }) => {
                    let for_us = match to {
                        Recipient::All => true,
                        Recipient::One(id) => id == writer_player_id,
                    };
                    if !for_us {
                        continue;
                    }
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(player_id = %writer_player_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        player_id = %writer_player_id,
                        lagged_count = n,
                        "Client lagged, skipping {} events", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(player_id = %writer_player_id, "Event channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> room command queue
    let rate_limiter = PlayerRateLimiter::new();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited command message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        if room
                            .cmd_tx
                            .send(RoomCommand::Client { player_id, msg })
                            .await
                            .is_err()
                        {
                            debug!(player_id = %player_id, "Room command queue closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(player_id = %player_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect so the room resolves anything in flight
    let _ = room
        .cmd_tx
        .send(RoomCommand::ClientDisconnected { player_id })
        .await;

    // Abort writer task
    writer_handle.abort();

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
