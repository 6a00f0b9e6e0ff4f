//! Per-connection handler: intent decoding, registry calls, notifications.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbox in the hub and spawn the writer task
//!   2. Send `Connected` with the connection's player id
//!   3. Loop: receive envelopes → apply the intent to the registry →
//!      queue the resulting notifications
//!   4. On close or leave: disconnect from the current room
//!
//! A quiet connection is never dropped; rooms live until their players'
//! connections actually end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use duel_protocol::{
    Choice, ClientMessage, Codec, Envelope, PlayerId, RoomCode,
    ServerMessage,
};
use duel_room::{ChoiceOutcome, Disconnect, RoomError};
use duel_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::DuelError;

const GAME_READY: &str = "Both players connected! Make your choice.";
const WAITING_FOR_OPPONENT: &str = "Waiting for opponent...";
const NEW_ROUND: &str = "New round started!";
const OPPONENT_DISCONNECTED: &str = "Opponent disconnected";

/// Per-connection session data kept by the read loop.
struct Session {
    player_id: PlayerId,
    /// The last room this connection created, joined or rejoined.
    current_room: Option<RoomCode>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DuelError> {
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::debug!(%conn_id, %player_id, "handling new connection");

    let conn = Arc::new(conn);
    let (outbox, inbox) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        inbox,
        Arc::clone(&state),
    ));

    {
        let mut hub = state.hub.lock().await;
        hub.register(player_id, outbox);
        hub.send_to(player_id, ServerMessage::Connected { player_id });
    }

    let mut session = Session {
        player_id,
        current_room: None,
    };
    let result = read_loop(&conn, &state, &mut session).await;

    disconnect(&state, &session).await;

    // The outbox was dropped by `unregister`, so the writer drains what is
    // left and exits.
    if let Err(e) = writer.await {
        tracing::debug!(%player_id, error = %e, "writer task failed");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%player_id, error = %e, "close failed");
    }

    result
}

/// Receives and dispatches client intents until the connection ends.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &mut Session,
) -> Result<(), DuelError> {
    let player_id = session.player_id;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let envelope: Envelope<ClientMessage> = match state.codec.decode(&data)
        {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(
                    %player_id, error = %e, "failed to decode envelope"
                );
                send_error(
                    state,
                    player_id,
                    400,
                    &format!("invalid message: {e}"),
                )
                .await;
                continue;
            }
        };

        tracing::debug!(%player_id, seq = envelope.seq, "client message");
        if handle_client_message(state, session, envelope.message).await {
            tracing::info!(%player_id, "client left");
            return Ok(());
        }
    }
}

/// Applies one client intent. Returns `true` if the connection should
/// close.
async fn handle_client_message<C: Codec>(
    state: &ServerState<C>,
    session: &mut Session,
    msg: ClientMessage,
) -> bool {
    let player_id = session.player_id;

    match msg {
        ClientMessage::CreateRoom => create_room(state, session).await,
        ClientMessage::JoinRoom { room_code } => {
            if let Some(code) = parse_code(state, player_id, &room_code).await {
                join_room(state, session, code).await;
            }
        }
        ClientMessage::RejoinRoom { room_code } => {
            if let Some(code) = parse_code(state, player_id, &room_code).await {
                rejoin_room(state, session, code).await;
            }
        }
        ClientMessage::MakeChoice { room_code, choice } => {
            if let Some(code) = parse_code(state, player_id, &room_code).await {
                make_choice(state, player_id, code, choice).await;
            }
        }
        ClientMessage::PlayAgain { room_code } => {
            if let Some(code) = parse_code(state, player_id, &room_code).await {
                play_again(state, player_id, code).await;
            }
        }
        ClientMessage::Leave => return true,
    }

    false
}

async fn create_room<C: Codec>(state: &ServerState<C>, session: &mut Session) {
    let player_id = session.player_id;
    let mut rooms = state.rooms.lock().await;
    let room_code = rooms.create_room(player_id);

    let mut hub = state.hub.lock().await;
    hub.subscribe(&room_code, player_id);
    hub.send_to(
        player_id,
        ServerMessage::RoomCreated {
            room_code: room_code.clone(),
            player_id,
        },
    );
    session.current_room = Some(room_code);
}

async fn join_room<C: Codec>(
    state: &ServerState<C>,
    session: &mut Session,
    code: RoomCode,
) {
    let player_id = session.player_id;
    let mut rooms = state.rooms.lock().await;
    let result = rooms.join_room(&code, player_id);

    let mut hub = state.hub.lock().await;
    match result {
        Ok(()) => {
            hub.subscribe(&code, player_id);
            hub.send_to(
                player_id,
                ServerMessage::RoomJoined {
                    room_code: code.clone(),
                    player_id,
                },
            );
            hub.broadcast(&code, &game_ready());
            session.current_room = Some(code);
        }
        Err(e) => hub.send_to(player_id, room_error(&e)),
    }
}

async fn rejoin_room<C: Codec>(
    state: &ServerState<C>,
    session: &mut Session,
    code: RoomCode,
) {
    let player_id = session.player_id;
    let mut rooms = state.rooms.lock().await;
    let result = rooms.rejoin_room(&code, player_id);

    let mut hub = state.hub.lock().await;
    match result {
        Ok(rejoin) => {
            hub.subscribe(&code, player_id);
            if rejoin.announces_ready() {
                hub.broadcast(&code, &game_ready());
            }
            session.current_room = Some(code);
        }
        Err(e) => hub.send_to(player_id, room_error(&e)),
    }
}

async fn make_choice<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: RoomCode,
    choice: Choice,
) {
    let mut rooms = state.rooms.lock().await;
    let result = rooms.record_choice(&code, player_id, choice);

    let hub = state.hub.lock().await;
    match result {
        Ok(ChoiceOutcome::Waiting) => hub.send_to(
            player_id,
            ServerMessage::ChoiceMade {
                message: WAITING_FOR_OPPONENT.to_string(),
            },
        ),
        Ok(ChoiceOutcome::Resolved(round)) => hub.broadcast(
            &code,
            &ServerMessage::GameResult {
                winner: round.winner,
                player1: round.first,
                player2: round.second,
            },
        ),
        Err(e) => hub.send_to(player_id, room_error(&e)),
    }
}

async fn play_again<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: RoomCode,
) {
    let mut rooms = state.rooms.lock().await;
    let result = rooms.reset_room(&code);

    let hub = state.hub.lock().await;
    match result {
        Ok(()) => hub.broadcast(
            &code,
            &ServerMessage::GameReset {
                message: NEW_ROUND.to_string(),
            },
        ),
        Err(e) => hub.send_to(player_id, room_error(&e)),
    }
}

/// Releases the connection's room slot and hub registration.
async fn disconnect<C: Codec>(state: &ServerState<C>, session: &Session) {
    let player_id = session.player_id;
    let mut rooms = state.rooms.lock().await;
    let mut hub = state.hub.lock().await;
    hub.unregister(player_id);

    let Some(code) = &session.current_room else {
        return;
    };
    match rooms.handle_disconnect(code, player_id) {
        Ok(Disconnect::RoomDeleted) => {
            hub.broadcast(
                code,
                &ServerMessage::PlayerDisconnected {
                    message: OPPONENT_DISCONNECTED.to_string(),
                },
            );
            hub.close_room(code);
        }
        Ok(Disconnect::RoomKept) => {}
        Err(e) => {
            tracing::debug!(%player_id, error = %e, "disconnect ignored");
        }
    }
}

/// Drains the connection's outbox onto the wire.
///
/// Each message is wrapped in an [`Envelope`] stamped with a per-connection
/// sequence number and the milliseconds since the connection opened.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
    state: Arc<ServerState<C>>,
) {
    let mut seq: u64 = 1;
    let start = Instant::now();

    while let Some(message) = inbox.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: elapsed_millis(start.elapsed()),
            message,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode server message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed");
            break;
        }
    }
}

/// Validates a client-supplied room code, replying with an error if it is
/// malformed.
async fn parse_code<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    raw: &str,
) -> Option<RoomCode> {
    match RoomCode::parse(raw) {
        Ok(code) => Some(code),
        Err(e) => {
            send_error(state, player_id, 400, &e.to_string()).await;
            None
        }
    }
}

/// Queues a `ServerMessage::Error` for one connection.
async fn send_error<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: u16,
    message: &str,
) {
    state.hub.lock().await.send_to(
        player_id,
        ServerMessage::Error {
            code,
            message: message.to_string(),
        },
    );
}

fn game_ready() -> ServerMessage {
    ServerMessage::GameReady {
        message: GAME_READY.to_string(),
    }
}

/// Maps a rejected registry operation to an error notification.
fn room_error(err: &RoomError) -> ServerMessage {
    let code = match err {
        RoomError::RoomNotFound(_) => 404,
        RoomError::RoomFull(_) | RoomError::AlreadyJoined(..) => 409,
        RoomError::PlayerNotInRoom(..)
        | RoomError::RoomFullNotParticipant(..) => 403,
    };
    ServerMessage::Error {
        code,
        message: err.to_string(),
    }
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
