//! Per-connection gateway: decodes client events, routes them to match
//! actors, and forwards match events back out the socket.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The task owns the connection's single seat
//! association (at most one `(MatchId, PlayerId)` pair) and a channel the
//! match actor delivers events on. The loop selects over:
//!
//!   1. inbound frames → decode → `join` / `move` routing
//!   2. outbound events → encode → socket, evicting the match when a
//!      terminal event goes by
//!
//! Every failure an event can provoke — undecodable frame, unknown match,
//! validation rejection — becomes an `error` event to this connection and
//! the loop keeps going. Nothing a client sends can take the process down.

use std::sync::Arc;

use fourline_backend::{IdentityResolver, OutcomeStore};
use fourline_match::MatchError;
use fourline_protocol::{ClientEvent, Codec, JsonCodec, MatchId, PlayerId, ServerEvent};
use fourline_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<I, S>(
    conn: WebSocketConnection,
    state: Arc<ServerState<I, S>>,
) -> Result<(), ServerError>
where
    I: IdentityResolver,
    S: OutcomeStore + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Events from the match actor for this connection.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // The connection's seat: set on a successful join, cleared when the
    // match ends. Lives here, not in match state — identity is stable,
    // connections are not.
    let mut seat: Option<(MatchId, PlayerId)> = None;

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                let event: ClientEvent = match state.codec.decode(&data) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "undecodable client event");
                        send_error(&conn, &state.codec, "malformed event").await?;
                        continue;
                    }
                };

                match event {
                    ClientEvent::Join { match_id, player_id } => {
                        on_join(&conn, &state, &mut seat, match_id, player_id, &events_tx)
                            .await?;
                    }
                    ClientEvent::Move { match_id, column } => {
                        on_move(&conn, &state, &seat, match_id, column).await?;
                    }
                }
            }

            Some(event) = events_rx.recv() => {
                let terminal = matches!(
                    event,
                    ServerEvent::GameOver { .. } | ServerEvent::PlayerLeft { .. }
                );
                let bytes = state.codec.encode(&event)?;
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, error = %e, "send failed");
                    break;
                }
                if terminal {
                    if let Some((match_id, _)) = seat.take() {
                        evict_if_finished(&state, &match_id).await;
                    }
                }
            }
        }
    }

    // Disconnect: the transport delivers this exactly once per
    // connection, and the actor serializes it with joins and moves, so a
    // disconnect racing a final move cannot double-credit a win.
    if let Some((match_id, player_id)) = seat {
        tracing::info!(%conn_id, %match_id, %player_id, "player disconnected");
        let handle = state.registry.lock().await.get(&match_id);
        if let Some(handle) = handle {
            match handle.leave(player_id).await {
                Ok(true) => evict_if_finished(&state, &match_id).await,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(%match_id, error = %e, "leave on disconnect failed");
                }
            }
        }
    }

    Ok(())
}

/// Seats the connection's player in a match, creating it on first join.
async fn on_join<I, S>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<I, S>>,
    seat: &mut Option<(MatchId, PlayerId)>,
    match_id: MatchId,
    player_id: PlayerId,
    events_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> Result<(), ServerError>
where
    I: IdentityResolver,
    S: OutcomeStore + Clone,
{
    if seat.is_some() {
        return send_error(conn, &state.codec, "connection is already in a match").await;
    }

    // Identity lookup is best-effort: on failure the raw id stands in
    // as the display name.
    let display_name = match state.identity.resolve(&player_id).await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(%player_id, error = %e, "identity lookup failed, using raw id");
            player_id.as_str().to_string()
        }
    };

    let handle = state.registry.lock().await.get_or_create(&match_id);
    match handle
        .join(player_id.clone(), display_name, events_tx.clone())
        .await
    {
        Ok(()) => {
            *seat = Some((match_id, player_id));
            Ok(())
        }
        Err(e) => send_error(conn, &state.codec, &e.to_string()).await,
    }
}

/// Routes a move to the connection's match.
async fn on_move<I, S>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<I, S>>,
    seat: &Option<(MatchId, PlayerId)>,
    match_id: MatchId,
    column: usize,
) -> Result<(), ServerError>
where
    I: IdentityResolver,
    S: OutcomeStore + Clone,
{
    let Some((joined_id, player_id)) = seat else {
        tracing::debug!(%match_id, "move from connection with no seat");
        return send_error(conn, &state.codec, "join a match before moving").await;
    };
    if *joined_id != match_id {
        return send_error(
            conn,
            &state.codec,
            &MatchError::NotFound(match_id).to_string(),
        )
        .await;
    }

    let handle = state.registry.lock().await.get(&match_id);
    let Some(handle) = handle else {
        // Stale client state: the match finished and was evicted.
        return send_error(
            conn,
            &state.codec,
            &MatchError::NotFound(match_id).to_string(),
        )
        .await;
    };

    match handle.play(player_id.clone(), column).await {
        Ok(()) => Ok(()),
        Err(e) => send_error(conn, &state.codec, &e.to_string()).await,
    }
}

/// Evicts `match_id` if its actor has exited. The check-and-remove runs
/// under one registry lock so a fresh match re-created under the same id
/// is never knocked out by a late terminal event.
async fn evict_if_finished<I, S>(state: &Arc<ServerState<I, S>>, match_id: &MatchId)
where
    I: IdentityResolver,
    S: OutcomeStore + Clone,
{
    let mut registry = state.registry.lock().await;
    if registry.get(match_id).is_some_and(|handle| handle.is_closed()) {
        registry.remove(match_id);
    }
}

/// Sends a `ServerEvent::Error` to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    message: &str,
) -> Result<(), ServerError> {
    let event = ServerEvent::Error {
        message: message.to_string(),
    };
    let bytes = codec.encode(&event)?;
    conn.send(&bytes).await.map_err(ServerError::Transport)
}
