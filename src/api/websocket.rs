//! WebSocket rooms for live games
//!
//! A listener connects with the game id in the handshake query, receives
//! one `INIT` event carrying every number called so far, then the live
//! stream for that room only. The snapshot and the subscription are taken
//! atomically by the registry, so nothing called around the connect is
//! lost or repeated.

use super::{errors::ApiError, handlers::AppState, middleware::RequestId};
use crate::game::broadcast::GameEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

/// WebSocket handshake parameters
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "gameId")]
    pub game_id: u64,
}

/// WebSocket endpoint handler
/// GET /ws?gameId={id}
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    // Validate the room before upgrading so a bogus game id fails as a
    // plain HTTP error instead of an immediately-closed socket.
    state
        .registry
        .store()
        .load_game(params.game_id)
        .await
        .map_err(|e| ApiError::from_domain(request_id.0.clone(), e))?
        .ok_or_else(|| {
            ApiError::not_found(request_id.0.clone(), format!("Game {} not found", params.game_id))
        })?;

    let game_id = params.game_id;
    Ok(ws.on_upgrade(move |socket| handle_room_connection(state, socket, game_id)))
}

/// Serve one room connection until either side disconnects.
async fn handle_room_connection(state: Arc<AppState>, socket: WebSocket, game_id: u64) {
    let client_id = next_client_id();

    // Atomic snapshot + subscribe; see GameSessionRegistry::join_room.
    let join = match state.registry.join_room(game_id).await {
        Ok(join) => join,
        Err(e) => {
            warn!(game_id, client_id, "room join failed: {}", e);
            return;
        }
    };
    info!(
        game_id,
        client_id,
        listeners = state.registry.broadcast().listener_count(game_id),
        "🔌 listener connected"
    );

    let (mut sender, mut receiver) = socket.split();
    let mut subscription = join.subscription;

    let init = GameEvent::Init {
        called_numbers: join.called_numbers,
    };
    if send_event(&mut sender, &init).await.is_err() {
        debug!(game_id, client_id, "listener dropped before INIT");
        return;
    }

    loop {
        tokio::select! {
            event = subscription.next_event() => {
                match event {
                    Some(event) => {
                        if send_event(&mut sender, &event).await.is_err() {
                            debug!(game_id, client_id, "listener disconnected mid-send");
                            break;
                        }
                    }
                    // Room channel closed; nothing more will ever arrive.
                    None => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(game_id, client_id, "listener closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Listeners are receive-only; ignore chatter.
                    }
                    Some(Err(e)) => {
                        debug!(game_id, client_id, "websocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // Dropping the subscription removes this listener from the room.
    drop(subscription);
    state.registry.broadcast().prune(game_id);
    info!(
        game_id,
        client_id,
        remaining = state.registry.broadcast().listener_count(game_id),
        "🔌 listener disconnected"
    );
}

async fn send_event(
    sender: &mut (impl SinkExt<Message> + Unpin),
    event: &GameEvent,
) -> Result<(), ()> {
    let text = serde_json::to_string(event).map_err(|_| ())?;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}

fn next_client_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}
