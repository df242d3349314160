// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for chat connections.
//!
//! Client -> Server (JSON):
//! ```json
//! {"message": "Hello, do you remember me?"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "message", "response": "...", "session_id": "...", "timestamp": "..."}
//! {"type": "error", "error": "..."}
//! ```

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use yui_agent::ConversationManager;

use crate::server::{ConnectionEntry, GatewayState};

/// WebSocket frame from the client.
#[derive(Debug, Deserialize)]
struct WsIncoming {
    message: String,
}

/// WebSocket frame to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WsOutgoing {
    Message {
        response: String,
        session_id: String,
        timestamp: String,
    },
    Error {
        error: String,
    },
}

/// WebSocket upgrade handler for `/ws/{user}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Drives one connection: request in, reply out, strictly sequential.
///
/// The connection map entry lives exactly as long as this function.
async fn handle_socket(mut socket: WebSocket, state: GatewayState, user: String) {
    let connection_id = uuid::Uuid::new_v4().to_string();
    state.connections.insert(
        connection_id.clone(),
        ConnectionEntry {
            user_name: user.clone(),
            connected_at: chrono::Utc::now().to_rfc3339(),
        },
    );
    info!(connection_id, user, "websocket connected");

    let manager =
        match ConversationManager::new(&state.config, state.provider.clone(), &user).await {
            Ok(manager) => manager,
            Err(e) => {
                warn!(error = %e, "failed to start conversation for websocket");
                let frame = WsOutgoing::Error {
                    error: format!("failed to start conversation: {e}"),
                };
                let _ = send_frame(&mut socket, &frame).await;
                state.connections.remove(&connection_id);
                return;
            }
        };

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let incoming: WsIncoming = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(error = %e, "invalid websocket frame");
                        let frame = WsOutgoing::Error {
                            error: format!("invalid frame: {e}"),
                        };
                        if send_frame(&mut socket, &frame).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                let frame = match manager.send_message(&incoming.message).await {
                    Ok(response) => WsOutgoing::Message {
                        response,
                        session_id: manager.session_id().to_string(),
                        timestamp: chrono::Utc::now().to_rfc3339(),
                    },
                    Err(e) => {
                        warn!(error = %e, "message handling failed");
                        WsOutgoing::Error {
                            error: e.to_string(),
                        }
                    }
                };
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {} // Binary and ping frames are ignored.
        }
    }

    if let Err(e) = manager.end().await {
        warn!(error = %e, "failed to end websocket session");
    }
    state.connections.remove(&connection_id);
    info!(connection_id, "websocket disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &WsOutgoing) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).unwrap_or_else(|_| {
        r#"{"type":"error","error":"serialization failed"}"#.to_string()
    });
    socket.send(Message::Text(json.into())).await
}
