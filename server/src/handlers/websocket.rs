//! WebSocket handler for live dashboards.
//!
//! Handles WebSocket connections: sends the current document on connect,
//! answers `get`/`mutate`/`ping` messages and relies on the fanout task for
//! change notifications.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tally_engine::UserRole;
use tokio::sync::mpsc;

use crate::coordinator::Coordinator;
use crate::websocket::{ClientMessage, ConnectionManager, ServerMessage};

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Registers the connection with the manager
/// 2. Spawns a task to forward outgoing messages
/// 3. Processes incoming messages in a loop
/// 4. Cleans up on disconnect
pub async fn handle_websocket_connection(
    socket: WebSocket,
    coordinator: Arc<Coordinator>,
    conn_manager: Arc<ConnectionManager>,
    role: UserRole,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let conn_id = conn_manager.register(role, tx);

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    conn_manager.send_to(
        &conn_id,
        ServerMessage::state(&coordinator.current(), coordinator.status(), None),
    );

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let response = process_message(&text, &coordinator, role);
                conn_manager.send_to(&conn_id, response);
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    conn_manager.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        active_connections = conn_manager.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Process a client message and return a server response.
pub fn process_message(text: &str, coordinator: &Coordinator, role: UserRole) -> ServerMessage {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::error(format!("Invalid message format: {}", e), None);
        }
    };

    match client_msg {
        ClientMessage::Get { request_id } => {
            ServerMessage::state(&coordinator.current(), coordinator.status(), request_id)
        }

        ClientMessage::Mutate {
            mutation,
            request_id,
        } => {
            if !role.can_write() {
                tracing::warn!(mutation = mutation.kind(), "Mutation from read-only session");
                return ServerMessage::error("Read-only session", request_id);
            }
            let document = super::handle_mutation(coordinator, mutation).document;
            ServerMessage::Mutated {
                document,
                request_id,
            }
        }

        ClientMessage::Ping => ServerMessage::Pong,
    }
}
