//! WebSocket upgrade route.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};

use crate::auth::AuthUser;
use crate::handlers::handle_websocket_connection;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// GET /ws - Upgrade to a live state connection.
async fn ws_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::debug!(role = ?auth.role, "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, state.coordinator, state.conn_manager, auth.role)
    })
}
