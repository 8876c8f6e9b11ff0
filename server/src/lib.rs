//! Tally Server - sync coordinator and dashboard API.
//!
//! Keeps the authoritative document in memory, writes it through to a local
//! file and (optionally) to PostgreSQL shared with other devices, and serves
//! it over HTTP and WebSocket.

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod insight;
pub mod routes;
pub mod store;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::insight::InsightClient;
use crate::websocket::ConnectionManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub conn_manager: Arc<ConnectionManager>,
    pub insights: Arc<InsightClient>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>, config: Config) -> Self {
        let insights = Arc::new(InsightClient::new(config.insight.clone()));
        Self {
            coordinator,
            config: Arc::new(config),
            sessions: SessionStore::new_shared(),
            conn_manager: ConnectionManager::new_shared(),
            insights,
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
