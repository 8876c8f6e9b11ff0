//! HTTP route definitions.

mod auth;
mod backup;
mod health;
mod insights;
mod state;
mod ws;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(state::routes())
        .merge(backup::routes())
        .merge(insights::routes())
        .merge(ws::routes())
}
