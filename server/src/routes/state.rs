//! Document routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tally_engine::Mutation;

use crate::auth::{AdminUser, AuthUser};
use crate::handlers::{
    handle_get_state, handle_mutation, handle_sync, MutationResponse, StateResponse,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/state", get(state_handler))
        .route("/mutations", post(mutation_handler))
        .route("/sync", post(sync_handler))
}

/// GET /state - Current document.
async fn state_handler(State(state): State<AppState>, auth: AuthUser) -> Json<StateResponse> {
    Json(handle_get_state(&state.coordinator, auth.role))
}

/// POST /mutations - Apply one mutation.
async fn mutation_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(mutation): Json<Mutation>,
) -> Json<MutationResponse> {
    Json(handle_mutation(&state.coordinator, mutation))
}

/// POST /sync - Reconcile with the stores now.
async fn sync_handler(State(state): State<AppState>, auth: AuthUser) -> Json<StateResponse> {
    Json(handle_sync(&state.coordinator, auth.role).await)
}
