//! Session routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_login, handle_logout, LoginRequest, LoginResponse};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
}

/// POST /auth/login - Exchange a password for a session token.
async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let response = handle_login(
        &state.config.credentials,
        &state.sessions,
        &state.coordinator,
        request,
    )?;
    Ok(Json(response))
}

/// POST /auth/logout - Close the current session.
async fn logout_handler(State(state): State<AppState>, auth: AuthUser) -> StatusCode {
    handle_logout(&state.sessions, &state.coordinator, &auth.token);
    StatusCode::NO_CONTENT
}
