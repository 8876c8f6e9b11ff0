//! Insight route.

use axum::{extract::State, routing::post, Json, Router};

use crate::auth::AuthUser;
use crate::handlers::{handle_insight, InsightResponse};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/insights", post(insight_handler))
}

/// POST /insights - Ask the insight generator about the current document.
async fn insight_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Json<InsightResponse> {
    Json(handle_insight(&state.coordinator, &state.insights).await)
}
