//! Backup routes.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::auth::{AdminUser, AuthUser};
use crate::error::Result;
use crate::handlers::{handle_export, handle_import, ImportResponse};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/backup", get(export_handler).post(import_handler))
}

/// GET /backup - Download the document as a JSON file.
async fn export_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<impl IntoResponse> {
    let backup = handle_export(&state.coordinator)?;
    let disposition = format!("attachment; filename=\"{}\"", backup.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        backup.contents,
    ))
}

/// POST /backup - Replace all collections with an uploaded backup.
async fn import_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    body: String,
) -> Result<Json<ImportResponse>> {
    Ok(Json(handle_import(&state.coordinator, &body)?))
}
