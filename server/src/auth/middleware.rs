//! Authentication extractors.
//!
//! [`AuthUser`] resolves the request's session token to a role;
//! [`AdminUser`] additionally requires write access.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use tally_engine::UserRole;

use crate::AppState;

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The session token
    pub token: String,
    /// Access level of the session
    pub role: UserRole,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts)? {
            Some(token) => token,
            // Browsers cannot set headers on WebSocket upgrades
            None => query_token(parts)
                .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization header"))?,
        };

        if token.is_empty() {
            return Err((StatusCode::UNAUTHORIZED, "Empty bearer token"));
        }

        match state.sessions.resolve(&token) {
            Some(role) => Ok(AuthUser { token, role }),
            None => Err((StatusCode::UNAUTHORIZED, "Unknown or expired session")),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, (StatusCode, &'static str)> {
    let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };

    match header.strip_prefix("Bearer ") {
        Some(token) => Ok(Some(token.trim().to_string())),
        None => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid authorization header format",
        )),
    }
}

fn query_token(parts: &Parts) -> Option<String> {
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_string)
}

/// Authenticated user with write access.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role.can_write() {
            Ok(AdminUser(user))
        } else {
            Err((StatusCode::FORBIDDEN, "Read-only session"))
        }
    }
}
