//! Login and logout.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tally_engine::UserRole;

use crate::auth::{check_credentials, SessionStore};
use crate::config::Credentials;
use crate::coordinator::Coordinator;
use crate::error::{AppError, Result};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    pub role: UserRole,
}

/// Check the password and open a session.
///
/// The role of the latest login is recorded as this device's session role,
/// and the remote change feed runs while any session is open.
pub fn handle_login(
    credentials: &Credentials,
    sessions: &SessionStore,
    coordinator: &Arc<Coordinator>,
    request: LoginRequest,
) -> Result<LoginResponse> {
    let role = check_credentials(credentials, &request.password).ok_or_else(|| {
        tracing::warn!("Rejected login attempt");
        AppError::Unauthorized
    })?;

    let session = sessions.create(role);
    coordinator.set_user_role(Some(role));
    coordinator.start_listening();

    Ok(LoginResponse {
        token: session.token,
        role,
    })
}

/// Close the session behind `token`. Once no session remains open the
/// session role is cleared and the change feed torn down.
pub fn handle_logout(sessions: &SessionStore, coordinator: &Coordinator, token: &str) {
    sessions.revoke(token);
    if sessions.is_empty() {
        coordinator.set_user_role(None);
        coordinator.stop_listening();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryLocalStore, MemoryRemoteStore};

    fn login(
        credentials: &Credentials,
        sessions: &SessionStore,
        coordinator: &Arc<Coordinator>,
        password: &str,
    ) -> LoginResponse {
        let request = LoginRequest {
            password: password.to_string(),
        };
        handle_login(credentials, sessions, coordinator, request).unwrap()
    }

    #[tokio::test]
    async fn change_feed_follows_open_sessions() {
        let coordinator = Arc::new(Coordinator::new(
            Arc::new(MemoryLocalStore::new()),
            Some(Arc::new(MemoryRemoteStore::new())),
        ));
        let sessions = SessionStore::new();
        let credentials = Credentials::default();

        let admin = login(&credentials, &sessions, &coordinator, &credentials.admin_password);
        let viewer = login(&credentials, &sessions, &coordinator, &credentials.viewer_password);
        assert!(coordinator.is_listening());
        assert_eq!(coordinator.current().user_role, Some(UserRole::Viewer));

        handle_logout(&sessions, &coordinator, &admin.token);
        assert!(coordinator.is_listening());

        handle_logout(&sessions, &coordinator, &viewer.token);
        assert!(!coordinator.is_listening());
        assert_eq!(coordinator.current().user_role, None);
        coordinator.flush().await;
    }

    #[tokio::test]
    async fn rejected_login_starts_nothing() {
        let coordinator = Arc::new(Coordinator::new(
            Arc::new(MemoryLocalStore::new()),
            Some(Arc::new(MemoryRemoteStore::new())),
        ));
        let sessions = SessionStore::new();
        let request = LoginRequest {
            password: "guess".to_string(),
        };

        let result = handle_login(&Credentials::default(), &sessions, &coordinator, request);
        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(!coordinator.is_listening());
        assert!(sessions.is_empty());
    }
}
