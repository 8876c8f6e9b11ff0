//! Two-tier credential check and bearer-token sessions.
//!
//! A password maps to one of two fixed roles. A successful login opens a
//! session identified by a random token; requests carry it as a bearer token
//! (or as a `token` query parameter for WebSocket upgrades).

mod middleware;

pub use middleware::{AdminUser, AuthUser};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tally_engine::UserRole;

use crate::config::Credentials;

/// Check a password against the configured credentials.
pub fn check_credentials(credentials: &Credentials, password: &str) -> Option<UserRole> {
    if password.is_empty() {
        None
    } else if password == credentials.admin_password {
        Some(UserRole::Admin)
    } else if password == credentials.viewer_password {
        Some(UserRole::Viewer)
    } else {
        None
    }
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Open sessions, keyed by token.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session store wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Open a session for `role`.
    pub fn create(&self, role: UserRole) -> Session {
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            role,
            created_at: Utc::now(),
        };
        self.sessions
            .insert(session.token.clone(), session.clone());
        tracing::info!(role = ?role, "Session opened");
        session
    }

    /// Role of the session behind `token`.
    pub fn resolve(&self, token: &str) -> Option<UserRole> {
        self.sessions.get(token).map(|s| s.role)
    }

    /// Close a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token);
        if let Some((_, session)) = &removed {
            tracing::info!(
                role = ?session.role,
                opened_at = %session.created_at,
                "Session closed"
            );
        }
        removed.is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
