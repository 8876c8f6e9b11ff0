//! Document reads, mutations and manual sync.

use serde::Serialize;
use tally_engine::{Document, Mutation, UserRole};

use crate::coordinator::{Coordinator, SyncStatus};

/// Response carrying the current document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    /// Shared document, without the session role
    pub document: Document,
    pub status: SyncStatus,
    /// Role of the requesting session
    pub role: UserRole,
    /// Whether a remote store is configured
    pub remote: bool,
}

/// Response for a mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub document: Document,
    pub status: SyncStatus,
}

pub fn handle_get_state(coordinator: &Coordinator, role: UserRole) -> StateResponse {
    StateResponse {
        document: coordinator.current().without_session(),
        status: coordinator.status(),
        role,
        remote: coordinator.has_remote(),
    }
}

/// Apply a mutation optimistically. Store writes continue in the background.
pub fn handle_mutation(coordinator: &Coordinator, mutation: Mutation) -> MutationResponse {
    tracing::info!(mutation = mutation.kind(), "Mutation received");
    let document = coordinator.persist(mutation).without_session();
    MutationResponse {
        document,
        status: coordinator.status(),
    }
}

/// Run a load cycle against both stores and return the resulting state.
pub async fn handle_sync(coordinator: &Coordinator, role: UserRole) -> StateResponse {
    let winner = coordinator.load().await;
    tracing::info!(updated_at = winner.updated_at, "Manual sync finished");
    handle_get_state(coordinator, role)
}
