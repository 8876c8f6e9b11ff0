//! WebSocket support for live dashboards.
//!
//! Clients connect via WebSocket, receive the current document on connect and
//! a fresh `state` message after every in-memory change, whether it came from
//! a local edit or from another device through the change feed.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::coordinator::Coordinator;

/// Forward every in-memory change to all connected clients.
///
/// The task ends when the coordinator is dropped.
pub fn spawn_fanout(
    coordinator: Arc<Coordinator>,
    conn_manager: Arc<ConnectionManager>,
) -> JoinHandle<()> {
    let mut changes = coordinator.subscribe();
    let coordinator = Arc::downgrade(&coordinator);

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let document = changes.borrow_and_update().clone();
            let status = match coordinator.upgrade() {
                Some(coordinator) => coordinator.status(),
                None => break,
            };
            let sent = conn_manager.broadcast_all(ServerMessage::state(&document, status, None));
            tracing::trace!(
                updated_at = document.updated_at,
                recipients = sent,
                "Fanned out state change"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLocalStore;
    use std::time::Duration;
    use tally_engine::{Mutation, Person, UserRole};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn fanout_broadcasts_changes() {
        let coordinator = Arc::new(Coordinator::new(Arc::new(MemoryLocalStore::new()), None));
        let manager = ConnectionManager::new_shared();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register(UserRole::Viewer, tx);

        let task = spawn_fanout(coordinator.clone(), manager.clone());
        coordinator.persist(Mutation::UpsertPerson(Person::new("p1", "Ana")));

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match msg {
            ServerMessage::State { document, .. } => assert!(document.people.contains("p1")),
            other => panic!("Expected State message, got {other:?}"),
        }

        coordinator.flush().await;
        task.abort();
    }
}
