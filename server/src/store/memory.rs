//! In-process remote store.
//!
//! Several coordinators can share one `Arc<MemoryRemoteStore>` to stand in
//! for clients of the same backend. Upserts are fanned out over a broadcast
//! channel; the store can be taken offline to simulate a lost connection.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tally_engine::Document;
use tokio::sync::{broadcast, RwLock};

use super::{ChangeStream, RemoteStore, StoreError, StoreResult};

/// Buffered notifications per subscriber before old ones are dropped.
const FEED_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct MemoryRemoteStore {
    slot: RwLock<Option<Document>>,
    changes: broadcast::Sender<Document>,
    reachable: AtomicBool,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::from_slot(None)
    }

    /// A store that already holds `doc`.
    pub fn with_document(doc: Document) -> Self {
        Self::from_slot(Some(doc.without_session()))
    }

    fn from_slot(slot: Option<Document>) -> Self {
        let (changes, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            slot: RwLock::new(slot),
            changes,
            reachable: AtomicBool::new(true),
        }
    }

    /// Take the store on- or offline.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    /// What is stored, regardless of reachability.
    pub async fn stored(&self) -> Option<Document> {
        self.slot.read().await.clone()
    }

    fn ensure_reachable(&self) -> StoreResult<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("remote store is offline".to_string()))
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self) -> StoreResult<Option<Document>> {
        self.ensure_reachable()?;
        Ok(self.slot.read().await.clone())
    }

    async fn upsert(&self, doc: &Document) -> StoreResult<()> {
        self.ensure_reachable()?;
        let doc = doc.without_session();
        *self.slot.write().await = Some(doc.clone());
        // No subscribers is not an error
        let _ = self.changes.send(doc);
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<ChangeStream> {
        self.ensure_reachable()?;
        let rx = self.changes.subscribe();

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(doc) => return Some((doc, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Every notification is a full document, the next one supersedes these
                        tracing::debug!(skipped, "Change feed subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_engine::{Person, UserRole};

    #[tokio::test]
    async fn put_unions_with_stored_copy() {
        let mut existing = Document::default();
        existing.people.insert(Person::new("p2", "Remote"));
        existing.updated_at = 500;
        let store = MemoryRemoteStore::with_document(existing);

        let mut outgoing = Document::default();
        outgoing.people.insert(Person::new("p1", "Local"));
        outgoing.updated_at = 100;

        let written = store.put(&outgoing).await.unwrap();
        assert_eq!(written.people.len(), 2);
        assert_eq!(written.updated_at, 100);
        assert_eq!(store.stored().await, Some(written));
    }

    #[tokio::test]
    async fn upsert_strips_role_and_notifies() {
        let store = MemoryRemoteStore::new();
        let mut feed = store.subscribe().await.unwrap();

        let mut doc = Document::initial();
        doc.user_role = Some(UserRole::Admin);
        doc.updated_at = 7;
        store.upsert(&doc).await.unwrap();

        let pushed = feed.next().await.unwrap();
        assert_eq!(pushed.updated_at, 7);
        assert!(pushed.user_role.is_none());
        assert!(store.stored().await.unwrap().user_role.is_none());
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryRemoteStore::new();
        store.set_reachable(false);

        assert!(matches!(
            store.get().await.unwrap_err(),
            StoreError::Unavailable(_)
        ));
        assert!(store.put(&Document::initial()).await.is_err());
        assert!(store.subscribe().await.is_err());
        assert!(store.stored().await.is_none());
    }
}
