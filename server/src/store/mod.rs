//! Durable mirrors of the document.
//!
//! The coordinator owns the authoritative copy in memory and writes through
//! two passive stores:
//!
//! - a [`LocalStore`] on the device (one fixed key, one value), and
//! - a [`RemoteStore`] shared with other clients, which also offers a change
//!   feed of whole documents.
//!
//! Neither store retries. An unreachable store is reported as an error and
//! the coordinator decides what that means (usually: treat as absent).

mod local;
mod memory;
mod postgres;

pub use local::{FileLocalStore, MemoryLocalStore};
pub use memory::MemoryRemoteStore;
pub use postgres::PgRemoteStore;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tally_engine::{union_merge, Document};

/// Key of the shared document in the remote store.
pub const REMOTE_STATE_KEY: &str = "current_state";

/// Stream of documents pushed by the remote store's change feed.
pub type ChangeStream = BoxStream<'static, Document>;

/// Errors raised by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] tally_engine::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// On-device persistence for exactly one document.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the stored document, `None` if nothing was ever written.
    async fn get(&self) -> StoreResult<Option<Document>>;

    /// Replace the stored document.
    async fn put(&self, doc: &Document) -> StoreResult<()>;

    /// Forget the stored document.
    async fn clear(&self) -> StoreResult<()>;
}

/// The shared document store other clients write to.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Point read of the shared document, `None` when not found.
    async fn get(&self) -> StoreResult<Option<Document>>;

    /// Unconditional upsert by key. Callers go through [`RemoteStore::put`].
    async fn upsert(&self, doc: &Document) -> StoreResult<()>;

    /// Subscribe to upserts of the shared document by any client.
    async fn subscribe(&self) -> StoreResult<ChangeStream>;

    /// Merge `doc` with the current remote copy, then upsert the result.
    ///
    /// Records present only remotely are kept; for shared ids the outgoing
    /// record wins. The stored stamp is the outgoing one. Returns what was
    /// written. Fails without writing when the current copy cannot be read,
    /// including when it no longer decodes.
    async fn put(&self, doc: &Document) -> StoreResult<Document> {
        let current = self.get().await?;
        let merged = union_merge(doc, current.as_ref());
        self.upsert(&merged).await?;
        Ok(merged)
    }
}
