//! Remote store backed by PostgreSQL.
//!
//! One row of `app_state`, keyed by [`REMOTE_STATE_KEY`], holds the shared
//! document as JSON. Every upsert is followed by a `pg_notify` on
//! [`STATE_CHANGED_CHANNEL`]; subscribers `LISTEN` on that channel and re-read
//! the row for each notification, which keeps notification payloads small no
//! matter how large the document grows.

use async_trait::async_trait;
use futures::StreamExt;
use sqlx::postgres::PgListener;
use tally_engine::Document;

use super::{ChangeStream, RemoteStore, StoreResult, REMOTE_STATE_KEY};
use crate::db::{self, Pool, STATE_CHANGED_CHANNEL};

#[derive(Debug, Clone)]
pub struct PgRemoteStore {
    pool: Pool,
    key: String,
}

impl PgRemoteStore {
    /// Store for the shared document under [`REMOTE_STATE_KEY`].
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            key: REMOTE_STATE_KEY.to_string(),
        }
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn get(&self) -> StoreResult<Option<Document>> {
        let Some(stored) = db::get_state(&self.pool, &self.key).await? else {
            return Ok(None);
        };

        tracing::trace!(
            key = %stored.id,
            row_updated_at = %stored.updated_at,
            "Remote state read"
        );
        Ok(Some(stored.to_document()?))
    }

    async fn upsert(&self, doc: &Document) -> StoreResult<()> {
        let state = serde_json::to_value(doc.without_session())?;
        db::upsert_state(&self.pool, &self.key, &state).await?;

        if let Err(e) = db::notify_state_changed(&self.pool, &self.key).await {
            // The row is written; listeners catch up on the next notification
            tracing::warn!(error = %e, key = %self.key, "Failed to notify state change");
        }
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<ChangeStream> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(STATE_CHANGED_CHANNEL).await?;

        let store = self.clone();
        let stream = listener.into_stream().filter_map(move |notification| {
            let store = store.clone();
            async move {
                match notification {
                    Ok(n) if n.payload() == store.key => match store.get().await {
                        Ok(doc) => doc,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to read remote state after notification");
                            None
                        }
                    },
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "Change feed connection error");
                        None
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}
