//! Database operations for the app_state table.

use serde::Deserialize;
use sqlx::{PgPool, Row};
use tally_engine::Document;

/// Notification channel raised on every upsert of a state row.
/// The payload is the row key.
pub const STATE_CHANGED_CHANNEL: &str = "app_state_changed";

/// A stored state row from the database.
#[derive(Debug)]
pub struct StoredState {
    pub id: String,
    pub state: serde_json::Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredState {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredState {
            id: row.try_get("id")?,
            state: row.try_get("state")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredState {
    /// Decode the stored JSON into a document.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        Document::deserialize(&self.state)
    }
}

/// Get a state row by key.
pub async fn get_state(pool: &PgPool, key: &str) -> Result<Option<StoredState>, sqlx::Error> {
    sqlx::query_as::<_, StoredState>(
        r#"
        SELECT id, state, updated_at
        FROM app_state
        WHERE id = $1
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await
}

/// Upsert a state row (insert or replace).
pub async fn upsert_state(
    pool: &PgPool,
    key: &str,
    state: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO app_state (id, state, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (id) DO UPDATE SET
            state = EXCLUDED.state,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(key)
    .bind(state)
    .execute(pool)
    .await?;

    Ok(())
}

/// Tell every listener that the row under `key` changed.
pub async fn notify_state_changed(pool: &PgPool, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(STATE_CHANGED_CHANNEL)
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}
