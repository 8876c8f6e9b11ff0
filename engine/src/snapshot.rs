//! Snapshot envelope for persisting the document on the device.
//!
//! The local store holds exactly one logical record: a fixed key and the full
//! document. The envelope adds a format version so older binaries refuse
//! documents written by newer ones instead of silently dropping fields.

use crate::{error::Result, Document, Error};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Key of the single record held by the local store.
pub const LOCAL_STATE_KEY: &str = "app_state";

/// A persisted copy of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Record key
    pub key: String,
    /// The full document, session role included
    pub document: Document,
}

impl StateSnapshot {
    /// Wrap a document under the local state key.
    pub fn new(document: Document) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            key: LOCAL_STATE_KEY.to_string(),
            document,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON, checking format version and key.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        if snapshot.key != LOCAL_STATE_KEY {
            return Err(Error::SnapshotKeyMismatch {
                expected: LOCAL_STATE_KEY.to_string(),
                actual: snapshot.key,
            });
        }

        Ok(snapshot)
    }

    /// Unwrap the document.
    pub fn into_document(self) -> Document {
        self.document
    }
}
