//! WebSocket message protocol definitions.
//!
//! All messages are JSON objects tagged by `type` (snake_case). Documents and
//! mutations use the same camelCase shape as the HTTP API; a mutation names
//! its variant in `op`.

use serde::{Deserialize, Serialize};
use tally_engine::{Document, Mutation};

use crate::coordinator::SyncStatus;

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request the current document.
    Get {
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Apply a mutation. Requires an admin session.
    Mutate {
        mutation: Mutation,
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The current document. Sent on connect, on request and after every
    /// in-memory change.
    State {
        document: Document,
        status: SyncStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Response to a mutation.
    Mutated {
        /// Document right after the mutation was applied
        document: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        /// Error description
        message: String,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Create a state message. The session role never leaves the server.
    pub fn state(document: &Document, status: SyncStatus, request_id: Option<String>) -> Self {
        ServerMessage::State {
            document: document.without_session(),
            status,
            request_id,
        }
    }
}
