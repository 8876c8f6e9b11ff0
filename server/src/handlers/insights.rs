//! Insight generation.

use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::insight::InsightClient;

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub insight: String,
}

/// Generate an insight from a snapshot of the current document.
pub async fn handle_insight(coordinator: &Coordinator, client: &InsightClient) -> InsightResponse {
    let snapshot = coordinator.current();
    InsightResponse {
        insight: client.generate(&snapshot).await,
    }
}
