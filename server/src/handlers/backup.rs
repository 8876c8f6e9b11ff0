//! Backup export and import.

use serde::Serialize;
use tally_engine::{backup, clock};

use crate::coordinator::Coordinator;
use crate::error::Result;

/// An exported backup file.
#[derive(Debug)]
pub struct BackupFile {
    pub file_name: String,
    pub contents: String,
}

/// Response for a completed import.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub updated_at: u64,
    pub records: usize,
}

pub fn handle_export(coordinator: &Coordinator) -> Result<BackupFile> {
    let contents = backup::export(&coordinator.current())?;
    Ok(BackupFile {
        file_name: backup::backup_file_name(clock::now_millis()),
        contents,
    })
}

/// Replace every collection with the backup's contents.
///
/// A malformed backup is rejected before the document is touched.
pub fn handle_import(coordinator: &Coordinator, json: &str) -> Result<ImportResponse> {
    let mutation = backup::parse_import(json)?;
    let document = coordinator.persist(mutation);

    tracing::info!(
        updated_at = document.updated_at,
        records = document.record_count(),
        "Backup imported"
    );

    Ok(ImportResponse {
        updated_at: document.updated_at,
        records: document.record_count(),
    })
}
