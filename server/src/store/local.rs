//! Local store implementations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tally_engine::{Document, StateSnapshot};
use tokio::sync::RwLock;

use super::{LocalStore, StoreError, StoreResult};

/// Local store backed by a single JSON file.
///
/// The file holds a [`StateSnapshot`]. Writes land in a uniquely named
/// sibling file first and are renamed over the target, so a crash mid-write
/// leaves the previous copy intact.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    path: PathBuf,
}

impl FileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self) -> StoreResult<Option<Document>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(Some(StateSnapshot::from_json(&json)?.into_document())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, doc: &Document) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = StateSnapshot::new(doc.clone()).to_json()?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::trace!(path = %self.path.display(), updated_at = doc.updated_at, "Local state written");
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process local store.
///
/// Writes can be switched off to rehearse a failing disk.
#[derive(Debug)]
pub struct MemoryLocalStore {
    slot: RwLock<Option<Document>>,
    writable: AtomicBool,
}

impl Default for MemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            writable: AtomicBool::new(true),
        }
    }

    /// A store that already holds `doc`.
    pub fn with_document(doc: Document) -> Self {
        Self {
            slot: RwLock::new(Some(doc)),
            writable: AtomicBool::new(true),
        }
    }

    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self) -> StoreResult<Option<Document>> {
        Ok(self.slot.read().await.clone())
    }

    async fn put(&self, doc: &Document) -> StoreResult<()> {
        if !self.writable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("local store is read-only".to_string()));
        }
        *self.slot.write().await = Some(doc.clone());
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.slot.write().await = None;
        Ok(())
    }
}
