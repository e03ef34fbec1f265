//! Periodic persistence of the open presentation.

use crate::document::DocumentEnvelope;
use crate::storage::{FileStorage, Storage, StorageResult, StoredDocument};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Saves the presentation when it has unsaved changes and the interval has elapsed.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    /// Id the presentation is saved under. Assigned on first save if unset.
    current_doc_id: Option<String>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            current_doc_id: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_document_id(&mut self, id: Option<String>) {
        self.current_doc_id = id;
    }

    pub fn document_id(&self) -> Option<&str> {
        self.current_doc_id.as_deref()
    }

    /// Dirty and either never saved or the interval has elapsed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if [`should_save`](Self::should_save). Returns true if a save happened.
    pub async fn maybe_save(&mut self, document: &DocumentEnvelope) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(document).await?;
        Ok(true)
    }

    /// Save immediately under the current id.
    pub async fn save(&mut self, document: &DocumentEnvelope) -> StorageResult<()> {
        let doc_id = self
            .current_doc_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        self.storage.save(&doc_id, document).await?;

        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::info!("Saved presentation '{}' ({} slide(s))", doc_id, document.slides.len());
        Ok(())
    }

    /// Load a presentation and make it the current one.
    pub async fn load(&mut self, id: &str) -> StorageResult<DocumentEnvelope> {
        let doc = self.storage.load(id).await?;
        self.current_doc_id = Some(id.to_string());
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Ok(doc)
    }

    pub async fn list_documents(&self) -> StorageResult<Vec<StoredDocument>> {
        self.storage.list().await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// File storage in the platform's data directory.
pub fn create_default_storage() -> StorageResult<Arc<FileStorage>> {
    Ok(Arc::new(FileStorage::default_location()?))
}
