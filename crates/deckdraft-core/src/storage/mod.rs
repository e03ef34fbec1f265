//! Named presentation store.
//!
//! Presentations are kept as whole [`DocumentEnvelope`]s, the same shape the
//! shell imports and exports, under a caller-chosen id.

mod autosave;
mod file;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, create_default_storage};
pub use file::FileStorage;

use crate::document::{DocumentEnvelope, DocumentError};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No stored presentation named '{0}'")]
    NotFound(String),
    #[error("Invalid presentation id '{0}'")]
    InvalidId(String),
    #[error("Could not determine a data directory")]
    NoDataDir,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Failed to encode presentation: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Listing entry for a stored presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: String,
    pub slide_count: usize,
    /// `createdAt` of the stored envelope.
    pub created_at: String,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, envelope: &DocumentEnvelope) -> Self {
        Self {
            id: id.into(),
            slide_count: envelope.slides.len(),
            created_at: envelope.created_at.clone(),
        }
    }
}

impl std::fmt::Display for StoredDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} slide(s)", self.id, self.slide_count)?;
        if !self.created_at.is_empty() {
            write!(f, ", {}", self.created_at)?;
        }
        write!(f, ")")
    }
}

/// Backend holding saved presentations.
pub trait Storage: Send + Sync {
    /// Store `document` under `id`, replacing any previous version.
    fn save(&self, id: &str, document: &DocumentEnvelope) -> BoxFuture<'_, StorageResult<()>>;

    /// Read the presentation stored under `id`.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<DocumentEnvelope>>;

    /// Every readable stored presentation, ordered by id.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<StoredDocument>>>;
}
