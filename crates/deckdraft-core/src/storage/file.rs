//! File-based storage: one pretty-printed envelope per JSON file.

use super::{BoxFuture, Storage, StorageError, StorageResult, StoredDocument};
use crate::document::DocumentEnvelope;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores presentations as `<id>.json` files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/deckdraft/documents/`
    /// On Windows: `%LOCALAPPDATA%\deckdraft\documents\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or(StorageError::NoDataDir)?;

        Self::new(base.join("deckdraft").join("documents"))
    }

    /// Path for `id`. Characters outside `[A-Za-z0-9_-]` become `_`.
    fn document_path(&self, id: &str) -> StorageResult<PathBuf> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Ok(self.base_path.join(format!("{}.json", safe_id)))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn read_envelope(path: &Path) -> StorageResult<DocumentEnvelope> {
    let json = fs::read_to_string(path)?;
    Ok(DocumentEnvelope::from_json(&json)?)
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &DocumentEnvelope) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        let json = document.to_json();

        Box::pin(async move {
            let path = path?;
            fs::write(&path, json?)?;
            log::debug!("Saved presentation to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<DocumentEnvelope>> {
        let path = self.document_path(id);
        let id = id.to_string();

        Box::pin(async move {
            match read_envelope(&path?) {
                Err(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    Err(StorageError::NotFound(id))
                }
                other => other,
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<StoredDocument>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            let mut documents = Vec::new();
            for entry in fs::read_dir(&base)?.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match read_envelope(&path) {
                    Ok(envelope) => documents.push(StoredDocument::new(id, &envelope)),
                    Err(e) => log::warn!("Skipping unreadable presentation {}: {}", path.display(), e),
                }
            }
            documents.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(documents)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::{Blob, Slide};
    use pollster::block_on;
    use tempfile::tempdir;

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (dir, storage)
    }

    fn document(names: &[&str]) -> DocumentEnvelope {
        DocumentEnvelope::new(names.iter().map(|name| Slide::new(*name)).collect())
    }

    #[test]
    fn test_file_storage_save_load() {
        let (_dir, storage) = storage();
        let doc = DocumentEnvelope::new(vec![
            Slide::with_content("Intro", Blob::from(r#"{"objects":[]}"#)),
            Slide::new("Slide 2"),
        ]);

        block_on(storage.save("talk", &doc)).unwrap();
        let loaded = block_on(storage.load("talk")).unwrap();

        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_file_is_pretty_printed_envelope() {
        let (dir, storage) = storage();
        block_on(storage.save("talk", &document(&["Slide 1"]))).unwrap();

        let json = fs::read_to_string(dir.path().join("talk.json")).unwrap();
        assert!(json.contains("\n  \"version\": \"1.0.0\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn test_file_storage_not_found() {
        let (_dir, storage) = storage();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(id)) if id == "nonexistent"));
    }

    #[test]
    fn test_corrupt_file_is_document_error() {
        let (dir, storage) = storage();
        fs::write(dir.path().join("broken.json"), r#"{"slides": []}"#).unwrap();

        let result = block_on(storage.load("broken"));
        assert!(matches!(result, Err(StorageError::Document(_))));
    }

    #[test]
    fn test_list_summarizes_readable_presentations() {
        let (dir, storage) = storage();
        let two = document(&["Intro", "Outro"]);
        block_on(storage.save("doc2", &two)).unwrap();
        block_on(storage.save("doc1", &document(&["Only"]))).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let listed = block_on(storage.list()).unwrap();
        let ids: Vec<&str> = listed.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["doc1", "doc2"]);
        assert_eq!(listed[1].slide_count, 2);
        assert_eq!(listed[1].created_at, two.created_at);
        assert!(listed[1].to_string().starts_with("doc2 (2 slide(s), "));
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let (dir, storage) = storage();
        let doc = document(&["Slide 1"]);

        block_on(storage.save("talks/q3:final*", &doc)).unwrap();
        assert!(dir.path().join("talks_q3_final_.json").exists());
        assert_eq!(block_on(storage.load("talks/q3:final*")).unwrap(), doc);
    }

    #[test]
    fn test_blank_id_rejected() {
        let (dir, storage) = storage();
        let result = block_on(storage.save("  ", &document(&["Slide 1"])));
        assert!(matches!(result, Err(StorageError::InvalidId(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
