//! DeckDraft Core Library
//!
//! Platform-agnostic slide deck model, undo history and the coordinator that keeps
//! an editing surface in sync with both.

pub mod config;
pub mod coordinator;
pub mod document;
pub mod history;
pub mod scene;
pub mod selection;
pub mod slides;
pub mod storage;
pub mod surface;

pub use config::{EditorConfig, SurfaceConfig};
pub use coordinator::{Coordinator, Outcome, SyncError, SyncResult};
pub use document::{DocumentEnvelope, DocumentError};
pub use history::{History, MAX_UNDO_HISTORY};
pub use scene::{SceneObject, SceneSurface};
pub use selection::SelectionInfo;
pub use slides::{Blob, Slide, SlideDeck, SlideId};
pub use storage::{AutoSaveManager, FileStorage, Storage, StorageError, StoredDocument};
pub use surface::{LoadTicket, MutationKind, SelectedEntity, Surface, SurfaceError, SurfaceEvent};
