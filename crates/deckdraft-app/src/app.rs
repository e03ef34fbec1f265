//! Headless editor shell driving a coordinator from commands.

use crate::commands::{COMMAND_HELP, Command, ParseError, ShapeKind};
use crate::shortcuts::ShortcutRegistry;
use deckdraft_core::storage::{AutoSaveManager, Storage, StorageError};
use deckdraft_core::{
    Coordinator, DocumentEnvelope, DocumentError, EditorConfig, Outcome, SceneObject, SceneSurface,
    SlideDeck, SurfaceError, SyncError,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Natural size assumed for placed images.
const IMAGE_SIZE: (f64, f64) = (400.0, 300.0);

/// Shell errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No object with id '{0}' on this slide")]
    UnknownObject(String),
    #[error("No shortcut bound to '{0}'")]
    UnknownShortcut(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub editor: EditorConfig,
    /// Save automatically after edits.
    pub autosave: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "DeckDraft".to_string(),
            editor: EditorConfig::default(),
            autosave: true,
        }
    }
}

impl AppConfig {
    /// Read a JSON configuration file; missing fields take their defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// The editor shell: one open presentation plus its document store.
pub struct App<S: Storage> {
    config: AppConfig,
    coordinator: Coordinator<SceneSurface>,
    autosave: AutoSaveManager<S>,
}

impl<S: Storage> App<S> {
    /// Open a fresh one-slide presentation.
    pub fn new(config: AppConfig, storage: Arc<S>) -> Self {
        let surface = SceneSurface::new(config.editor.surface.clone());
        let mut coordinator = Coordinator::open(surface, SlideDeck::new(), config.editor.clone());
        coordinator.settle();

        let mut autosave = AutoSaveManager::new(storage);
        autosave.set_interval(Duration::from_secs(config.editor.autosave_interval_secs));

        Self {
            config,
            coordinator,
            autosave,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Coordinator<SceneSurface> {
        &self.coordinator
    }

    pub fn autosave(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    /// Load a presentation file.
    pub fn import_file(&mut self, path: &Path) -> AppResult<usize> {
        let json = std::fs::read_to_string(path)?;
        let envelope = DocumentEnvelope::from_json(&json)?;
        let count = envelope.slides.len();
        self.load(envelope);
        log::info!("Imported {} slide(s) from {}", count, path.display());
        Ok(count)
    }

    /// Write the presentation to a file.
    pub fn export_file(&mut self, path: &Path) -> AppResult<()> {
        let envelope = self.coordinator.export()?;
        std::fs::write(path, envelope.to_json()?)?;
        log::info!("Exported presentation to {}", path.display());
        Ok(())
    }

    fn load(&mut self, envelope: DocumentEnvelope) {
        self.coordinator.import(envelope);
        self.coordinator.settle();
    }

    /// Run every line of a script. Failing lines are logged and skipped.
    /// Returns the output of the commands that produced any.
    pub async fn run_script(&mut self, script: &str) -> Vec<String> {
        let mut output = Vec::new();
        for (number, line) in script.lines().enumerate() {
            let result = match Command::parse_line(line) {
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => continue,
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(Some(text)) => output.push(text),
                Ok(None) => {}
                Err(e) => log::error!("Line {}: {}", number + 1, e),
            }
        }
        output
    }

    /// Run one command, let the surface settle and auto-save if due.
    pub async fn execute(&mut self, command: Command) -> AppResult<Option<String>> {
        let command = match command {
            Command::Key(combo) => {
                ShortcutRegistry::lookup(&combo).ok_or(AppError::UnknownShortcut(combo))?
            }
            other => other,
        };
        let modifies = command.modifies_document();

        let output = self.dispatch(command).await?;
        self.coordinator.settle();

        if modifies {
            self.autosave.mark_dirty();
        }
        if self.config.autosave && self.autosave.should_save() {
            let envelope = self.coordinator.export()?;
            self.autosave.maybe_save(&envelope).await?;
        }
        Ok(output)
    }

    async fn dispatch(&mut self, command: Command) -> AppResult<Option<String>> {
        let output = match command {
            Command::AddSlide => {
                self.coordinator.add_slide()?;
                None
            }
            Command::DeleteSlide(position) => {
                let outcome = self.coordinator.delete_slide(slide_index(position))?;
                report_noop(outcome, "Cannot delete that slide")
            }
            Command::SelectSlide(position) => {
                let outcome = self.coordinator.select_slide(slide_index(position))?;
                report_noop(outcome, "Already on that slide or no such slide")
            }
            Command::Add(kind) => {
                let object = match kind {
                    ShapeKind::Rect => SceneObject::rectangle(),
                    ShapeKind::Circle => SceneObject::circle(),
                    ShapeKind::Line => SceneObject::line(),
                    ShapeKind::Text(text) => SceneObject::textbox(text),
                    ShapeKind::Image(src) => SceneObject::image(src, IMAGE_SIZE.0, IMAGE_SIZE.1),
                };
                self.coordinator.surface_mut().add_object(object)
            }
            Command::Pick(id) => {
                if !self.coordinator.surface_mut().select(id.as_deref()) {
                    return Err(AppError::UnknownObject(id.unwrap_or_default()));
                }
                None
            }
            Command::RemoveSelected => {
                if self.coordinator.surface_mut().remove_selected() {
                    None
                } else {
                    Some("Nothing selected".to_string())
                }
            }
            Command::Move { id, dx, dy } => {
                self.modify(&id, |object| {
                    object.left += dx;
                    object.top += dy;
                })?;
                None
            }
            Command::Opacity { id, value } => {
                self.modify(&id, |object| object.opacity = value.clamp(0.0, 1.0))?;
                None
            }
            Command::EditText { id, text } => {
                if !self.coordinator.surface_mut().edit_text(&id, text) {
                    return Err(AppError::UnknownObject(id));
                }
                None
            }
            Command::ExitText => {
                self.coordinator.surface_mut().exit_text_editing();
                None
            }
            Command::Undo => report_noop(self.coordinator.undo()?, "Nothing to undo"),
            Command::Redo => report_noop(self.coordinator.redo()?, "Nothing to redo"),
            Command::Key(combo) => return Err(AppError::UnknownShortcut(combo)),
            Command::Save(id) => {
                if id.is_some() {
                    self.autosave.set_document_id(id);
                }
                let envelope = self.coordinator.export()?;
                self.autosave.save(&envelope).await?;
                self.autosave.document_id().map(|id| format!("Saved as {}", id))
            }
            Command::Open(id) => {
                let envelope = self.autosave.load(&id).await?;
                self.load(envelope);
                None
            }
            Command::List => {
                let documents = self.autosave.list_documents().await?;
                if documents.is_empty() {
                    Some("No saved presentations".to_string())
                } else {
                    let lines: Vec<String> = documents.iter().map(ToString::to_string).collect();
                    Some(lines.join("\n"))
                }
            }
            Command::Import(path) => {
                self.import_file(&path)?;
                None
            }
            Command::Export(path) => {
                self.export_file(&path)?;
                None
            }
            Command::ExportPng(path) => {
                let png_data = self.coordinator.export_png()?;
                std::fs::write(&path, png_data)?;
                log::info!("Exported slide image to {}", path.display());
                None
            }
            Command::Status => Some(self.status()),
            Command::Help => Some(help()),
        };
        Ok(output)
    }

    fn modify(&mut self, id: &str, f: impl FnOnce(&mut SceneObject)) -> AppResult<()> {
        if self.coordinator.surface_mut().modify_object(id, f) {
            Ok(())
        } else {
            Err(AppError::UnknownObject(id.to_string()))
        }
    }

    /// Deck, object and history summary.
    pub fn status(&self) -> String {
        let deck = self.coordinator.deck();
        let mut out = String::new();
        let _ = writeln!(out, "{}: {} slide(s)", self.config.title, deck.len());
        for (index, slide) in deck.slides().iter().enumerate() {
            let marker = if index == self.coordinator.active_index() { '*' } else { ' ' };
            let _ = writeln!(out, "{} {}. {}", marker, index + 1, slide.name);
        }
        for object in self.coordinator.surface().objects() {
            let _ = writeln!(
                out,
                "  - {} {} at ({}, {})",
                object.kind,
                object.id.as_deref().unwrap_or("-"),
                object.left,
                object.top
            );
        }
        if let Some(selection) = self.coordinator.selection() {
            let _ = writeln!(
                out,
                "selected: {} {}x{} at ({}, {}) opacity {}",
                selection.kind,
                selection.width(),
                selection.height(),
                selection.x(),
                selection.y(),
                selection.opacity
            );
        }
        let _ = write!(
            out,
            "undo: {}, redo: {}",
            self.coordinator.can_undo(),
            self.coordinator.can_redo()
        );
        out
    }

    /// Flush the presentation, save it if it has unsaved changes and release the surface.
    pub async fn close(mut self) -> AppResult<SlideDeck> {
        if self.config.autosave && self.autosave.is_dirty() {
            let envelope = self.coordinator.export()?;
            self.autosave.save(&envelope).await?;
        }
        Ok(self.coordinator.close())
    }
}

/// Convert a 1-based slide position; 0 maps to an index that is always out of range.
fn slide_index(position: usize) -> usize {
    position.checked_sub(1).unwrap_or(usize::MAX)
}

fn report_noop(outcome: Outcome, message: &str) -> Option<String> {
    (outcome == Outcome::NoOp).then(|| message.to_string())
}

fn help() -> String {
    let mut out = String::from("=== Commands ===\n");
    for (syntax, description) in COMMAND_HELP {
        let _ = writeln!(out, "  {:24} {}", syntax, description);
    }
    out.push_str(&ShortcutRegistry::describe());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckdraft_core::storage::FileStorage;
    use pollster::block_on;
    use tempfile::{TempDir, tempdir};

    fn app_in(dir: &TempDir) -> App<FileStorage> {
        let storage = FileStorage::new(dir.path().join("store")).unwrap();
        App::new(AppConfig::default(), Arc::new(storage))
    }

    fn app() -> (TempDir, App<FileStorage>) {
        let dir = tempdir().unwrap();
        let app = app_in(&dir);
        (dir, app)
    }

    fn run(app: &mut App<FileStorage>, script: &str) -> Vec<String> {
        block_on(app.run_script(script))
    }

    fn added_id(app: &mut App<FileStorage>, line: &str) -> String {
        let command = Command::parse_line(line).unwrap().unwrap();
        block_on(app.execute(command)).unwrap().unwrap()
    }

    #[test]
    fn test_slide_script() {
        let (_dir, mut app) = app();
        run(&mut app, "add-slide\nadd-slide\nselect 3\nadd rect\nselect 1\n");

        let deck = app.coordinator().deck();
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.active_index(), 0);
        assert!(deck.get(2).unwrap().content.as_str().contains("\"rect\""));
    }

    #[test]
    fn test_undo_via_shortcut() {
        let (_dir, mut app) = app();
        run(&mut app, "add rect\nadd circle\nkey Ctrl+Z\n");
        assert_eq!(app.coordinator().surface().objects().len(), 1);

        run(&mut app, "key Ctrl+Shift+Z\n");
        assert_eq!(app.coordinator().surface().objects().len(), 2);
    }

    #[test]
    fn test_object_commands() {
        let (_dir, mut app) = app();
        let id = added_id(&mut app, "add text Title");

        run(&mut app, &format!("move {id} 10 20\nopacity {id} 0.5\nedit-text {id} Agenda\n"));
        let object = app.coordinator().surface().object(&id).unwrap();
        assert_eq!(object.left, 110.0);
        assert_eq!(object.top, 120.0);
        assert_eq!(object.opacity, 0.5);
        assert_eq!(object.text.as_deref(), Some("Agenda"));
        assert!(app.coordinator().deck().get(0).unwrap().content.as_str().contains("Agenda"));
    }

    #[test]
    fn test_remove_selected_with_shortcut() {
        let (_dir, mut app) = app();
        let id = added_id(&mut app, "add rect");
        run(&mut app, &format!("pick none\npick {id}\nkey Ctrl+Delete\n"));
        assert!(app.coordinator().surface().objects().is_empty());
    }

    #[test]
    fn test_unknown_object_is_an_error() {
        let (_dir, mut app) = app();
        let result = block_on(app.execute(Command::Pick(Some("missing".to_string()))));
        assert!(matches!(result, Err(AppError::UnknownObject(_))));
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let (_dir, mut app) = app();
        let output = run(&mut app, "bogus\nselect zero\nadd-slide\nstatus\n");
        assert_eq!(app.coordinator().deck().len(), 2);
        assert!(output[0].contains("2 slide(s)"));
    }

    #[test]
    fn test_noop_reported() {
        let (_dir, mut app) = app();
        let output = run(&mut app, "undo\nselect 1\ndelete-slide 1\n");
        assert_eq!(
            output,
            vec![
                "Nothing to undo",
                "Already on that slide or no such slide",
                "Cannot delete that slide"
            ]
        );
    }

    #[test]
    fn test_save_open_and_list() {
        let (dir, mut app) = app();
        let output = run(&mut app, "list\nadd-slide\nsave talk\n");
        assert_eq!(output, vec!["No saved presentations", "Saved as talk"]);

        let mut other = app_in(&dir);
        let output = run(&mut other, "list\nopen talk\n");
        // The auto-save before `save talk` is listed under its generated id.
        assert!(output[0].lines().any(|line| line.starts_with("talk (2 slide(s), ")));
        assert_eq!(other.coordinator().deck().len(), 2);
        assert_eq!(other.autosave().document_id(), Some("talk"));
    }

    #[test]
    fn test_close_saves_unsaved_changes() {
        let (dir, mut app) = app();
        run(&mut app, "save talk\nadd-slide\nadd-slide\n");
        block_on(app.close()).unwrap();

        let mut other = app_in(&dir);
        run(&mut other, "open talk\n");
        assert_eq!(other.coordinator().deck().len(), 3);
    }

    #[test]
    fn test_new_app_starts_with_one_blank_slide() {
        let (dir, mut app) = app();
        run(&mut app, "add-slide\nsave talk\n");

        let other = app_in(&dir);
        assert_eq!(other.coordinator().deck().len(), 1);
        assert!(other.autosave().document_id().is_none());
    }

    #[test]
    fn test_export_import_files() {
        let dir = tempdir().unwrap();
        let deck_path = dir.path().join("deck.json");
        let png_path = dir.path().join("slide.png");

        let (_dir, mut app) = app();
        run(
            &mut app,
            &format!(
                "add circle\nadd-slide\nexport {}\nexport-png {}\n",
                deck_path.display(),
                png_path.display()
            ),
        );
        assert!(png_path.exists());

        let mut other = app_in(&dir);
        assert_eq!(other.import_file(&deck_path).unwrap(), 2);
        assert_eq!(other.coordinator().surface().objects().len(), 1);
    }

    #[test]
    fn test_config_file_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"title": "Q3 review", "editor": {"history_limit": 5}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.title, "Q3 review");
        assert_eq!(config.editor.history_limit, 5);
        assert!(config.autosave);
    }
}
