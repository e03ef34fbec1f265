//! DeckDraft Application
//!
//! Headless editor shell: runs command scripts against an open presentation,
//! with keyboard shortcuts and file/store persistence.

mod app;
mod commands;
mod shortcuts;

pub use app::{App, AppConfig, AppError, AppResult};
pub use commands::{COMMAND_HELP, Command, ParseError, ShapeKind};
pub use shortcuts::{KeyCombo, Shortcut, ShortcutRegistry};
