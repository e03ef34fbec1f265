//! Editor configuration.

use crate::history::MAX_UNDO_HISTORY;
use serde::{Deserialize, Serialize};

/// Settings for creating a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    /// Background color as `#rrggbb`.
    pub background: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: "#ffffff".to_string(),
        }
    }
}

/// Settings for the synchronization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub surface: SurfaceConfig,
    /// Maximum number of undo states.
    pub history_limit: usize,
    /// Scale of slide previews relative to the surface.
    pub thumbnail_scale: f64,
    /// Scale used when exporting a slide as an image.
    pub export_scale: f64,
    /// Upper bound on event pumps performed by `settle`.
    pub settle_limit: usize,
    /// Auto-save interval in seconds.
    pub autosave_interval_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            history_limit: MAX_UNDO_HISTORY,
            thumbnail_scale: 0.2,
            export_scale: 2.0,
            settle_limit: 64,
            autosave_interval_secs: crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
