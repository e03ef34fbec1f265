//! Ordered slide collection and the active-slide pointer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Serialized scene written by an empty surface.
pub const EMPTY_SCENE: &str = r#"{"version":"5.3.0","objects":[]}"#;

/// Opaque serialized snapshot of the full surface state.
///
/// Blobs are produced by [`Surface::serialize`](crate::surface::Surface::serialize)
/// and are never inspected by the deck or the history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(String);

impl Blob {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    /// The blob of a surface with no objects.
    pub fn empty_scene() -> Self {
        Self(EMPTY_SCENE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the blob carries no data at all (not the same as an empty scene).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for Blob {
    fn default() -> Self {
        Self::empty_scene()
    }
}

impl From<String> for Blob {
    fn from(data: String) -> Self {
        Self(data)
    }
}

impl From<&str> for Blob {
    fn from(data: &str) -> Self {
        Self(data.to_string())
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique slide identifier.
///
/// Identifiers read from files are kept verbatim; fresh ones are UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(String);

impl SlideId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SlideId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SlideId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single slide: a named, independently persisted blob plus a cached preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    /// Display label.
    pub name: String,
    /// Serialized surface state.
    pub content: Blob,
    /// Cached preview image (PNG data URL). May be stale or absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Slide {
    /// Create a slide with empty scene content.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SlideId::new(),
            name: name.into(),
            content: Blob::empty_scene(),
            thumbnail: None,
        }
    }

    /// Create a slide with the given content.
    pub fn with_content(name: impl Into<String>, content: Blob) -> Self {
        Self {
            content,
            ..Self::new(name)
        }
    }
}

/// Display name for the slide at `position` (zero based).
pub fn slide_name(position: usize) -> String {
    format!("Slide {}", position + 1)
}

/// The ordered slide list of a document and its active slide.
///
/// Invariant: the deck always holds at least one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDeck {
    slides: Vec<Slide>,
    active_index: usize,
}

impl Default for SlideDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideDeck {
    /// Create a deck holding a single empty slide.
    pub fn new() -> Self {
        Self {
            slides: vec![Slide::new(slide_name(0))],
            active_index: 0,
        }
    }

    /// Create a deck from existing slides. Returns `None` for an empty list.
    pub fn from_slides(slides: Vec<Slide>) -> Option<Self> {
        if slides.is_empty() {
            return None;
        }
        Some(Self {
            slides,
            active_index: 0,
        })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false for a deck built through this API.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_slide(&self) -> Option<&Slide> {
        self.slides.get(self.active_index)
    }

    /// Append an empty slide named after the new count.
    /// The active slide does not change.
    pub fn add_slide(&mut self) -> usize {
        let index = self.slides.len();
        self.slides.push(Slide::new(slide_name(index)));
        index
    }

    /// Remove the slide at `index`.
    ///
    /// Refused when it is the only slide or the index is out of range.
    /// All remaining slides are renamed sequentially, custom names included.
    pub fn delete_slide(&mut self, index: usize) -> bool {
        if self.slides.len() <= 1 || index >= self.slides.len() {
            return false;
        }

        self.slides.remove(index);

        for (position, slide) in self.slides.iter_mut().enumerate() {
            slide.name = slide_name(position);
        }

        if self.active_index >= self.slides.len() {
            self.active_index = self.slides.len() - 1;
        } else if self.active_index > index {
            self.active_index -= 1;
        }

        true
    }

    /// Set the active slide. Callers must pass an index in range.
    pub fn set_active(&mut self, index: usize) {
        debug_assert!(index < self.slides.len(), "active index {index} out of range");
        self.active_index = index;
    }

    /// Replace the stored content of a slide. No-op when out of range.
    pub fn update_content(&mut self, index: usize, content: Blob) -> bool {
        match self.slides.get_mut(index) {
            Some(slide) => {
                slide.content = content;
                true
            }
            None => false,
        }
    }

    /// Replace the cached preview of a slide. No-op when out of range.
    pub fn update_thumbnail(&mut self, index: usize, thumbnail: String) -> bool {
        match self.slides.get_mut(index) {
            Some(slide) => {
                slide.thumbnail = Some(thumbnail);
                true
            }
            None => false,
        }
    }

    /// Replace every slide and reset the active slide to the first one.
    /// An empty list is refused so the deck never becomes empty.
    pub fn load_document(&mut self, slides: Vec<Slide>) -> bool {
        if slides.is_empty() {
            return false;
        }
        self.slides = slides;
        self.active_index = 0;
        true
    }
}
