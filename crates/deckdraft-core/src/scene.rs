//! In-memory scene graph surface.
//!
//! `SceneSurface` reads and writes the JSON scene format used by the browser
//! editor (`{"version": ..., "objects": [...]}`). Fields it does not know are
//! carried through untouched so foreign blobs survive a load/serialize cycle.

use crate::config::SurfaceConfig;
use crate::slides::Blob;
use crate::surface::{
    LoadTicket, MutationKind, SelectedEntity, Surface, SurfaceError, SurfaceEvent, SurfaceResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use uuid::Uuid;

/// Scene format version written by an empty surface.
pub const SCENE_VERSION: &str = "5.3.0";

/// Approximate text line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.16;

fn one() -> f64 {
    1.0
}

fn is_one(v: &f64) -> bool {
    *v == 1.0
}

/// A single object on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    /// Object type ("rect", "circle", "line", "textbox", "image", ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_x: f64,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_y: f64,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Fields this surface does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SceneObject {
    fn base(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: Some(new_object_id()),
            left: 100.0,
            top: 100.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            fill: None,
            stroke: None,
            stroke_width: None,
            text: None,
            font_size: None,
            font_family: None,
            src: None,
            extra: Map::new(),
        }
    }

    /// Outlined rectangle with a transparent fill.
    pub fn rectangle() -> Self {
        Self {
            width: 150.0,
            height: 100.0,
            fill: Some("transparent".to_string()),
            stroke: Some("#000000".to_string()),
            stroke_width: Some(2.0),
            ..Self::base("rect")
        }
    }

    /// Outlined circle of radius 50.
    pub fn circle() -> Self {
        let mut circle = Self {
            width: 100.0,
            height: 100.0,
            fill: Some("transparent".to_string()),
            stroke: Some("#000000".to_string()),
            stroke_width: Some(2.0),
            ..Self::base("circle")
        };
        circle.extra.insert("radius".to_string(), Value::from(50.0));
        circle
    }

    /// Horizontal line from (50, 100) to (200, 100).
    pub fn line() -> Self {
        Self {
            left: 50.0,
            width: 150.0,
            stroke: Some("#000000".to_string()),
            stroke_width: Some(3.0),
            ..Self::base("line")
        }
    }

    /// Text box with the given content.
    pub fn textbox(text: impl Into<String>) -> Self {
        let font_size = 20.0;
        Self {
            width: 200.0,
            height: font_size * LINE_HEIGHT,
            fill: Some("#000000".to_string()),
            text: Some(text.into()),
            font_size: Some(font_size),
            font_family: Some("Arial".to_string()),
            ..Self::base("textbox")
        }
    }

    /// Image placed at half scale.
    pub fn image(src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale_x: 0.5,
            scale_y: 0.5,
            src: Some(src.into()),
            ..Self::base("image")
        }
    }

    /// On-surface bounds as (x0, y0, x1, y1).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.left,
            self.top,
            self.left + self.width * self.scale_x,
            self.top + self.height * self.scale_y,
        )
    }

    fn to_entity(&self) -> SelectedEntity {
        SelectedEntity {
            kind: self.kind.clone(),
            id: self.id.clone(),
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            opacity: Some(self.opacity),
        }
    }
}

fn new_object_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Borrowed form used for serialization.
#[derive(Serialize)]
struct SceneRef<'a> {
    version: &'a str,
    objects: &'a [SceneObject],
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Owned form used for deserialization.
#[derive(Deserialize)]
struct Scene {
    #[serde(default)]
    version: String,
    #[serde(default)]
    objects: Vec<SceneObject>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// In-memory editing surface.
///
/// Loads complete on the next [`Surface::poll_events`] call. Text edits are
/// reported before they are applied: the new text only becomes visible to
/// `serialize` after a second poll.
#[derive(Debug)]
pub struct SceneSurface {
    config: SurfaceConfig,
    version: String,
    objects: Vec<SceneObject>,
    extra: Map<String, Value>,
    selected: Option<usize>,
    /// Loads started but not yet completed.
    loading: VecDeque<(LoadTicket, Scene)>,
    /// Text edits reported during the current poll cycle.
    staged_text: Vec<(usize, String)>,
    /// Text edits reported during the previous poll cycle.
    settling_text: Vec<(usize, String)>,
    events: Vec<SurfaceEvent>,
    frames_rendered: u64,
    disposed: bool,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("version", &self.version)
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl SceneSurface {
    /// Create an empty surface.
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            version: SCENE_VERSION.to_string(),
            objects: Vec::new(),
            extra: Map::new(),
            selected: None,
            loading: VecDeque::new(),
            staged_text: Vec::new(),
            settling_text: Vec::new(),
            events: Vec::new(),
            frames_rendered: 0,
            disposed: false,
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Objects back to front.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.position(id).map(|i| &self.objects[i])
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selected.and_then(|i| self.objects.get(i))
    }

    /// Number of `render_all` calls so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id.as_deref() == Some(id))
    }

    fn emit(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }

    fn set_selected(&mut self, index: Option<usize>) {
        if self.selected == index && index.is_none() {
            return;
        }
        self.selected = index;
        let entity = index.and_then(|i| self.objects.get(i)).map(SceneObject::to_entity);
        self.emit(SurfaceEvent::SelectionChanged(entity));
    }

    fn drop_pending_text(&mut self) {
        self.staged_text.clear();
        self.settling_text.clear();
    }

    /// Add an object on top and select it. Returns its id.
    pub fn add_object(&mut self, object: SceneObject) -> Option<String> {
        if self.disposed {
            return None;
        }
        let id = object.id.clone();
        self.objects.push(object);
        self.emit(SurfaceEvent::MutationCommitted(MutationKind::Added));
        self.set_selected(Some(self.objects.len() - 1));
        id
    }

    /// Remove an object by id.
    pub fn remove_object(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Remove the selected object, if any.
    pub fn remove_selected(&mut self) -> bool {
        match self.selected {
            Some(index) if index < self.objects.len() => {
                self.remove_at(index);
                true
            }
            _ => false,
        }
    }

    fn remove_at(&mut self, index: usize) {
        self.objects.remove(index);
        self.drop_pending_text();
        self.emit(SurfaceEvent::MutationCommitted(MutationKind::Removed));
        match self.selected {
            Some(s) if s == index => self.set_selected(None),
            Some(s) if s > index => self.selected = Some(s - 1),
            _ => {}
        }
    }

    /// Modify an object in place and commit the change.
    pub fn modify_object(&mut self, id: &str, f: impl FnOnce(&mut SceneObject)) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        f(&mut self.objects[index]);
        self.emit(SurfaceEvent::MutationCommitted(MutationKind::Modified));
        if self.selected == Some(index) {
            self.set_selected(Some(index));
        }
        true
    }

    /// Select an object by id, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) => match self.position(id) {
                Some(index) => {
                    self.set_selected(Some(index));
                    true
                }
                None => false,
            },
            None => {
                self.set_selected(None);
                true
            }
        }
    }

    /// Replace the text of a text object.
    ///
    /// The change is reported immediately but applied one poll later.
    pub fn edit_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if self.objects[index].text.is_none() {
            return false;
        }
        self.staged_text.push((index, text.into()));
        self.emit(SurfaceEvent::MutationCommitted(MutationKind::TextChanged));
        true
    }

    /// Leave text editing mode.
    pub fn exit_text_editing(&mut self) {
        self.emit(SurfaceEvent::MutationCommitted(MutationKind::TextEditingExited));
    }

    fn apply_settled_text(&mut self) {
        for (index, text) in std::mem::take(&mut self.settling_text) {
            if let Some(object) = self.objects.get_mut(index) {
                object.text = Some(text);
            }
        }
        self.settling_text = std::mem::take(&mut self.staged_text);
    }

    fn complete_loads(&mut self) {
        while let Some((ticket, scene)) = self.loading.pop_front() {
            self.version = if scene.version.is_empty() {
                SCENE_VERSION.to_string()
            } else {
                scene.version
            };
            self.objects = scene.objects;
            self.extra = scene.extra;
            self.drop_pending_text();
            if self.selected.take().is_some() {
                self.emit(SurfaceEvent::SelectionChanged(None));
            }
            self.emit(SurfaceEvent::LoadCompleted {
                ticket,
                result: Ok(()),
            });
        }
    }

    fn rasterize(&self, scale: f64) -> (u32, u32, Vec<u8>) {
        let width = ((self.config.width as f64 * scale).round() as u32).max(1);
        let height = ((self.config.height as f64 * scale).round() as u32).max(1);
        let background = parse_color(&self.config.background).unwrap_or([255, 255, 255, 255]);

        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&background);
        }

        let mut canvas = Raster {
            width,
            height,
            pixels,
        };

        for object in &self.objects {
            let (x0, y0, x1, y1) = object.bounds();
            let rect = (x0 * scale, y0 * scale, x1 * scale, y1 * scale);
            let opacity = object.opacity.clamp(0.0, 1.0);

            if let Some(color) = object.fill.as_deref().and_then(parse_color) {
                canvas.fill_rect(rect, color, opacity);
            }
            if let Some(color) = object.stroke.as_deref().and_then(parse_color) {
                canvas.stroke_rect(rect, color, opacity);
            }
        }

        (width, height, canvas.pixels)
    }
}

/// RGBA8 pixel buffer.
struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    fn blend(&mut self, x: u32, y: u32, color: [u8; 4], opacity: f64) {
        if x >= self.width || y >= self.height {
            return;
        }
        let alpha = color[3] as f64 / 255.0 * opacity;
        let offset = ((y * self.width + x) * 4) as usize;
        for channel in 0..3 {
            let dst = self.pixels[offset + channel] as f64;
            let src = color[channel] as f64;
            self.pixels[offset + channel] = (src * alpha + dst * (1.0 - alpha)).round() as u8;
        }
    }

    fn clamp_span(&self, from: f64, to: f64, limit: u32) -> (u32, u32) {
        let lo = from.min(to).floor().max(0.0) as u32;
        let hi = (from.max(to).ceil().max(0.0) as u32).min(limit);
        (lo, hi.max(lo))
    }

    fn fill_rect(&mut self, (x0, y0, x1, y1): (f64, f64, f64, f64), color: [u8; 4], opacity: f64) {
        let (xa, xb) = self.clamp_span(x0, x1, self.width);
        let (ya, yb) = self.clamp_span(y0, y1, self.height);
        for y in ya..yb {
            for x in xa..xb {
                self.blend(x, y, color, opacity);
            }
        }
    }

    fn stroke_rect(&mut self, (x0, y0, x1, y1): (f64, f64, f64, f64), color: [u8; 4], opacity: f64) {
        let (xa, xb) = self.clamp_span(x0, x1, self.width);
        let (ya, yb) = self.clamp_span(y0, y1, self.height);
        let xb = xb.max(xa + 1);
        let yb = yb.max(ya + 1);
        for x in xa..xb {
            self.blend(x, ya, color, opacity);
            self.blend(x, yb - 1, color, opacity);
        }
        for y in ya..yb {
            self.blend(xa, y, color, opacity);
            self.blend(xb - 1, y, color, opacity);
        }
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Transparent or unknown colors yield `None`.
pub fn parse_color(color: &str) -> Option<[u8; 4]> {
    let hex = color.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let rgba = match hex.len() {
        3 => [
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
            255,
        ],
        6 => [channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, 255],
        8 => [
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ],
        _ => return None,
    };
    (rgba[3] > 0).then_some(rgba)
}

impl Surface for SceneSurface {
    fn serialize(&self) -> SurfaceResult<Blob> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        let scene = SceneRef {
            version: &self.version,
            objects: &self.objects,
            extra: &self.extra,
        };
        serde_json::to_string(&scene)
            .map(Blob::from)
            .map_err(|e| SurfaceError::Serialize(e.to_string()))
    }

    fn deserialize(&mut self, blob: &Blob, ticket: LoadTicket) -> SurfaceResult<()> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        let scene: Scene = serde_json::from_str(blob.as_str())
            .map_err(|e| SurfaceError::Deserialize(e.to_string()))?;
        self.loading.push_back((ticket, scene));
        Ok(())
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.extra.clear();
        self.version = SCENE_VERSION.to_string();
        self.drop_pending_text();
        if self.selected.take().is_some() {
            self.emit(SurfaceEvent::SelectionChanged(None));
        }
    }

    fn render_all(&mut self) {
        self.frames_rendered += 1;
    }

    fn render_png(&self, scale: f64) -> SurfaceResult<Vec<u8>> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SurfaceError::Render(format!("invalid scale {scale}")));
        }
        let (width, height, pixels) = self.rasterize(scale);

        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| SurfaceError::Render(e.to_string()))?;
            writer
                .write_image_data(&pixels)
                .map_err(|e| SurfaceError::Render(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| SurfaceError::Render(e.to_string()))?;
        }
        Ok(png_data)
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.apply_settled_text();
        self.complete_loads();
        std::mem::take(&mut self.events)
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.objects.clear();
        self.loading.clear();
        self.events.clear();
        self.drop_pending_text();
        self.selected = None;
    }
}
