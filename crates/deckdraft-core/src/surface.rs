//! Editing surface abstraction.
//!
//! The surface is the live, mutable editing canvas. It is owned by the
//! [`Coordinator`](crate::coordinator::Coordinator) for the whole time a
//! document is open and is never shared.

use crate::slides::Blob;
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("Serialization failed: {0}")]
    Serialize(String),
    #[error("Deserialization failed: {0}")]
    Deserialize(String),
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Surface has been disposed")]
    Disposed,
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Identifies one deserialize request.
///
/// The generation grows with every load the coordinator issues, so a
/// completion carrying an older ticket is known to be stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
    /// Index of the slide the load was issued for.
    pub slide: usize,
}

/// What a committed mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Added,
    Removed,
    Modified,
    TextChanged,
    TextEditingExited,
}

impl MutationKind {
    /// Text notifications can fire before the edit is materialized.
    pub fn is_text(self) -> bool {
        matches!(self, MutationKind::TextChanged | MutationKind::TextEditingExited)
    }
}

/// The raw description of the surface's selected entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedEntity {
    /// Entity type as the surface names it ("rect", "textbox", ...).
    pub kind: String,
    pub id: Option<String>,
    pub left: f64,
    pub top: f64,
    /// Unscaled width.
    pub width: f64,
    /// Unscaled height.
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub opacity: Option<f64>,
}

/// Notifications emitted by a surface and collected via [`Surface::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The selection changed; `None` when it was cleared.
    SelectionChanged(Option<SelectedEntity>),
    /// A user edit was committed on the surface.
    MutationCommitted(MutationKind),
    /// A deserialize request finished.
    LoadCompleted {
        ticket: LoadTicket,
        result: SurfaceResult<()>,
    },
}

/// Trait for editing surfaces.
///
/// Loads are asynchronous: [`Surface::deserialize`] only starts one, and its
/// completion is reported later as [`SurfaceEvent::LoadCompleted`] carrying the
/// same ticket. Events are collected and must be polled.
pub trait Surface {
    /// Serialize the full live state.
    fn serialize(&self) -> SurfaceResult<Blob>;

    /// Start replacing the live state with `blob`.
    ///
    /// An error means the request was refused and the surface is unchanged.
    fn deserialize(&mut self, blob: &Blob, ticket: LoadTicket) -> SurfaceResult<()>;

    /// Remove every object from the live state.
    fn clear(&mut self);

    /// Present the live state.
    fn render_all(&mut self);

    /// Encode the live state as a PNG image, scaled by `scale`.
    fn render_png(&self, scale: f64) -> SurfaceResult<Vec<u8>>;

    /// Drain pending notifications.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Release the surface. No other method may be called afterwards.
    fn dispose(&mut self) {}
}
