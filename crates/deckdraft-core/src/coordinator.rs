//! Synchronization between the editing surface, the slide deck and the history.
//!
//! The surface is a single mutable resource with asynchronous loads. Every
//! operation here moves data between it and the two pure data managers in a
//! fixed order:
//!
//! - slide switch: flush the surface into the slide being left, clear the
//!   surface, then load the target slide.
//! - edit: serialize the surface into the active slide and the history.
//! - undo/redo: step the history, then load its new present into the surface.
//!
//! While a load is in flight, incoming operations are queued and replayed once
//! it completes, so the steps of two operations never interleave.

use crate::config::EditorConfig;
use crate::document::DocumentEnvelope;
use crate::history::History;
use crate::selection::{self, SelectionInfo};
use crate::slides::{Blob, Slide, SlideDeck};
use crate::surface::{LoadTicket, MutationKind, Surface, SurfaceError, SurfaceEvent};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::VecDeque;
use thiserror::Error;

/// Coordinator errors. Every error leaves deck and history unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("Failed to capture surface: {0}")]
    Serialize(SurfaceError),
    #[error("Failed to load surface: {0}")]
    Deserialize(SurfaceError),
}

/// Result type for coordinator operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// What happened to a requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation ran.
    Applied,
    /// A load is in flight; the operation will run once it completes.
    Queued,
    /// Nothing to do (invalid index, empty history, same slide...).
    NoOp,
}

/// Operations waiting for an in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    SelectSlide(usize),
    AddSlide,
    DeleteSlide(usize),
    Undo,
    Redo,
    RecordEdit,
}

/// Which operation issued a load, so a failed completion can be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOrigin {
    /// Showing a slide after open, switch, delete or document load.
    Show,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    ticket: LoadTicket,
    origin: LoadOrigin,
}

/// Owns the surface for as long as a document is open and keeps it, the
/// slide deck and the undo history consistent.
pub struct Coordinator<S: Surface> {
    surface: S,
    deck: SlideDeck,
    history: History,
    config: EditorConfig,
    /// Slide the surface currently represents.
    tracked: usize,
    /// Incremented for every load issued.
    generation: u64,
    in_flight: Option<InFlight>,
    queue: VecDeque<Pending>,
    /// A text commit was reported during the last pump.
    text_commit_pending: bool,
    selection: Option<SelectionInfo>,
}

impl<S: Surface> Coordinator<S> {
    /// Open a document: take ownership of the surface and show the active slide.
    pub fn open(surface: S, deck: SlideDeck, config: EditorConfig) -> Self {
        let history = History::with_limit(config.history_limit);
        let tracked = deck.active_index();
        let mut coordinator = Self {
            surface,
            deck,
            history,
            config,
            tracked,
            generation: 0,
            in_flight: None,
            queue: VecDeque::new(),
            text_commit_pending: false,
            selection: None,
        };
        coordinator.show_tracked_slide();
        log::info!(
            "Opened document with {} slide(s), showing slide {}",
            coordinator.deck.len(),
            tracked + 1
        );
        coordinator
    }

    /// Close the document: flush the active slide, release the surface and
    /// return the final deck.
    pub fn close(mut self) -> SlideDeck {
        if self.in_flight.is_none() {
            self.commit_pending_text();
        }
        if self.in_flight.is_none() {
            if let Err(e) = self.flush() {
                log::error!("Failed to flush slide {} on close: {}", self.tracked + 1, e);
            }
        } else {
            log::warn!("Closing while a load is in flight; slide {} not flushed", self.tracked + 1);
        }
        self.surface.dispose();
        self.deck
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for driving user edits on the surface.
    /// Edits are picked up through the surface's events on the next pump.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Index of the slide shown on the surface.
    pub fn active_index(&self) -> usize {
        self.tracked
    }

    pub fn selection(&self) -> Option<&SelectionInfo> {
        self.selection.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// True while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True when no load, queued operation or deferred text commit remains.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty() && !self.text_commit_pending
    }

    // --- Slide operations ---

    /// Append an empty slide. The active slide does not change.
    pub fn add_slide(&mut self) -> SyncResult<Outcome> {
        if self.defer(Pending::AddSlide) {
            return Ok(Outcome::Queued);
        }
        let index = self.deck.add_slide();
        self.history.clear_history();
        log::debug!("Added slide {}", index + 1);
        Ok(Outcome::Applied)
    }

    /// Delete a slide. Refused for the last remaining slide.
    ///
    /// Deleting the slide on the surface loads whichever slide becomes active.
    pub fn delete_slide(&mut self, index: usize) -> SyncResult<Outcome> {
        if self.defer(Pending::DeleteSlide(index)) {
            return Ok(Outcome::Queued);
        }
        if !self.deck.delete_slide(index) {
            return Ok(Outcome::NoOp);
        }
        self.history.clear_history();

        let was_shown = index == self.tracked;
        self.tracked = self.deck.active_index();
        if was_shown {
            self.text_commit_pending = false;
            self.surface.clear();
            self.show_tracked_slide();
        }
        log::debug!("Deleted slide {}, now showing slide {}", index + 1, self.tracked + 1);
        Ok(Outcome::Applied)
    }

    /// Switch the surface to another slide.
    ///
    /// The surface is flushed into the slide being left before it is cleared
    /// and the target is loaded. If the flush fails nothing changes.
    pub fn select_slide(&mut self, next: usize) -> SyncResult<Outcome> {
        if self.defer(Pending::SelectSlide(next)) {
            return Ok(Outcome::Queued);
        }
        if next == self.tracked || next >= self.deck.len() {
            return Ok(Outcome::NoOp);
        }

        self.commit_pending_text();
        if self.defer(Pending::SelectSlide(next)) {
            return Ok(Outcome::Queued);
        }
        if let Err(e) = self.flush() {
            log::error!("Aborting switch to slide {}: {}", next + 1, e);
            return Err(e);
        }

        self.text_commit_pending = false;
        self.surface.clear();
        self.deck.set_active(next);
        self.tracked = next;
        self.show_tracked_slide();
        log::debug!("Switched to slide {}", next + 1);
        Ok(Outcome::Applied)
    }

    /// Replace the whole document and show its first slide.
    ///
    /// Any queued operation is dropped and an in-flight load becomes stale.
    pub fn load_document(&mut self, slides: Vec<Slide>) -> Outcome {
        if !self.deck.load_document(slides) {
            log::warn!("Refusing to load a document without slides");
            return Outcome::NoOp;
        }
        self.queue.clear();
        self.in_flight = None;
        self.text_commit_pending = false;
        self.tracked = 0;
        self.surface.clear();
        self.show_tracked_slide();
        log::info!("Loaded document with {} slide(s)", self.deck.len());
        Outcome::Applied
    }

    /// Load the slides of an imported envelope.
    pub fn import(&mut self, envelope: DocumentEnvelope) -> Outcome {
        self.load_document(envelope.slides)
    }

    /// Flush the active slide and wrap every slide for export.
    pub fn export(&mut self) -> SyncResult<DocumentEnvelope> {
        if self.in_flight.is_none() {
            self.commit_pending_text();
        }
        if self.in_flight.is_none() {
            self.flush()?;
        }
        Ok(DocumentEnvelope::new(self.deck.slides().to_vec()))
    }

    /// Render the live surface as PNG at the configured export scale.
    pub fn export_png(&self) -> Result<Vec<u8>, SurfaceError> {
        self.surface.render_png(self.config.export_scale)
    }

    // --- Edits ---

    /// Capture the surface into the active slide and commit it to the history.
    pub fn record_edit(&mut self) -> SyncResult<Outcome> {
        if self.defer(Pending::RecordEdit) {
            return Ok(Outcome::Queued);
        }
        let blob = self.surface.serialize().map_err(|e| {
            log::error!("Failed to capture edit on slide {}: {}", self.tracked + 1, e);
            SyncError::Serialize(e)
        })?;
        self.deck.update_content(self.tracked, blob.clone());
        self.history.save_state(blob);
        self.refresh_thumbnail(self.tracked);
        Ok(Outcome::Applied)
    }

    /// Restore the previous state onto the surface.
    ///
    /// The slide's stored content is not touched until the next edit or switch.
    pub fn undo(&mut self) -> SyncResult<Outcome> {
        if self.defer(Pending::Undo) {
            return Ok(Outcome::Queued);
        }
        self.commit_pending_text();
        if self.defer(Pending::Undo) {
            return Ok(Outcome::Queued);
        }
        let Some(blob) = self.history.undo().cloned() else {
            return Ok(Outcome::NoOp);
        };
        if let Err(e) = self.issue_load(&blob, LoadOrigin::Undo) {
            self.history.redo();
            return Err(SyncError::Deserialize(e));
        }
        Ok(Outcome::Applied)
    }

    /// Re-apply the next undone state onto the surface.
    pub fn redo(&mut self) -> SyncResult<Outcome> {
        if self.defer(Pending::Redo) {
            return Ok(Outcome::Queued);
        }
        self.commit_pending_text();
        if self.defer(Pending::Redo) {
            return Ok(Outcome::Queued);
        }
        let Some(blob) = self.history.redo().cloned() else {
            return Ok(Outcome::NoOp);
        };
        if let Err(e) = self.issue_load(&blob, LoadOrigin::Redo) {
            self.history.undo();
            return Err(SyncError::Deserialize(e));
        }
        Ok(Outcome::Applied)
    }

    // --- Events ---

    /// Drain the surface's events and react to them.
    ///
    /// Text commits seen in one pump are recorded at the end of the next one,
    /// after the surface has materialized them. A commit is dropped if a load
    /// replaced the surface in between. Returns the number of events handled.
    pub fn pump(&mut self) -> usize {
        let settle_text = std::mem::take(&mut self.text_commit_pending);
        let generation = self.generation;

        let events = self.surface.poll_events();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }

        if settle_text {
            if self.generation == generation {
                self.commit_edit();
            } else {
                log::debug!("Dropping text commit, slide {} was reloaded", self.tracked + 1);
            }
        }
        count
    }

    /// Pump until no work remains, up to the configured limit.
    pub fn settle(&mut self) {
        for _ in 0..self.config.settle_limit {
            let handled = self.pump();
            if handled == 0 && self.is_idle() {
                return;
            }
        }
        log::warn!(
            "Surface did not settle after {} pumps (loading: {}, queued: {})",
            self.config.settle_limit,
            self.in_flight.is_some(),
            self.queue.len()
        );
    }

    /// React to a single surface event.
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::SelectionChanged(entity) => {
                self.selection = selection::project(entity.as_ref());
            }
            SurfaceEvent::MutationCommitted(kind) => self.on_mutation(kind),
            SurfaceEvent::LoadCompleted { ticket, result } => self.on_load_completed(ticket, result),
        }
    }

    fn on_mutation(&mut self, kind: MutationKind) {
        if kind.is_text() {
            self.text_commit_pending = true;
            return;
        }
        self.commit_edit();
    }

    fn commit_edit(&mut self) {
        // Failures are already logged by record_edit.
        let _ = self.record_edit();
    }

    fn on_load_completed(&mut self, ticket: LoadTicket, result: Result<(), SurfaceError>) {
        let current = match self.in_flight {
            Some(current) if current.ticket == ticket && ticket.slide == self.tracked => current,
            _ => {
                self.on_stale_load(ticket, result.is_ok());
                return;
            }
        };
        self.in_flight = None;

        match result {
            Ok(()) => self.surface.render_all(),
            Err(e) => {
                log::error!("Failed to load slide {}: {}", ticket.slide + 1, e);
                // The surface kept its previous state; step the history back to match it.
                match current.origin {
                    LoadOrigin::Show => {}
                    LoadOrigin::Undo => {
                        self.history.redo();
                    }
                    LoadOrigin::Redo => {
                        self.history.undo();
                    }
                }
            }
        }

        self.replay_queue();
    }

    /// A superseded load finished. If it landed after the newest one, the
    /// surface now holds another state, so the tracked slide is shown again
    /// from its latest history state.
    fn on_stale_load(&mut self, ticket: LoadTicket, applied: bool) {
        log::debug!(
            "Discarding stale load for slide {} (generation {}, current {})",
            ticket.slide + 1,
            ticket.generation,
            self.generation
        );
        if !applied || self.in_flight.is_some() {
            return;
        }
        let present = self.history.present().clone();
        self.text_commit_pending = false;
        self.surface.clear();
        if let Err(e) = self.issue_load(&present, LoadOrigin::Show) {
            log::error!("Failed to restore slide {}: {}", self.tracked + 1, e);
        }
    }

    fn replay_queue(&mut self) {
        while self.in_flight.is_none() {
            let Some(pending) = self.queue.pop_front() else {
                break;
            };
            let result = match pending {
                Pending::SelectSlide(index) => self.select_slide(index),
                Pending::AddSlide => self.add_slide(),
                Pending::DeleteSlide(index) => self.delete_slide(index),
                Pending::Undo => self.undo(),
                Pending::Redo => self.redo(),
                Pending::RecordEdit => self.record_edit(),
            };
            if let Err(e) = result {
                log::warn!("Queued {:?} failed: {}", pending, e);
            }
        }
    }

    // --- Internals ---

    /// Queue the operation if a load is in flight. Returns true when queued.
    fn defer(&mut self, pending: Pending) -> bool {
        if self.in_flight.is_none() {
            return false;
        }
        if pending == Pending::RecordEdit && self.queue.back() == Some(&Pending::RecordEdit) {
            return true;
        }
        self.queue.push_back(pending);
        true
    }

    /// Record a deferred text commit now, pumping until the surface has
    /// materialized the text.
    fn commit_pending_text(&mut self) {
        let mut pumps = 0;
        while self.text_commit_pending && pumps < self.config.settle_limit {
            self.pump();
            pumps += 1;
        }
    }

    /// Write the surface into the tracked slide without touching the history.
    fn flush(&mut self) -> SyncResult<()> {
        let blob = self.surface.serialize().map_err(SyncError::Serialize)?;
        self.deck.update_content(self.tracked, blob);
        self.refresh_thumbnail(self.tracked);
        Ok(())
    }

    /// Load the tracked slide onto a cleared surface and restart the history
    /// from its content.
    ///
    /// Blank content is loaded as an empty scene so that this request is
    /// always the newest one the surface sees.
    fn show_tracked_slide(&mut self) {
        let content = self
            .deck
            .get(self.tracked)
            .map(|slide| slide.content.clone())
            .filter(|content| !content.is_empty())
            .unwrap_or_else(Blob::empty_scene);

        if let Err(e) = self.issue_load(&content, LoadOrigin::Show) {
            log::error!("Failed to load slide {}: {}", self.tracked + 1, e);
        }

        self.history.save_state(content);
        self.history.clear_history();
    }

    fn issue_load(&mut self, blob: &Blob, origin: LoadOrigin) -> Result<(), SurfaceError> {
        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            slide: self.tracked,
        };
        self.surface.deserialize(blob, ticket)?;
        self.in_flight = Some(InFlight { ticket, origin });
        Ok(())
    }

    fn refresh_thumbnail(&mut self, index: usize) {
        match self.surface.render_png(self.config.thumbnail_scale) {
            Ok(png_data) => {
                let thumbnail = format!("data:image/png;base64,{}", STANDARD.encode(png_data));
                self.deck.update_thumbnail(index, thumbnail);
            }
            Err(e) => log::warn!("Failed to render preview for slide {}: {}", index + 1, e),
        }
    }
}
