use crate::draw::composite::RgbaBuffer;
use crate::draw::compositor::{DrawingSession, StrokeCompositor};
use crate::draw::history::DrawHistory;
use crate::draw::input::{command_for_key, InputCommand, KeyEvent};
use crate::draw::layers::{BackgroundPlacement, LayerStore};
use crate::draw::model::{Color, Stroke};
use crate::draw::render::{compose_frame, DirtyRect, FrameLayers, PaintTarget};
use crate::draw::save::{
    decode_png, dispatch_export_choice, encode_png, ensure_output_folder, save_png,
    AutoSaveStore, ExportChoice, ExportDispatchOutcome,
};
use crate::draw::settings::DrawSettings;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;

pub const DEFAULT_CANVAS_FILL: Color = Color::rgba(245, 245, 245, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PanState {
    armed: bool,
    last: Option<(i32, i32)>,
}

/// One annotation window: layers, the live stroke, and undo history.
///
/// All mutation goes through `&mut self`, so the overlay has exactly one
/// writer at a time.
#[derive(Debug, Clone)]
pub struct AnnotationCanvas {
    layers: LayerStore,
    session: DrawingSession,
    compositor: StrokeCompositor,
    history: DrawHistory,
    whiteboard: bool,
    canvas_fill: Color,
    autosave: Option<AutoSaveStore>,
    pan: PanState,
}

impl AnnotationCanvas {
    pub fn new(window_size: (u32, u32)) -> Self {
        Self::with_session(window_size, DrawingSession::default())
    }

    pub fn with_session(window_size: (u32, u32), session: DrawingSession) -> Self {
        let layers = LayerStore::new(window_size);
        let history = DrawHistory::new(layers.overlay());
        Self {
            layers,
            session,
            compositor: StrokeCompositor::default(),
            history,
            whiteboard: false,
            canvas_fill: DEFAULT_CANVAS_FILL,
            autosave: None,
            pan: PanState::default(),
        }
    }

    /// Builds a canvas from stored settings. With `autosave_enabled` the
    /// drawing is auto-saved next to the executable.
    pub fn from_settings(window_size: (u32, u32), settings: &DrawSettings) -> Self {
        let autosave = if settings.autosave_enabled {
            match AutoSaveStore::next_to_executable() {
                Ok(store) => Some(store),
                Err(err) => {
                    tracing::warn!(?err, "auto-save location unavailable, auto-save disabled");
                    None
                }
            }
        } else {
            None
        };
        Self::from_settings_with_autosave(window_size, settings, autosave)
    }

    /// Like `from_settings`, with the auto-save location chosen by the caller.
    /// The store is only installed when `autosave_enabled` is set.
    pub fn from_settings_with_autosave(
        window_size: (u32, u32),
        settings: &DrawSettings,
        store: Option<AutoSaveStore>,
    ) -> Self {
        let mut canvas = Self::with_session(window_size, settings.to_session());
        canvas.canvas_fill = settings.canvas_background_color;
        canvas.autosave = store.filter(|_| settings.autosave_enabled);
        canvas
    }

    pub fn autosave_store(&self) -> Option<&AutoSaveStore> {
        self.autosave.as_ref()
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DrawingSession {
        &mut self.session
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    pub fn overlay(&self) -> &RgbaBuffer {
        self.layers.overlay()
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn is_drawing(&self) -> bool {
        self.compositor.is_drawing()
    }

    pub fn is_whiteboard(&self) -> bool {
        self.whiteboard
    }

    pub fn set_canvas_fill(&mut self, color: Color) {
        self.canvas_fill = color;
    }

    pub fn set_autosave(&mut self, store: Option<AutoSaveStore>) {
        self.autosave = store;
    }

    pub fn pointer_down(&mut self, point: (i32, i32)) {
        if self.pan.armed {
            self.pan.last = Some(point);
            return;
        }
        let unfinished =
            self.compositor
                .pointer_down(&self.session, self.layers.overlay_mut(), point);
        if unfinished.is_some() {
            tracing::debug!("previous stroke finalized by new press");
            self.commit();
        }
    }

    pub fn pointer_move(&mut self, point: (i32, i32)) -> Option<DirtyRect> {
        if let Some(last) = self.pan.last {
            self.layers
                .move_background((point.0 - last.0, point.1 - last.1));
            self.pan.last = Some(point);
            return None;
        }
        self.compositor
            .pointer_move(&self.session, self.layers.overlay_mut(), point)
    }

    /// Finalizes the stroke and records it in history, zero-length or not.
    pub fn pointer_up(&mut self, point: (i32, i32)) -> Option<Stroke> {
        if self.pan.last.is_some() {
            let _ = self.pointer_move(point);
            self.pan.last = None;
            return None;
        }
        let stroke = self
            .compositor
            .pointer_up(&self.session, self.layers.overlay_mut(), point)?;
        self.commit();
        Some(stroke)
    }

    /// Focus loss or a release outside the window counts as pointer-up at the
    /// last known position.
    pub fn focus_lost(&mut self) -> Option<Stroke> {
        self.pan = PanState::default();
        self.finish_active_stroke()
    }

    fn finish_active_stroke(&mut self) -> Option<Stroke> {
        let stroke = self
            .compositor
            .finish(&self.session, self.layers.overlay_mut())?;
        self.commit();
        Some(stroke)
    }

    fn commit(&mut self) {
        self.history.commit(self.layers.overlay());
    }

    pub fn resize(&mut self, window_size: (u32, u32)) {
        if self.finish_active_stroke().is_some() {
            tracing::debug!("stroke finalized by resize");
        }
        self.layers.resize_overlay(window_size);
        self.history.replace_current(self.layers.overlay());
    }

    pub fn load_background(&mut self, image: Option<&RgbaBuffer>, placement: BackgroundPlacement) {
        self.layers.load_background(image, placement);
    }

    pub fn load_background_bytes(&mut self, bytes: &[u8], placement: BackgroundPlacement) {
        self.layers.load_background_bytes(bytes, placement);
    }

    pub fn move_background(&mut self, delta: (i32, i32)) {
        self.layers.move_background(delta);
    }

    pub fn resize_background(&mut self, size: (u32, u32), preserve_aspect_ratio: bool) {
        self.layers.resize_background(size, preserve_aspect_ratio);
    }

    pub fn undo(&mut self) -> bool {
        let _ = self.finish_active_stroke();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore_snapshot(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let _ = self.finish_active_stroke();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore_snapshot(snapshot);
        true
    }

    /// Snapshots taken before a resize are refit to the window, and the
    /// refit copy becomes the entry so history matches the live overlay.
    fn restore_snapshot(&mut self, snapshot: RgbaBuffer) {
        let refit = snapshot.size() != self.layers.window_size();
        self.layers.replace_overlay(snapshot);
        if refit {
            self.history.replace_current(self.layers.overlay());
        }
    }

    pub fn clear_all(&mut self) {
        let _ = self.finish_active_stroke();
        self.layers.clear_overlay();
        self.commit();
        tracing::info!("drawing cleared");
        self.autosave();
    }

    /// Whiteboard mode hides the background behind a white fill. Either
    /// direction starts from an empty overlay.
    pub fn toggle_whiteboard(&mut self) {
        let _ = self.finish_active_stroke();
        self.whiteboard = !self.whiteboard;
        self.layers.clear_overlay();
        self.commit();
        tracing::info!(whiteboard = self.whiteboard, "whiteboard mode toggled");
        self.autosave();
    }

    /// Installs an externally supplied drawing, rescaled to the window.
    pub fn load_overlay(&mut self, overlay: RgbaBuffer) {
        let _ = self.finish_active_stroke();
        let window_size = self.layers.window_size();
        let overlay = if overlay.size() == window_size {
            overlay
        } else {
            tracing::debug!(from = ?overlay.size(), to = ?window_size, "rescaling loaded drawing");
            overlay.scaled(window_size)
        };
        tracing::info!(
            visible = overlay.has_visible_content(),
            "drawing loaded"
        );
        self.layers.replace_overlay(overlay);
        self.commit();
    }

    /// Decoding happens before anything is replaced, so a bad file leaves
    /// the overlay and history untouched.
    pub fn load_overlay_png(&mut self, bytes: &[u8]) -> Result<()> {
        let overlay = decode_png(bytes)?;
        self.load_overlay(overlay);
        Ok(())
    }

    pub fn overlay_png(&self) -> Result<Vec<u8>> {
        encode_png(self.layers.overlay())
    }

    /// Loads the auto-saved drawing if there is one. Returns whether anything
    /// was restored.
    pub fn restore_autosave(&mut self) -> Result<bool> {
        let Some(store) = self.autosave.as_ref() else {
            return Ok(false);
        };
        match store.load()? {
            Some(overlay) => {
                self.load_overlay(overlay);
                Ok(true)
            }
            None => {
                tracing::info!(path = %store.path().display(), "no auto-saved drawing to load");
                Ok(false)
            }
        }
    }

    fn autosave(&self) {
        if let Some(store) = &self.autosave {
            if let Err(err) = store.save(self.layers.overlay()) {
                tracing::warn!(?err, "auto-save failed");
            }
        }
    }

    /// Finalizes any stroke and writes the auto-save.
    pub fn close(&mut self) {
        let _ = self.focus_lost();
        self.autosave();
    }

    /// Applies a keyboard shortcut and returns the command it mapped to.
    /// `RequestExit` also runs `close`; tearing down the window is up to the
    /// caller.
    pub fn handle_key_event(&mut self, event: KeyEvent) -> Option<InputCommand> {
        let command = command_for_key(event)?;
        match command {
            InputCommand::Undo => {
                let _ = self.undo();
            }
            InputCommand::Redo => {
                let _ = self.redo();
            }
            InputCommand::RequestExit => self.close(),
            InputCommand::BeginPan => {
                if !self.pan.armed {
                    let _ = self.finish_active_stroke();
                }
                self.pan.armed = true;
            }
            InputCommand::EndPan => self.pan = PanState::default(),
        }
        Some(command)
    }

    fn frame(&self, with_preview: bool) -> RgbaBuffer {
        let preview = if with_preview {
            self.compositor.preview(&self.session)
        } else {
            None
        };
        let (fill, background) = if self.whiteboard {
            (Color::WHITE, None)
        } else {
            (
                self.canvas_fill,
                Some((self.layers.background(), self.layers.background_offset())),
            )
        };
        compose_frame(&FrameLayers {
            fill,
            background,
            overlay: self.layers.overlay(),
            preview: preview.as_ref(),
        })
    }

    /// Fill, background at its offset, overlay at the origin, then the live
    /// shape preview.
    pub fn render<T: PaintTarget>(&self, target: &mut T) {
        target.present(&self.frame(true));
    }

    /// Writes the PNG files for `choice` into `output_dir`. The annotated
    /// image is the rendered frame without any live preview.
    pub fn export(
        &self,
        choice: ExportChoice,
        output_dir: &Path,
        now: chrono::DateTime<Local>,
    ) -> Result<ExportDispatchOutcome> {
        let outcome = dispatch_export_choice(choice, output_dir, now);
        if let ExportDispatchOutcome::Save(targets) = &outcome {
            if let Some(path) = &targets.annotated {
                save_png(path, &self.frame(false))
                    .with_context(|| format!("export annotated image {}", path.display()))?;
                tracing::info!(path = %path.display(), "annotated image exported");
            }
            if let Some(path) = &targets.overlay {
                save_png(path, self.layers.overlay())
                    .with_context(|| format!("export overlay {}", path.display()))?;
                tracing::info!(path = %path.display(), "overlay exported");
            }
        }
        Ok(outcome)
    }

    /// Exports into the folder next to the executable, stamped with the
    /// current local time.
    pub fn export_now(&self, choice: ExportChoice) -> Result<ExportDispatchOutcome> {
        let output_dir = ensure_output_folder()?;
        self.export(choice, &output_dir, Local::now())
    }
}
