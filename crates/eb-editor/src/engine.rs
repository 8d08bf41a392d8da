//! The interaction engine.
//!
//! Consumes normalized input events and menu actions, arbitrates between
//! selection, inline label editing, connection drafting, panning, and
//! context menus, and drives the stores and the `Scene`.
//!
//! ## Mode transitions
//!
//! ```text
//! Idle -> ShapeSelected         (click on shape, after the debounce window)
//! ShapeSelected -> Idle         (click on the same shape, background, Escape)
//! * -> Editing                  (double-click, "edit" action, palette drop)
//! Editing -> ShapeSelected      (Enter, Escape, blur, click elsewhere, drag)
//! ShapeSelected -> Connecting   ("connect" action)
//! Connecting -> previous        (click on a shape or background, Escape)
//! Idle -> Panning               (background pointer-down with Space or middle button)
//! ```
//!
//! Every entry point runs to completion. The only deferred work is the
//! focus of a freshly opened edit surface and the blur decision, both run
//! by the host via [`InteractionEngine::run_deferred`] on the next turn,
//! plus the single-click timer fired by [`InteractionEngine::tick`].

use crate::blur::{BlurOutcome, resolve_blur};
use crate::input::{ElementRef, InputEvent, MenuAction, Modifiers, PointerButton};
use crate::scene::{Cursor, ElementRole, Scene, Viewport};
use crate::schedule::{Deferred, DeferredQueue, PendingClick};
use crate::shortcuts::{KeyAction, KeyMap};
use crate::state::{ConnectionDraft, EditSession, InteractionState, Mode, PanState, Selection};
use eb_core::geometry::{ConnectionPath, nearest_side};
use eb_core::id::{ConnectionId, IdGenerator, SequentialIds, ShapeId};
use eb_core::{
    Connection, ConnectionStore, EditorConfig, Point, ShapeKind, ShapeStore, Side, label_or_default,
};

pub struct InteractionEngine<S: Scene> {
    shapes: ShapeStore,
    connections: ConnectionStore,
    scene: S,
    config: EditorConfig,
    state: InteractionState,
    deferred: DeferredQueue,
}

impl<S: Scene> InteractionEngine<S> {
    pub fn new(scene: S, config: EditorConfig) -> Self {
        Self::with_id_generators(
            scene,
            config,
            Box::new(SequentialIds::new()),
            Box::new(SequentialIds::new()),
        )
    }

    pub fn with_id_generators(
        scene: S,
        config: EditorConfig,
        shape_ids: Box<dyn IdGenerator>,
        connection_ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            shapes: ShapeStore::new(shape_ids, &config),
            connections: ConnectionStore::new(connection_ids),
            scene,
            config,
            state: InteractionState::default(),
            deferred: DeferredQueue::default(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn shapes(&self) -> &ShapeStore {
        &self.shapes
    }

    pub fn connections(&self) -> &ConnectionStore {
        &self.connections
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access for host plumbing (focus changes, text input).
    /// Do not use it to create or remove visuals behind the engine's back.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn selected_shape(&self) -> Option<ShapeId> {
        self.state.selection.selected()
    }

    pub fn editing_shape(&self) -> Option<ShapeId> {
        self.state.selection.editing_shape()
    }

    pub fn connection_draft_source(&self) -> Option<ShapeId> {
        self.state.draft.map(|d| d.source)
    }

    pub fn dragging_shape(&self) -> Option<ShapeId> {
        self.state.dragging
    }

    pub fn menu_connection(&self) -> Option<ConnectionId> {
        self.state.menu_connection
    }

    pub fn is_pan_armed(&self) -> bool {
        self.state.pan_key_held()
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// When the host should next call [`InteractionEngine::tick`].
    pub fn next_timer_deadline(&self) -> Option<f64> {
        self.state.clicks.next_deadline()
    }

    // ─── Entry points ────────────────────────────────────────────────────

    /// Handle one input event. Returns `false` when the event was not
    /// consumed and should keep its default browser behavior (e.g. typing
    /// into the live edit surface).
    pub fn handle(&mut self, event: InputEvent) -> bool {
        let handled = match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                target,
            } => self.on_pointer_down(Point::new(x, y), button, target),
            InputEvent::PointerMove { x, y } => self.on_pointer_move(Point::new(x, y)),
            InputEvent::PointerUp { .. } => self.on_pointer_up(),
            InputEvent::Click {
                x,
                y,
                target,
                time_ms,
            } => self.on_click(Point::new(x, y), target, time_ms),
            InputEvent::DoubleClick { target } => self.on_double_click(target),
            InputEvent::KeyDown { key, modifiers } => self.on_key_down(&key, modifiers),
            InputEvent::KeyUp { key } => self.on_key_up(&key),
            InputEvent::DragStart { shape } => self.on_drag_start(shape),
            InputEvent::DragMove { shape, x, y } => self.on_drag_move(shape, Point::new(x, y)),
            InputEvent::DragEnd { shape } => self.on_drag_end(shape),
            InputEvent::Blur { shape } => {
                self.deferred.push(Deferred::ResolveBlur { shape });
                true
            }
            InputEvent::Drop { kind, x, y } => self.on_drop(&kind, Point::new(x, y)),
        };
        self.repair_dangling_state();
        handled
    }

    /// Handle a menu or toolbar action.
    pub fn menu_action(&mut self, action: MenuAction) {
        log::debug!("menu action {action:?}");
        match action {
            MenuAction::Edit => match self.selected_shape() {
                Some(id) => self.begin_edit(id),
                None => log::warn!("edit: nothing selected"),
            },
            MenuAction::Connect => self.start_connection(),
            MenuAction::Delete => {
                if self.state.selection.editing().is_some() {
                    self.cancel_edit(false);
                }
                match self.selected_shape() {
                    Some(id) => {
                        self.delete_shape(id);
                    }
                    None => log::warn!("delete: nothing selected"),
                }
            }
            MenuAction::DeleteConnection => match self.state.menu_connection.take() {
                Some(id) => {
                    self.delete_connection(id);
                    self.scene.hide_menus();
                }
                None => log::warn!("delete-connection: no connection menu open"),
            },
            MenuAction::ZoomIn => self.zoom_by(self.config.zoom_step),
            MenuAction::ZoomOut => self.zoom_by(1.0 / self.config.zoom_step),
            MenuAction::ResetView => self.reset_view(),
        }
        self.repair_dangling_state();
    }

    /// Fire the single-click timer if its debounce window has elapsed.
    pub fn tick(&mut self, now_ms: f64) {
        if let Some(click) = self.state.clicks.take_due(now_ms) {
            self.fire_click(click);
            self.repair_dangling_state();
        }
    }

    /// Run tasks deferred to the next event-loop turn.
    pub fn run_deferred(&mut self) {
        for task in self.deferred.take_all() {
            match task {
                Deferred::FocusEdit { shape, surface } => {
                    let still_live = self
                        .state
                        .selection
                        .editing()
                        .is_some_and(|s| s.shape == shape && s.surface == surface);
                    if still_live {
                        self.scene.focus_live_edit(surface);
                    } else {
                        log::trace!("skip focus of {shape}: edit already ended");
                    }
                }
                Deferred::ResolveBlur { shape } => {
                    let focus = self
                        .scene
                        .focused_element()
                        .map_or(ElementRole::Unknown, |el| self.scene.element_role(el));
                    let outcome = resolve_blur(self.editing_shape(), shape, focus);
                    log::debug!("blur of {shape} towards {focus:?}: {outcome:?}");
                    if let BlurOutcome::Commit { reopen_menu } = outcome {
                        self.commit_edit(reopen_menu);
                    }
                }
            }
        }
        self.repair_dangling_state();
    }

    /// Programmatically add a shape without entering edit mode.
    pub fn add_shape(&mut self, kind: ShapeKind, x: f32, y: f32, label: Option<&str>) -> ShapeId {
        self.create_shape(kind, Point::new(x, y), label)
    }

    /// Programmatically connect two shapes.
    pub fn connect(&mut self, source: ShapeId, target: ShapeId) -> Option<ConnectionId> {
        match self.connections.create(&self.shapes, source, target) {
            Ok(connection) => {
                self.show_connection(&connection);
                Some(connection.id)
            }
            Err(e) => {
                log::warn!("connect {source} -> {target}: {e}");
                None
            }
        }
    }

    /// Delete a shape, cascading its connections first and clearing any
    /// selection, edit, draft, or pending click that refers to it.
    pub fn delete_shape(&mut self, id: ShapeId) -> bool {
        if !self.shapes.contains(id) {
            log::warn!("delete: {id} not found");
            return false;
        }

        for cid in self.connections.touching_ids(id) {
            self.delete_connection(cid);
        }

        if self.editing_shape() == Some(id) {
            self.scene.end_live_edit(id);
        }
        if self.selected_shape() == Some(id) {
            self.state.selection = Selection::None;
        }
        if self.state.draft.is_some_and(|d| d.source == id) {
            self.cancel_draft();
        }
        self.state.clicks.cancel(id);
        if self.state.dragging == Some(id) {
            self.state.dragging = None;
        }

        self.scene.hide_menus();
        self.state.menu_connection = None;
        if self.shapes.remove(id).is_ok() {
            self.scene.remove_shape_visual(id);
        }
        log::debug!("deleted {id}");
        true
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    fn on_pointer_down(&mut self, at: Point, button: PointerButton, target: ElementRef) -> bool {
        if self.scene.element_role(target) != ElementRole::Canvas {
            return false;
        }
        let armed = matches!(self.state.pan, PanState::Armed);
        if !armed && button != PointerButton::Middle {
            return false;
        }
        self.state.pan = PanState::Active {
            last: at,
            key_held: armed,
        };
        self.scene.set_cursor(Cursor::Grabbing);
        log::debug!("pan start at ({}, {})", at.x, at.y);
        true
    }

    fn on_pointer_move(&mut self, at: Point) -> bool {
        if let PanState::Active { last, key_held } = self.state.pan {
            let zoom = self.scene.zoom_factor();
            if zoom <= 0.0 {
                log::warn!("pan: invalid zoom factor {zoom}");
                return false;
            }
            let mut viewport = self.scene.viewport();
            viewport.x -= (at.x - last.x) / zoom;
            viewport.y -= (at.y - last.y) / zoom;
            self.scene.set_viewport(viewport);
            self.state.pan = PanState::Active { last: at, key_held };
            log::trace!("pan to ({}, {})", viewport.x, viewport.y);
            return true;
        }

        if let Some(draft) = self.state.draft {
            let Some(source) = self.shapes.get(draft.source) else {
                return false;
            };
            let to = match self.scene.screen_to_canvas(at) {
                Ok(p) => p,
                Err(e) => {
                    log::trace!("draft: {e}");
                    return false;
                }
            };
            let bounds = source.bounds();
            let from = bounds.anchor(nearest_side(&bounds, to));
            self.scene.show_draft(from, to);
            return true;
        }
        false
    }

    fn on_pointer_up(&mut self) -> bool {
        let PanState::Active { key_held, .. } = self.state.pan else {
            return false;
        };
        if key_held {
            self.state.pan = PanState::Armed;
            self.scene.set_cursor(Cursor::Grab);
        } else {
            self.state.pan = PanState::Disarmed;
            self.scene.set_cursor(Cursor::Default);
        }
        log::debug!("pan end");
        true
    }

    // ─── Clicks ──────────────────────────────────────────────────────────

    fn on_click(&mut self, at: Point, target: ElementRef, time_ms: f64) -> bool {
        let role = self.scene.element_role(target);

        if self.state.draft.is_some() {
            match role {
                ElementRole::Shape(id) | ElementRole::EditSurface(id) => {
                    self.complete_connection(id);
                    return true;
                }
                ElementRole::Canvas | ElementRole::Connection(_) => self.cancel_draft(),
                _ => {}
            }
        }

        match role {
            ElementRole::EditSurface(id) if self.editing_shape() == Some(id) => {
                // Caret placement inside the live surface.
                false
            }
            ElementRole::Shape(id) | ElementRole::EditSurface(id) => {
                let click = PendingClick {
                    shape: id,
                    due_ms: time_ms + self.config.click_debounce_ms,
                    was_editing: self.editing_shape() == Some(id),
                };
                if let Some(earlier) = self.state.clicks.schedule(click) {
                    self.fire_click(earlier);
                }
                true
            }
            ElementRole::Connection(id) => {
                self.flush_pending_click();
                self.commit_edit(false);
                self.deselect();
                self.state.menu_connection = Some(id);
                self.scene.show_connection_menu(id, at);
                log::debug!("connection menu for {id}");
                true
            }
            ElementRole::Canvas => {
                self.flush_pending_click();
                self.clear_for_background();
                true
            }
            ElementRole::Menu | ElementRole::Toolbar | ElementRole::Palette | ElementRole::Unknown => {
                false
            }
        }
    }

    /// Apply a debounced single click.
    fn fire_click(&mut self, click: PendingClick) {
        let id = click.shape;
        if !self.shapes.contains(id) {
            log::warn!("click: {id} no longer exists");
            return;
        }

        if let Some(editing) = self.editing_shape()
            && editing != id
        {
            self.commit_edit(false);
        }

        if click.was_editing {
            // Click on the edited shape's own border: confirm the edit.
            if self.editing_shape() == Some(id) {
                self.commit_edit(true);
            }
            return;
        }

        if self.selected_shape() == Some(id) {
            log::debug!("toggle off {id}");
            self.deselect();
            return;
        }

        self.select(id);
        self.show_shape_menu(id);
        log::debug!("selected {id}");
    }

    fn flush_pending_click(&mut self) {
        if let Some(click) = self.state.clicks.flush() {
            self.fire_click(click);
        }
    }

    fn on_double_click(&mut self, target: ElementRef) -> bool {
        match self.scene.element_role(target) {
            ElementRole::EditSurface(id) if self.editing_shape() == Some(id) => false,
            ElementRole::Shape(id) | ElementRole::EditSurface(id) => {
                self.state.clicks.cancel(id);
                self.begin_edit(id);
                true
            }
            _ => false,
        }
    }

    /// What a background click does: save any edit, drop selection and
    /// menus, abandon a connection draft.
    fn clear_for_background(&mut self) {
        self.commit_edit(false);
        self.deselect();
        self.cancel_draft();
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    fn on_key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let editing = self.state.selection.editing().is_some();
        let Some(action) = KeyMap::resolve(key, modifiers, editing) else {
            return false;
        };
        match action {
            KeyAction::CommitEdit => {
                self.commit_edit(true);
            }
            KeyAction::CancelEdit => {
                if self.state.draft.is_some() {
                    self.cancel_draft();
                } else {
                    self.cancel_edit(true);
                }
            }
            KeyAction::DeleteSelected => match self.selected_shape() {
                Some(id) => {
                    self.delete_shape(id);
                }
                None => return false,
            },
            KeyAction::Escape => {
                if self.state.draft.is_some() {
                    self.cancel_draft();
                } else {
                    self.deselect();
                }
            }
            KeyAction::ArmPan => {
                if self.state.pan == PanState::Disarmed {
                    self.state.pan = PanState::Armed;
                    self.scene.set_cursor(Cursor::Grab);
                }
            }
            KeyAction::ZoomIn => self.zoom_by(self.config.zoom_step),
            KeyAction::ZoomOut => self.zoom_by(1.0 / self.config.zoom_step),
            KeyAction::ResetView => self.reset_view(),
        }
        true
    }

    fn on_key_up(&mut self, key: &str) -> bool {
        if !KeyMap::is_pan_key(key) {
            return false;
        }
        match self.state.pan {
            PanState::Armed => {
                self.state.pan = PanState::Disarmed;
                self.scene.set_cursor(Cursor::Default);
                true
            }
            PanState::Active { last, .. } => {
                self.state.pan = PanState::Active {
                    last,
                    key_held: false,
                };
                true
            }
            PanState::Disarmed => false,
        }
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    fn on_drag_start(&mut self, id: ShapeId) -> bool {
        if !self.shapes.contains(id) {
            log::warn!("drag start: {id} not found");
            return false;
        }
        // Whichever shape is being edited, dragging wins.
        self.commit_edit(false);
        self.scene.hide_menus();
        self.state.menu_connection = None;
        self.state.dragging = Some(id);
        true
    }

    fn on_drag_move(&mut self, id: ShapeId, origin: Point) -> bool {
        if self.state.dragging != Some(id) {
            log::warn!("drag move: {id} is not being dragged");
            return false;
        }
        if let Err(e) = self.shapes.move_to(id, origin.x, origin.y) {
            log::warn!("drag move: {e}");
            return false;
        }
        self.scene.move_shape_visual(id, origin);
        for (cid, path) in self.connections.recompute_for_shape(&self.shapes, id) {
            self.scene.replot_connection_visual(cid, &path);
        }
        true
    }

    fn on_drag_end(&mut self, id: ShapeId) -> bool {
        if self.state.dragging == Some(id) {
            self.state.dragging = None;
            true
        } else {
            false
        }
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    fn on_drop(&mut self, payload: &str, client: Point) -> bool {
        if self.state.selection.editing().is_some() {
            self.cancel_edit(false);
        }
        let kind: ShapeKind = match payload.parse() {
            Ok(kind) => kind,
            Err(e) => {
                log::warn!("rejecting drop: {e}");
                return false;
            }
        };
        let at = self.client_to_canvas(client);
        let id = self.create_shape(kind, at, None);
        self.select(id);
        self.begin_edit(id);
        true
    }

    fn client_to_canvas(&self, client: Point) -> Point {
        match self.scene.screen_to_canvas(client) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("screen_to_canvas failed ({e}), approximating from viewport");
                let viewport = self.scene.viewport();
                let zoom = self.scene.zoom_factor().max(f32::EPSILON);
                Point::new(viewport.x + client.x / zoom, viewport.y + client.y / zoom)
            }
        }
    }

    fn create_shape(&mut self, kind: ShapeKind, at: Point, label: Option<&str>) -> ShapeId {
        let placement = self.shapes.create(kind, at.x, at.y, label);
        if !placement.placed_without_overlap {
            log::info!("{} overlaps an existing shape", placement.shape.id);
        }
        self.scene.create_shape_visual(&placement.shape);
        log::debug!("created {} ({kind})", placement.shape.id);
        placement.shape.id
    }

    // ─── Selection & menus ───────────────────────────────────────────────

    fn select(&mut self, id: ShapeId) {
        match self.selected_shape() {
            Some(current) if current == id => return,
            Some(current) => {
                self.commit_edit(false);
                self.scene.set_shape_selected_visual(current, false);
            }
            None => {}
        }
        self.scene.set_shape_selected_visual(id, true);
        self.state.selection = Selection::Shape(id);
        self.state.menu_connection = None;
    }

    fn deselect(&mut self) {
        self.commit_edit(false);
        if let Some(current) = self.selected_shape() {
            self.scene.set_shape_selected_visual(current, false);
        }
        self.state.selection = Selection::None;
        self.state.menu_connection = None;
        self.scene.hide_menus();
    }

    /// Show a shape's menu at its top-right corner, falling back to the
    /// stored coordinates when the screen transform is unavailable.
    fn show_shape_menu(&mut self, id: ShapeId) {
        let at = match self.scene.shape_screen_bounds(id) {
            Ok(bounds) => bounds.top_right(),
            Err(e) => {
                log::warn!("menu placement for {id}: {e}");
                match self.shapes.get(id) {
                    Some(shape) => shape.bounds().top_right(),
                    None => return,
                }
            }
        };
        self.state.menu_connection = None;
        self.scene.show_shape_menu(id, at);
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    fn begin_edit(&mut self, id: ShapeId) {
        if self.editing_shape() == Some(id) {
            return;
        }
        let Some(saved_label) = self.shapes.get(id).map(|s| s.label.clone()) else {
            log::warn!("edit: {id} not found");
            return;
        };
        self.scene.hide_menus();
        self.state.menu_connection = None;
        self.commit_edit(false);
        self.select(id);

        match self.scene.begin_live_edit(id) {
            Ok(surface) => {
                self.state.selection = Selection::Editing(EditSession {
                    shape: id,
                    surface,
                    saved_label,
                });
                self.deferred.push(Deferred::FocusEdit { shape: id, surface });
                log::debug!("editing {id}");
            }
            Err(e) => log::warn!("edit {id}: {e}"),
        }
    }

    /// Save the live text as the label. Returns `false` if nothing was
    /// being edited, which makes repeated commits no-ops.
    fn commit_edit(&mut self, reopen_menu: bool) -> bool {
        let Some(session) = self.take_edit_session() else {
            return false;
        };
        let id = session.shape;
        let Some(kind) = self.shapes.get(id).map(|s| s.kind) else {
            log::warn!("commit: {id} vanished while editing");
            self.scene.end_live_edit(id);
            self.state.selection = Selection::None;
            self.scene.hide_menus();
            return false;
        };

        let text = self
            .scene
            .read_live_edit_text(session.surface)
            .unwrap_or_else(|| {
                log::warn!("commit: live surface of {id} unreadable, keeping label");
                session.saved_label.clone()
            });
        let label = label_or_default(kind, &text);
        if let Err(e) = self.shapes.set_label(id, &label) {
            log::warn!("commit: {e}");
        }
        self.scene.update_shape_label_visual(id, &label);
        self.scene.end_live_edit(id);
        self.state.selection = Selection::Shape(id);
        log::debug!("committed {id} as {label:?}");

        if reopen_menu {
            self.show_shape_menu(id);
        } else {
            self.scene.hide_menus();
        }
        true
    }

    /// Discard the live text and restore the last saved label.
    fn cancel_edit(&mut self, reopen_menu: bool) -> bool {
        let Some(session) = self.take_edit_session() else {
            return false;
        };
        let id = session.shape;
        self.scene
            .set_live_edit_text(session.surface, &session.saved_label);
        self.scene.end_live_edit(id);
        self.state.selection = Selection::Shape(id);
        log::debug!("cancelled edit of {id}");

        if reopen_menu {
            self.show_shape_menu(id);
        } else {
            self.scene.hide_menus();
        }
        true
    }

    fn take_edit_session(&mut self) -> Option<EditSession> {
        match std::mem::take(&mut self.state.selection) {
            Selection::Editing(session) => Some(session),
            other => {
                self.state.selection = other;
                None
            }
        }
    }

    // ─── Connections ─────────────────────────────────────────────────────

    fn start_connection(&mut self) {
        let Some(source) = self.selected_shape() else {
            log::warn!("connect: nothing selected");
            return;
        };
        if self.editing_shape() == Some(source) {
            self.commit_edit(false);
        }
        self.state.draft = Some(ConnectionDraft { source });
        self.state.menu_connection = None;
        self.scene.hide_menus();
        if let Some(shape) = self.shapes.get(source) {
            let anchor = shape.bounds().anchor(Side::Right);
            self.scene.show_draft(anchor, anchor);
        }
        self.scene.set_cursor(Cursor::Crosshair);
        log::debug!("connecting from {source}");
    }

    fn complete_connection(&mut self, target: ShapeId) {
        let Some(draft) = self.state.draft else {
            return;
        };
        if self.editing_shape() == Some(draft.source) {
            self.commit_edit(false);
        }
        self.cancel_draft();

        match self.connections.create(&self.shapes, draft.source, target) {
            Ok(connection) => {
                log::debug!("connected {} -> {}", connection.source, connection.target);
                self.show_connection(&connection);
            }
            Err(e) => log::debug!("connection abandoned: {e}"),
        }
    }

    fn cancel_draft(&mut self) {
        if self.state.draft.take().is_some() {
            self.scene.hide_draft();
            let cursor = if self.state.pan_key_held() {
                Cursor::Grab
            } else {
                Cursor::Default
            };
            self.scene.set_cursor(cursor);
        }
    }

    fn show_connection(&mut self, connection: &Connection) {
        let (Some(source), Some(target)) = (
            self.shapes.get(connection.source),
            self.shapes.get(connection.target),
        ) else {
            return;
        };
        let path = ConnectionPath::new(connection, source, target);
        self.scene.create_connection_visual(connection, &path);
    }

    fn delete_connection(&mut self, id: ConnectionId) {
        match self.connections.remove(id) {
            Ok(_) => {
                self.scene.remove_connection_visual(id);
                if self.state.menu_connection == Some(id) {
                    self.state.menu_connection = None;
                }
            }
            Err(e) => log::warn!("delete connection: {e}"),
        }
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    fn zoom_by(&mut self, factor: f32) {
        self.clear_for_background();
        let current = self.scene.zoom_factor();
        let zoom = self.config.clamp_zoom(current * factor);
        let center = self.scene.viewport().center();
        let (cw, ch) = self.scene.container_size();
        let (width, height) = (cw / zoom, ch / zoom);
        self.scene.set_zoom_factor(zoom);
        self.scene.set_viewport(Viewport {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        });
        log::debug!("zoom {current} -> {zoom}");
    }

    fn reset_view(&mut self) {
        self.clear_for_background();
        let (width, height) = self.scene.container_size();
        self.scene.set_zoom_factor(1.0);
        self.scene.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width,
            height,
        });
    }

    // ─── Invariant guard ─────────────────────────────────────────────────

    /// Clear any state that points at a shape or connection that no longer
    /// exists. Correct sequencing never needs this; it keeps a stray ID
    /// from wedging the editor.
    fn repair_dangling_state(&mut self) {
        if let Some(id) = self.selected_shape()
            && !self.shapes.contains(id)
        {
            log::warn!("selection referred to removed {id}, clearing");
            if self.editing_shape() == Some(id) {
                self.scene.end_live_edit(id);
            }
            self.state.selection = Selection::None;
            self.scene.hide_menus();
        }
        if let Some(session) = self.state.selection.editing()
            && self.scene.read_live_edit_text(session.surface).is_none()
        {
            let id = session.shape;
            log::warn!("live surface of {id} went away, leaving edit");
            self.state.selection = Selection::Shape(id);
        }
        if let Some(draft) = self.state.draft
            && !self.shapes.contains(draft.source)
        {
            log::warn!("draft source {} removed, cancelling", draft.source);
            self.cancel_draft();
        }
        if let Some(id) = self.state.dragging
            && !self.shapes.contains(id)
        {
            self.state.dragging = None;
        }
        if let Some(click) = self.state.clicks.pending().copied()
            && !self.shapes.contains(click.shape)
        {
            self.state.clicks.cancel(click.shape);
        }
        if let Some(id) = self.state.menu_connection
            && self.connections.get(id).is_none()
        {
            self.state.menu_connection = None;
        }
    }
}
