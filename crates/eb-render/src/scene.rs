//! Retained scene: an in-memory stand-in for the DOM.
//!
//! Holds one visual per shape and connection, the fixed chrome elements
//! (canvas, menu, toolbar, palette), the viewport, the live edit surfaces,
//! and the focus. Hosts without a DOM (the wasm bridge, tests) resolve
//! pointer positions to element handles with [`RetainedScene::element_at`].

use crate::path::distance_to_curve;
use eb_core::geometry::ConnectionPath;
use eb_core::id::{ConnectionId, ShapeId};
use eb_core::{Bounds, Connection, EditorError, Point, Shape, ShapeKind};
use eb_editor::input::ElementRef;
use eb_editor::scene::{Cursor, EditSurface, ElementRole, Scene, Viewport};
use std::collections::HashMap;

/// Size of a context menu in screen pixels.
pub const MENU_SIZE: (f32, f32) = (140.0, 120.0);

/// How close (screen pixels) a point must be to a curve to hit it.
pub const CONNECTION_HIT_TOLERANCE: f32 = 6.0;

/// Inset of the live edit surface inside its shape, canvas units.
const EDIT_SURFACE_INSET: f32 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LiveEdit {
    pub surface: EditSurface,
    pub element: ElementRef,
    pub text: String,
    pub focused: bool,
    /// Set by `focus_live_edit`; cleared once the text is typed over.
    pub all_selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeVisual {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub bounds: Bounds,
    pub label: String,
    pub element: ElementRef,
    pub selected: bool,
    pub live_edit: Option<LiveEdit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionVisual {
    pub id: ConnectionId,
    pub source: ShapeId,
    pub target: ShapeId,
    pub path: ConnectionPath,
    pub element: ElementRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MenuState {
    #[default]
    Hidden,
    Shape { id: ShapeId, at: Point },
    Connection { id: ConnectionId, at: Point },
}

impl MenuState {
    pub fn is_visible(&self) -> bool {
        !matches!(self, MenuState::Hidden)
    }

    fn anchor(&self) -> Option<Point> {
        match *self {
            MenuState::Hidden => None,
            MenuState::Shape { at, .. } | MenuState::Connection { at, .. } => Some(at),
        }
    }
}

#[derive(Debug)]
pub struct RetainedScene {
    container: (f32, f32),
    viewport: Viewport,
    zoom: f32,
    shapes: HashMap<ShapeId, ShapeVisual>,
    shape_order: Vec<ShapeId>,
    connections: HashMap<ConnectionId, ConnectionVisual>,
    connection_order: Vec<ConnectionId>,
    roles: HashMap<ElementRef, ElementRole>,
    next_element: u32,
    next_surface: u32,
    canvas: ElementRef,
    menu_element: ElementRef,
    toolbar: ElementRef,
    palette: ElementRef,
    menu: MenuState,
    draft: Option<(Point, Point)>,
    cursor: Cursor,
    focused: Option<ElementRef>,
    detached: bool,
}

impl RetainedScene {
    pub fn new(width: f32, height: f32) -> Self {
        let mut scene = Self {
            container: (width, height),
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
            zoom: 1.0,
            shapes: HashMap::new(),
            shape_order: Vec::new(),
            connections: HashMap::new(),
            connection_order: Vec::new(),
            roles: HashMap::new(),
            next_element: 0,
            next_surface: 0,
            canvas: ElementRef(0),
            menu_element: ElementRef(0),
            toolbar: ElementRef(0),
            palette: ElementRef(0),
            menu: MenuState::Hidden,
            draft: None,
            cursor: Cursor::Default,
            focused: None,
            detached: false,
        };
        scene.canvas = scene.allocate(ElementRole::Canvas);
        scene.menu_element = scene.allocate(ElementRole::Menu);
        scene.toolbar = scene.allocate(ElementRole::Toolbar);
        scene.palette = scene.allocate(ElementRole::Palette);
        scene
    }

    fn allocate(&mut self, role: ElementRole) -> ElementRef {
        self.next_element += 1;
        let el = ElementRef(self.next_element);
        self.roles.insert(el, role);
        el
    }

    fn release(&mut self, el: ElementRef) {
        self.roles.remove(&el);
        if self.focused == Some(el) {
            self.focused = None;
        }
    }

    fn live_edit_mut(&mut self, surface: EditSurface) -> Option<&mut LiveEdit> {
        self.shapes
            .values_mut()
            .filter_map(|v| v.live_edit.as_mut())
            .find(|edit| edit.surface == surface)
    }

    fn live_edit(&self, surface: EditSurface) -> Option<&LiveEdit> {
        self.shapes
            .values()
            .filter_map(|v| v.live_edit.as_ref())
            .find(|edit| edit.surface == surface)
    }

    fn canvas_to_screen(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.viewport.x) * self.zoom,
            (p.y - self.viewport.y) * self.zoom,
        )
    }

    // ─── Chrome handles ──────────────────────────────────────────────────

    pub fn canvas_element(&self) -> ElementRef {
        self.canvas
    }

    pub fn menu_element(&self) -> ElementRef {
        self.menu_element
    }

    pub fn toolbar_element(&self) -> ElementRef {
        self.toolbar
    }

    pub fn palette_element(&self) -> ElementRef {
        self.palette
    }

    pub fn shape_element(&self, id: ShapeId) -> Option<ElementRef> {
        self.shapes.get(&id).map(|v| v.element)
    }

    pub fn edit_surface_element(&self, id: ShapeId) -> Option<ElementRef> {
        self.shapes
            .get(&id)
            .and_then(|v| v.live_edit.as_ref())
            .map(|edit| edit.element)
    }

    pub fn connection_element(&self, id: ConnectionId) -> Option<ElementRef> {
        self.connections.get(&id).map(|v| v.element)
    }

    // ─── Host plumbing ───────────────────────────────────────────────────

    /// Move focus, as the browser does after a pointer-down or tab.
    pub fn focus(&mut self, element: Option<ElementRef>) {
        for visual in self.shapes.values_mut() {
            if let Some(edit) = visual.live_edit.as_mut() {
                edit.focused = element == Some(edit.element);
            }
        }
        self.focused = element;
    }

    /// Replace the text of a shape's live edit surface, as typing would.
    pub fn type_into_live_edit(&mut self, id: ShapeId, text: &str) -> bool {
        match self.shapes.get_mut(&id).and_then(|v| v.live_edit.as_mut()) {
            Some(edit) => {
                edit.text = text.to_string();
                edit.all_selected = false;
                true
            }
            None => false,
        }
    }

    /// Simulate losing the element geometry (e.g. the canvas was detached).
    pub fn set_detached(&mut self, detached: bool) {
        self.detached = detached;
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    pub fn shape_visual(&self, id: ShapeId) -> Option<&ShapeVisual> {
        self.shapes.get(&id)
    }

    pub fn connection_visual(&self, id: ConnectionId) -> Option<&ConnectionVisual> {
        self.connections.get(&id)
    }

    /// Shape visuals in paint order.
    pub fn shape_visuals(&self) -> impl Iterator<Item = &ShapeVisual> {
        self.shape_order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn connection_visuals(&self) -> impl Iterator<Item = &ConnectionVisual> {
        self.connection_order
            .iter()
            .filter_map(|id| self.connections.get(id))
    }

    pub fn label_of(&self, id: ShapeId) -> Option<&str> {
        self.shapes.get(&id).map(|v| v.label.as_str())
    }

    pub fn is_selected_visual(&self, id: ShapeId) -> bool {
        self.shapes.get(&id).is_some_and(|v| v.selected)
    }

    pub fn live_edit_of(&self, id: ShapeId) -> Option<&LiveEdit> {
        self.shapes.get(&id).and_then(|v| v.live_edit.as_ref())
    }

    pub fn menu(&self) -> MenuState {
        self.menu
    }

    pub fn draft(&self) -> Option<(Point, Point)> {
        self.draft
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    // ─── Point hit testing ───────────────────────────────────────────────

    /// Topmost element under a screen-space point.
    ///
    /// Order: open menu, live edit surfaces, regular shapes (last created on
    /// top), connections, slices, then the canvas.
    pub fn element_at(&self, screen: Point) -> ElementRef {
        if let Some(at) = self.menu.anchor() {
            let menu = Bounds::new(at.x, at.y, MENU_SIZE.0, MENU_SIZE.1);
            if menu.contains(screen) {
                return self.menu_element;
            }
        }

        let Ok(p) = self.screen_to_canvas(screen) else {
            return self.canvas;
        };

        for visual in self.shape_visuals() {
            if let Some(edit) = &visual.live_edit
                && edit_surface_bounds(&visual.bounds).contains(p)
            {
                return edit.element;
            }
        }

        let topmost = |slices: bool| {
            self.shape_order
                .iter()
                .rev()
                .filter_map(|id| self.shapes.get(id))
                .filter(move |v| (v.kind == ShapeKind::Slice) == slices)
                .find(|v| v.bounds.contains(p))
                .map(|v| v.element)
        };

        if let Some(el) = topmost(false) {
            return el;
        }

        let tolerance = f64::from(CONNECTION_HIT_TOLERANCE / self.zoom);
        if let Some(hit) = self
            .connection_visuals()
            .filter(|c| distance_to_curve(&c.path, p) <= tolerance)
            .last()
        {
            return hit.element;
        }

        topmost(true).unwrap_or(self.canvas)
    }
}

fn edit_surface_bounds(shape: &Bounds) -> Bounds {
    Bounds::new(
        shape.x + EDIT_SURFACE_INSET,
        shape.y + EDIT_SURFACE_INSET,
        (shape.width - 2.0 * EDIT_SURFACE_INSET).max(0.0),
        (shape.height - 2.0 * EDIT_SURFACE_INSET).max(0.0),
    )
}

impl Scene for RetainedScene {
    fn element_role(&self, element: ElementRef) -> ElementRole {
        self.roles
            .get(&element)
            .copied()
            .unwrap_or(ElementRole::Unknown)
    }

    fn focused_element(&self) -> Option<ElementRef> {
        self.focused
    }

    fn screen_to_canvas(&self, client: Point) -> Result<Point, EditorError> {
        if self.detached {
            return Err(EditorError::Geometry("scene is detached".into()));
        }
        if self.zoom <= 0.0 {
            return Err(EditorError::Geometry(format!("invalid zoom {}", self.zoom)));
        }
        Ok(Point::new(
            self.viewport.x + client.x / self.zoom,
            self.viewport.y + client.y / self.zoom,
        ))
    }

    fn shape_screen_bounds(&self, id: ShapeId) -> Result<Bounds, EditorError> {
        if self.detached {
            return Err(EditorError::Geometry("scene is detached".into()));
        }
        let visual = self.shapes.get(&id).ok_or(EditorError::ShapeNotFound(id))?;
        let origin = self.canvas_to_screen(Point::new(visual.bounds.x, visual.bounds.y));
        Ok(Bounds::new(
            origin.x,
            origin.y,
            visual.bounds.width * self.zoom,
            visual.bounds.height * self.zoom,
        ))
    }

    fn create_shape_visual(&mut self, shape: &Shape) {
        if self.shapes.contains_key(&shape.id) {
            log::warn!("visual for {} already exists", shape.id);
            return;
        }
        let element = self.allocate(ElementRole::Shape(shape.id));
        self.shapes.insert(
            shape.id,
            ShapeVisual {
                id: shape.id,
                kind: shape.kind,
                bounds: shape.bounds(),
                label: shape.label.clone(),
                element,
                selected: false,
                live_edit: None,
            },
        );
        self.shape_order.push(shape.id);
    }

    fn remove_shape_visual(&mut self, id: ShapeId) {
        let Some(visual) = self.shapes.remove(&id) else {
            return;
        };
        self.shape_order.retain(|s| *s != id);
        if let Some(edit) = visual.live_edit {
            self.release(edit.element);
        }
        self.release(visual.element);
    }

    fn update_shape_label_visual(&mut self, id: ShapeId, text: &str) {
        if let Some(visual) = self.shapes.get_mut(&id) {
            visual.label = text.to_string();
        }
    }

    fn set_shape_selected_visual(&mut self, id: ShapeId, selected: bool) {
        if let Some(visual) = self.shapes.get_mut(&id) {
            visual.selected = selected;
        }
    }

    fn move_shape_visual(&mut self, id: ShapeId, origin: Point) {
        if let Some(visual) = self.shapes.get_mut(&id) {
            visual.bounds.x = origin.x;
            visual.bounds.y = origin.y;
        }
    }

    fn create_connection_visual(&mut self, connection: &Connection, path: &ConnectionPath) {
        if self.connections.contains_key(&connection.id) {
            log::warn!("visual for {} already exists", connection.id);
            return;
        }
        let element = self.allocate(ElementRole::Connection(connection.id));
        self.connections.insert(
            connection.id,
            ConnectionVisual {
                id: connection.id,
                source: connection.source,
                target: connection.target,
                path: *path,
                element,
            },
        );
        self.connection_order.push(connection.id);
    }

    fn remove_connection_visual(&mut self, id: ConnectionId) {
        if let Some(visual) = self.connections.remove(&id) {
            self.connection_order.retain(|c| *c != id);
            self.release(visual.element);
        }
    }

    fn replot_connection_visual(&mut self, id: ConnectionId, path: &ConnectionPath) {
        if let Some(visual) = self.connections.get_mut(&id) {
            visual.path = *path;
            log::trace!("replot {id}");
        }
    }

    fn show_draft(&mut self, from: Point, to: Point) {
        self.draft = Some((from, to));
    }

    fn hide_draft(&mut self) {
        self.draft = None;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn zoom_factor(&self) -> f32 {
        self.zoom
    }

    fn set_zoom_factor(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    fn container_size(&self) -> (f32, f32) {
        self.container
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn begin_live_edit(&mut self, id: ShapeId) -> Result<EditSurface, EditorError> {
        if self.detached {
            return Err(EditorError::Geometry("scene is detached".into()));
        }
        if let Some(edit) = self.live_edit_of(id) {
            return Ok(edit.surface);
        }
        if !self.shapes.contains_key(&id) {
            return Err(EditorError::ShapeNotFound(id));
        }
        self.next_surface += 1;
        let surface = EditSurface(self.next_surface);
        let element = self.allocate(ElementRole::EditSurface(id));
        let visual = self
            .shapes
            .get_mut(&id)
            .ok_or(EditorError::ShapeNotFound(id))?;
        visual.live_edit = Some(LiveEdit {
            surface,
            element,
            text: visual.label.clone(),
            focused: false,
            all_selected: false,
        });
        Ok(surface)
    }

    fn focus_live_edit(&mut self, surface: EditSurface) {
        let Some(edit) = self.live_edit_mut(surface) else {
            log::warn!("focus: no live surface {surface:?}");
            return;
        };
        edit.all_selected = true;
        let element = edit.element;
        self.focus(Some(element));
    }

    fn end_live_edit(&mut self, id: ShapeId) {
        let Some(edit) = self.shapes.get_mut(&id).and_then(|v| v.live_edit.take()) else {
            return;
        };
        self.release(edit.element);
    }

    fn read_live_edit_text(&self, surface: EditSurface) -> Option<String> {
        self.live_edit(surface).map(|edit| edit.text.clone())
    }

    fn set_live_edit_text(&mut self, surface: EditSurface, text: &str) {
        if let Some(edit) = self.live_edit_mut(surface) {
            edit.text = text.to_string();
        }
    }

    fn show_shape_menu(&mut self, id: ShapeId, at: Point) {
        self.menu = MenuState::Shape { id, at };
    }

    fn show_connection_menu(&mut self, id: ConnectionId, at: Point) {
        self.menu = MenuState::Connection { id, at };
    }

    fn hide_menus(&mut self) {
        self.menu = MenuState::Hidden;
    }
}
