//! The rendering-surface contract.
//!
//! The engine never touches the DOM (or any other surface) directly. It asks
//! a `Scene` to classify elements, convert coordinates, and show or hide
//! visuals. The scene never initiates state changes.

use crate::input::ElementRef;
use eb_core::geometry::ConnectionPath;
use eb_core::id::{ConnectionId, ShapeId};
use eb_core::{Bounds, Connection, EditorError, Point, Shape};

/// Visible region of the canvas, in canvas coordinates (an SVG `viewBox`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Handle to an in-place text editor overlaid on a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditSurface(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    /// Pan armed (space held).
    Grab,
    /// Actively panning.
    Grabbing,
    Crosshair,
}

/// What a rendered element is, as far as interaction is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    /// The live text surface of a shape being edited.
    EditSurface(ShapeId),
    /// Any non-text part of a shape (border, background, icon).
    Shape(ShapeId),
    Connection(ConnectionId),
    Menu,
    Toolbar,
    Palette,
    /// Empty canvas background.
    Canvas,
    Unknown,
}

pub trait Scene {
    // ─── Queries ─────────────────────────────────────────────────────────

    fn element_role(&self, element: ElementRef) -> ElementRole;

    fn hit_test_shape(&self, element: ElementRef) -> Option<ShapeId> {
        match self.element_role(element) {
            ElementRole::Shape(id) | ElementRole::EditSurface(id) => Some(id),
            _ => None,
        }
    }

    fn hit_test_connection(&self, element: ElementRef) -> Option<ConnectionId> {
        match self.element_role(element) {
            ElementRole::Connection(id) => Some(id),
            _ => None,
        }
    }

    /// The element currently holding keyboard focus, if any.
    fn focused_element(&self) -> Option<ElementRef>;

    fn screen_to_canvas(&self, client: Point) -> Result<Point, EditorError>;

    /// Bounding box of a shape's visual in screen coordinates.
    fn shape_screen_bounds(&self, id: ShapeId) -> Result<Bounds, EditorError>;

    // ─── Shapes ──────────────────────────────────────────────────────────

    fn create_shape_visual(&mut self, shape: &Shape);
    fn remove_shape_visual(&mut self, id: ShapeId);
    fn update_shape_label_visual(&mut self, id: ShapeId, text: &str);
    fn set_shape_selected_visual(&mut self, id: ShapeId, selected: bool);

    /// Sync a visual to a new canvas-space origin. Surfaces whose drag
    /// recognizer already moved the node can keep the default no-op.
    fn move_shape_visual(&mut self, _id: ShapeId, _origin: Point) {}

    // ─── Connections ─────────────────────────────────────────────────────

    fn create_connection_visual(&mut self, connection: &Connection, path: &ConnectionPath);
    fn remove_connection_visual(&mut self, id: ConnectionId);
    fn replot_connection_visual(&mut self, id: ConnectionId, path: &ConnectionPath);

    /// Rubber-band line from a source anchor to the pointer (canvas space).
    fn show_draft(&mut self, from: Point, to: Point);
    fn hide_draft(&mut self);

    // ─── Viewport ────────────────────────────────────────────────────────

    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    fn zoom_factor(&self) -> f32;
    fn set_zoom_factor(&mut self, zoom: f32);
    /// Size of the hosting container in screen pixels.
    fn container_size(&self) -> (f32, f32);
    fn set_cursor(&mut self, cursor: Cursor);

    // ─── Live editing ────────────────────────────────────────────────────

    /// Make the shape's label editable. Fails if the visual is gone.
    fn begin_live_edit(&mut self, id: ShapeId) -> Result<EditSurface, EditorError>;
    /// Focus the surface and select all of its text.
    fn focus_live_edit(&mut self, surface: EditSurface);
    fn end_live_edit(&mut self, id: ShapeId);
    fn read_live_edit_text(&self, surface: EditSurface) -> Option<String>;
    fn set_live_edit_text(&mut self, surface: EditSurface, text: &str);

    // ─── Menus ───────────────────────────────────────────────────────────

    /// Show a shape's context menu at a screen position.
    fn show_shape_menu(&mut self, id: ShapeId, at: Point);
    fn show_connection_menu(&mut self, id: ConnectionId, at: Point);
    fn hide_menus(&mut self);
}
