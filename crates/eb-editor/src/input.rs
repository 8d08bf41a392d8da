//! Input abstraction layer.
//!
//! Normalizes browser pointer, keyboard, focus, drag, and drop events
//! into a unified `InputEvent` enum consumed by the interaction engine.
//! Elements are referred to by opaque handles the `Scene` hands out.

use eb_core::id::ShapeId;

/// Opaque handle to a rendered element (a DOM node in the browser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event. Coordinates are client (screen) pixels
/// unless stated otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
        button: PointerButton,
        target: ElementRef,
    },

    PointerMove { x: f32, y: f32 },

    PointerUp { x: f32, y: f32 },

    /// A completed click. `time_ms` drives the single/double-click debounce.
    Click {
        x: f32,
        y: f32,
        target: ElementRef,
        time_ms: f64,
    },

    DoubleClick { target: ElementRef },

    /// `key` is the DOM `KeyboardEvent.key` value (e.g. `"Enter"`, `" "`).
    KeyDown { key: String, modifiers: Modifiers },

    KeyUp { key: String },

    /// Reported by the renderer's drag gesture recognizer.
    DragStart { shape: ShapeId },

    /// `x`/`y` are the new canvas-space box origin.
    DragMove { shape: ShapeId, x: f32, y: f32 },

    DragEnd { shape: ShapeId },

    /// The live edit surface of `shape` lost focus.
    Blur { shape: ShapeId },

    /// A palette item was dropped. `kind` is the raw drag payload.
    Drop { kind: String, x: f32, y: f32 },
}

impl InputEvent {
    pub fn key_down(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
        }
    }

    pub fn key_up(key: &str) -> Self {
        Self::KeyUp {
            key: key.to_string(),
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::Click { x, y, .. }
            | Self::Drop { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }
}

/// Semantic actions invoked from menus and toolbar controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Edit,
    Connect,
    Delete,
    /// Delete the connection whose context menu is open.
    DeleteConnection,
    ZoomIn,
    ZoomOut,
    ResetView,
}

impl MenuAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "edit" => Some(MenuAction::Edit),
            "connect" => Some(MenuAction::Connect),
            "delete" => Some(MenuAction::Delete),
            "delete-connection" => Some(MenuAction::DeleteConnection),
            "zoom-in" => Some(MenuAction::ZoomIn),
            "zoom-out" => Some(MenuAction::ZoomOut),
            "reset-view" | "reset" => Some(MenuAction::ResetView),
            _ => None,
        }
    }
}
