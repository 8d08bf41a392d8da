//! Keyboard mapping.
//!
//! Maps key + modifier combos to semantic `KeyAction`s. The mapping depends
//! on whether a live edit surface is active: while editing, only Enter and
//! Escape are intercepted and every other key belongs to the text surface.

use crate::input::Modifiers;

/// Actions that keys can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // ── While editing ──
    /// Enter without Shift: save the label and reopen the menu.
    CommitEdit,
    /// Escape: cancel the connection draft if any, else revert the label.
    CancelEdit,

    // ── Otherwise ──
    DeleteSelected,
    /// Cancel a connection draft, or hide menus and deselect.
    Escape,
    /// Space held: arm panning.
    ArmPan,
    ZoomIn,
    ZoomOut,
    ResetView,
}

pub struct KeyMap;

impl KeyMap {
    /// Resolve a key press. Returns `None` if the key should be left to the
    /// browser (or to the live text surface).
    pub fn resolve(key: &str, modifiers: Modifiers, editing: bool) -> Option<KeyAction> {
        if editing {
            return match key {
                "Enter" if !modifiers.shift => Some(KeyAction::CommitEdit),
                "Escape" => Some(KeyAction::CancelEdit),
                _ => None,
            };
        }

        if modifiers.command() {
            return match key {
                "=" | "+" => Some(KeyAction::ZoomIn),
                "-" => Some(KeyAction::ZoomOut),
                "0" => Some(KeyAction::ResetView),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(KeyAction::DeleteSelected),
            "Escape" => Some(KeyAction::Escape),
            " " => Some(KeyAction::ArmPan),
            _ => None,
        }
    }

    /// Whether releasing `key` disarms panning.
    pub fn is_pan_key(key: &str) -> bool {
        key == " "
    }
}
