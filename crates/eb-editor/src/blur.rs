//! Deciding what a blur of the live edit surface means.
//!
//! Evaluated one event-loop turn after the blur, once the browser has moved
//! focus, as a pure function of the editing state and the role of the
//! element that now has focus.

use crate::scene::ElementRole;
use eb_core::id::ShapeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurOutcome {
    /// Not a real focus change, or the edit already ended.
    Ignore,
    /// A menu, toolbar, or palette control got focus; its own click handler
    /// commits the edit.
    Defer,
    /// Save the label, optionally reopening the shape's menu.
    Commit { reopen_menu: bool },
}

/// `editing` is the shape being edited now, `blurred` the shape whose
/// surface reported the blur, `focus` the role of the newly focused element.
pub fn resolve_blur(editing: Option<ShapeId>, blurred: ShapeId, focus: ElementRole) -> BlurOutcome {
    if editing != Some(blurred) {
        return BlurOutcome::Ignore;
    }
    match focus {
        ElementRole::EditSurface(id) if id == blurred => BlurOutcome::Ignore,
        ElementRole::Menu | ElementRole::Toolbar | ElementRole::Palette => BlurOutcome::Defer,
        ElementRole::Shape(id) if id == blurred => BlurOutcome::Commit { reopen_menu: true },
        ElementRole::Shape(_)
        | ElementRole::EditSurface(_)
        | ElementRole::Connection(_)
        | ElementRole::Canvas
        | ElementRole::Unknown => BlurOutcome::Commit { reopen_menu: false },
    }
}
