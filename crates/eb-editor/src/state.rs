//! The interaction state record.
//!
//! Selection and editing share one enum so that "editing but nothing
//! selected" cannot be represented. Connection drafting and panning are
//! separate axes because they can overlap an edit (Escape while both an edit
//! and a draft are live cancels the draft).

use crate::scene::EditSurface;
use crate::schedule::ClickDebouncer;
use eb_core::Point;
use eb_core::id::{ConnectionId, ShapeId};

/// A live label edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub shape: ShapeId,
    pub surface: EditSurface,
    /// Label before editing began; restored on cancel.
    pub saved_label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    Shape(ShapeId),
    /// Editing implies selection of the same shape.
    Editing(EditSession),
}

impl Selection {
    pub fn selected(&self) -> Option<ShapeId> {
        match self {
            Selection::None => None,
            Selection::Shape(id) => Some(*id),
            Selection::Editing(session) => Some(session.shape),
        }
    }

    pub fn editing(&self) -> Option<&EditSession> {
        match self {
            Selection::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn editing_shape(&self) -> Option<ShapeId> {
        self.editing().map(|s| s.shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanState {
    #[default]
    Disarmed,
    /// Space is held; the next pointer-down on the background pans.
    Armed,
    Active {
        last: Point,
        /// Whether the pan key is still down (restores `Armed` on release).
        key_held: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionDraft {
    pub source: ShapeId,
}

/// Dominant interaction mode, for hosts and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    ShapeSelected(ShapeId),
    Editing(ShapeId),
    ConnectingFrom(ShapeId),
    Panning,
}

/// Everything the engine tracks between events. Owned and mutated by the
/// engine only.
#[derive(Debug, Default)]
pub struct InteractionState {
    pub selection: Selection,
    pub draft: Option<ConnectionDraft>,
    pub pan: PanState,
    pub clicks: ClickDebouncer,
    /// Shape between `DragStart` and `DragEnd`. Moves for any other shape are ignored.
    pub dragging: Option<ShapeId>,
    /// Connection whose context menu is open.
    pub menu_connection: Option<ConnectionId>,
}

impl InteractionState {
    pub fn mode(&self) -> Mode {
        if matches!(self.pan, PanState::Active { .. }) {
            return Mode::Panning;
        }
        if let Some(draft) = self.draft {
            return Mode::ConnectingFrom(draft.source);
        }
        match &self.selection {
            Selection::Editing(session) => Mode::Editing(session.shape),
            Selection::Shape(id) => Mode::ShapeSelected(*id),
            Selection::None => Mode::Idle,
        }
    }

    pub fn pan_key_held(&self) -> bool {
        match self.pan {
            PanState::Armed => true,
            PanState::Active { key_held, .. } => key_held,
            PanState::Disarmed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_implies_selection() {
        let id = ShapeId::intern("state_a");
        let sel = Selection::Editing(EditSession {
            shape: id,
            surface: EditSurface(1),
            saved_label: "Command".into(),
        });
        assert_eq!(sel.selected(), Some(id));
        assert_eq!(sel.editing_shape(), Some(id));
        assert_eq!(Selection::Shape(id).editing_shape(), None);
    }

    #[test]
    fn mode_priority() {
        let id = ShapeId::intern("state_b");
        let mut state = InteractionState::default();
        assert_eq!(state.mode(), Mode::Idle);

        state.selection = Selection::Editing(EditSession {
            shape: id,
            surface: EditSurface(2),
            saved_label: String::new(),
        });
        assert_eq!(state.mode(), Mode::Editing(id));

        state.draft = Some(ConnectionDraft { source: id });
        assert_eq!(state.mode(), Mode::ConnectingFrom(id));

        state.pan = PanState::Active {
            last: Point::default(),
            key_held: false,
        };
        assert_eq!(state.mode(), Mode::Panning);
    }
}
