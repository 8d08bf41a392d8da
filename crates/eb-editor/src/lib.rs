pub mod blur;
pub mod engine;
pub mod input;
pub mod scene;
pub mod schedule;
pub mod shortcuts;
pub mod state;

pub use blur::{BlurOutcome, resolve_blur};
pub use engine::InteractionEngine;
pub use input::{ElementRef, InputEvent, MenuAction, Modifiers, PointerButton};
pub use scene::{Cursor, EditSurface, ElementRole, Scene, Viewport};
pub use shortcuts::{KeyAction, KeyMap};
pub use state::{Mode, Selection};
