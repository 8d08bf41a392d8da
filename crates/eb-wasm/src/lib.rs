//! WASM bridge for Event Board: exposes the interaction engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page forwards raw
//! pointer, keyboard, focus, drag, and drop events; element resolution
//! happens against the retained scene, so JS only deals in coordinates and
//! shape ids. After every call the page should schedule `run_deferred` on
//! the next turn (`setTimeout(0)`) and `tick` at `next_timer_deadline`.

use eb_core::id::ShapeId;
use eb_core::{EditorConfig, Point};
use eb_editor::input::{InputEvent, MenuAction, Modifiers, PointerButton};
use eb_editor::scene::{Cursor, Scene};
use eb_editor::{InteractionEngine, Mode};
use eb_render::{MenuState, RetainedScene};
use serde_json::json;
use wasm_bindgen::prelude::*;

/// The WASM-facing board controller.
#[wasm_bindgen]
pub struct EbCanvas {
    engine: InteractionEngine<RetainedScene>,
}

#[wasm_bindgen]
impl EbCanvas {
    /// Create a board controller for a container of the given size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> Self {
        console_error_panic_hook_setup();
        Self::from_config(width, height, EditorConfig::default())
    }

    /// Create a controller from a (possibly partial) JSON `EditorConfig`.
    pub fn with_config(width: f32, height: f32, config_json: &str) -> Result<EbCanvas, JsValue> {
        console_error_panic_hook_setup();
        let config: EditorConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {e}")))?;
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::from_config(width, height, config))
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// `button` is the DOM `MouseEvent.button` value.
    pub fn pointer_down(&mut self, x: f32, y: f32, button: i16) -> bool {
        let target = self.engine.scene().element_at(Point::new(x, y));
        self.engine.handle(InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            target,
        })
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.engine.handle(InputEvent::PointerMove { x, y })
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.engine.handle(InputEvent::PointerUp { x, y })
    }

    pub fn click(&mut self, x: f32, y: f32, time_ms: f64) -> bool {
        let target = self.engine.scene().element_at(Point::new(x, y));
        self.engine.handle(InputEvent::Click {
            x,
            y,
            target,
            time_ms,
        })
    }

    pub fn double_click(&mut self, x: f32, y: f32) -> bool {
        let target = self.engine.scene().element_at(Point::new(x, y));
        self.engine.handle(InputEvent::DoubleClick { target })
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Returns `false` when the key should keep its default behavior.
    pub fn key_down(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.engine.handle(InputEvent::key_down(key, modifiers))
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.engine.handle(InputEvent::key_up(key))
    }

    // ─── Focus & text ────────────────────────────────────────────────────

    /// The live edit surface of `shape_id` lost focus.
    pub fn blur(&mut self, shape_id: &str) -> bool {
        self.engine.handle(InputEvent::Blur {
            shape: ShapeId::intern(shape_id),
        })
    }

    /// Record that focus moved to whatever is under `(x, y)`.
    pub fn focus_at(&mut self, x: f32, y: f32) {
        let element = self.engine.scene().element_at(Point::new(x, y));
        self.engine.scene_mut().focus(Some(element));
    }

    /// Record that focus moved to a menu, toolbar, or palette control.
    pub fn focus_chrome(&mut self, which: &str) {
        let scene = self.engine.scene();
        let element = match which {
            "menu" => scene.menu_element(),
            "toolbar" => scene.toolbar_element(),
            "palette" => scene.palette_element(),
            _ => scene.canvas_element(),
        };
        self.engine.scene_mut().focus(Some(element));
    }

    pub fn clear_focus(&mut self) {
        self.engine.scene_mut().focus(None);
    }

    /// Mirror the live edit surface's text into the scene.
    pub fn type_text(&mut self, shape_id: &str, text: &str) -> bool {
        self.engine
            .scene_mut()
            .type_into_live_edit(ShapeId::intern(shape_id), text)
    }

    // ─── Drag & drop ─────────────────────────────────────────────────────

    pub fn drag_start(&mut self, shape_id: &str) -> bool {
        self.engine.handle(InputEvent::DragStart {
            shape: ShapeId::intern(shape_id),
        })
    }

    /// `x`, `y` are the dragged box's new canvas-space origin.
    pub fn drag_move(&mut self, shape_id: &str, x: f32, y: f32) -> bool {
        self.engine.handle(InputEvent::DragMove {
            shape: ShapeId::intern(shape_id),
            x,
            y,
        })
    }

    pub fn drag_end(&mut self, shape_id: &str) -> bool {
        self.engine.handle(InputEvent::DragEnd {
            shape: ShapeId::intern(shape_id),
        })
    }

    /// A palette item named `kind` was dropped at screen `(x, y)`.
    pub fn drop_shape(&mut self, kind: &str, x: f32, y: f32) -> bool {
        self.engine.handle(InputEvent::Drop {
            kind: kind.to_string(),
            x,
            y,
        })
    }

    // ─── Menus ───────────────────────────────────────────────────────────

    /// Dispatch a menu or toolbar action by name (`edit`, `connect`,
    /// `delete`, `delete-connection`, `zoom-in`, `zoom-out`, `reset-view`).
    pub fn menu_action(&mut self, name: &str) -> bool {
        match MenuAction::from_name(name) {
            Some(action) => {
                self.engine.menu_action(action);
                true
            }
            None => {
                log::warn!("unknown menu action {name:?}");
                false
            }
        }
    }

    // ─── Scheduling ──────────────────────────────────────────────────────

    pub fn tick(&mut self, now_ms: f64) {
        self.engine.tick(now_ms);
    }

    pub fn run_deferred(&mut self) {
        self.engine.run_deferred();
    }

    pub fn has_deferred(&self) -> bool {
        self.engine.has_deferred()
    }

    pub fn next_timer_deadline(&self) -> Option<f64> {
        self.engine.next_timer_deadline()
    }

    // ─── Output ──────────────────────────────────────────────────────────

    pub fn render_svg(&self) -> String {
        self.engine.scene().to_svg()
    }

    /// CSS cursor name for the canvas.
    pub fn cursor(&self) -> String {
        cursor_css(self.engine.scene().cursor()).to_string()
    }

    /// Snapshot of the board and the interaction state as JSON.
    pub fn state_json(&self) -> String {
        let engine = &self.engine;
        let scene = engine.scene();
        let viewport = scene.viewport();
        let shapes: Vec<_> = engine.shapes().iter().collect();
        let connections: Vec<_> = engine.connections().iter().collect();
        let menu = match scene.menu() {
            MenuState::Hidden => serde_json::Value::Null,
            MenuState::Shape { id, at } => json!({ "shape": id, "x": at.x, "y": at.y }),
            MenuState::Connection { id, at } => json!({ "connection": id, "x": at.x, "y": at.y }),
        };
        let editing = engine.editing_shape().map(|id| {
            let text = scene.live_edit_of(id).map(|edit| edit.text.clone());
            json!({ "shape": id, "text": text })
        });

        let state = json!({
            "mode": mode_name(engine.mode()),
            "selected": engine.selected_shape(),
            "editing": editing,
            "connectingFrom": engine.connection_draft_source(),
            "dragging": engine.dragging_shape(),
            "menu": menu,
            "viewport": {
                "x": viewport.x,
                "y": viewport.y,
                "width": viewport.width,
                "height": viewport.height,
                "zoom": scene.zoom_factor(),
            },
            "shapes": shapes,
            "connections": connections,
        });
        serde_json::to_string(&state).unwrap_or_else(|_| "{}".to_string())
    }
}

impl EbCanvas {
    fn from_config(width: f32, height: f32, config: EditorConfig) -> Self {
        Self {
            engine: InteractionEngine::new(RetainedScene::new(width, height), config),
        }
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Idle => "idle",
        Mode::ShapeSelected(_) => "selected",
        Mode::Editing(_) => "editing",
        Mode::ConnectingFrom(_) => "connecting",
        Mode::Panning => "panning",
    }
}

fn cursor_css(cursor: Cursor) -> &'static str {
    match cursor {
        Cursor::Default => "default",
        Cursor::Grab => "grab",
        Cursor::Grabbing => "grabbing",
        Cursor::Crosshair => "crosshair",
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Event Board WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(canvas: &EbCanvas) -> serde_json::Value {
        serde_json::from_str(&canvas.state_json()).unwrap()
    }

    #[test]
    fn drop_type_enter_round_trip() {
        let mut canvas = EbCanvas::new(800.0, 600.0);
        assert!(canvas.drop_shape("command", 100.0, 50.0));
        canvas.run_deferred();

        let s = state(&canvas);
        assert_eq!(s["mode"], "editing");
        let id = s["editing"]["shape"].as_str().unwrap().to_string();
        assert_eq!(s["editing"]["text"], "Command");

        assert!(canvas.type_text(&id, "Place Order"));
        assert!(canvas.key_down("Enter", false, false, false, false));

        let s = state(&canvas);
        assert_eq!(s["mode"], "selected");
        assert_eq!(s["shapes"][0]["label"], "Place Order");
        assert_eq!(s["menu"]["shape"], id.as_str());
    }

    #[test]
    fn clicks_resolve_by_position() {
        let mut canvas = EbCanvas::new(800.0, 600.0);
        canvas.drop_shape("Event", 100.0, 100.0);
        canvas.key_down("Enter", false, false, false, false);

        // Background click deselects.
        assert!(canvas.click(600.0, 500.0, 0.0));
        assert_eq!(state(&canvas)["mode"], "idle");

        assert!(canvas.click(150.0, 110.0, 1000.0));
        assert_eq!(canvas.next_timer_deadline(), Some(1150.0));
        canvas.tick(1150.0);
        assert_eq!(state(&canvas)["mode"], "selected");
    }

    #[test]
    fn unknown_menu_action_is_rejected() {
        let mut canvas = EbCanvas::new(800.0, 600.0);
        assert!(!canvas.menu_action("explode"));
        assert!(canvas.menu_action("zoom-in"));
        let zoom = state(&canvas)["viewport"]["zoom"].as_f64().unwrap();
        assert!((zoom - 1.2).abs() < 1e-5);
    }

    #[test]
    fn partial_config_merges_with_defaults() {
        let mut canvas = EbCanvas::with_config(800.0, 600.0, r#"{ "zoom_max": 1.5 }"#)
            .unwrap_or_else(|_| panic!("config should be accepted"));
        canvas.menu_action("zoom-in");
        canvas.menu_action("zoom-in");
        let zoom = state(&canvas)["viewport"]["zoom"].as_f64().unwrap();
        assert!((zoom - 1.5).abs() < 1e-5);
    }

    #[test]
    fn space_arms_grab_cursor() {
        let mut canvas = EbCanvas::new(800.0, 600.0);
        canvas.key_down(" ", false, false, false, false);
        assert_eq!(canvas.cursor(), "grab");
        canvas.key_up(" ");
        assert_eq!(canvas.cursor(), "default");
    }

    #[test]
    fn svg_export_includes_dropped_shape() {
        let mut canvas = EbCanvas::new(800.0, 600.0);
        canvas.drop_shape("read-model", 10.0, 10.0);
        assert!(canvas.render_svg().contains("Read Model"));
    }
}
