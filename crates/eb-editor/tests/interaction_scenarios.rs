//! Integration tests: end-to-end editing scenarios (eb-editor ↔ eb-render).
//!
//! Drives `InteractionEngine<RetainedScene>` the way a browser host would:
//! input events, then `tick` for the click timer and `run_deferred` for the
//! next event-loop turn. Asserts on both the stores and the retained visuals.

use eb_core::id::ShapeId;
use eb_core::{EditorConfig, Point, ShapeKind, Side};
use eb_editor::input::{ElementRef, InputEvent, MenuAction, Modifiers, PointerButton};
use eb_editor::scene::{Cursor, Scene};
use eb_editor::{InteractionEngine, Mode};
use eb_render::{MenuState, RetainedScene};
use pretty_assertions::assert_eq;

type Engine = InteractionEngine<RetainedScene>;

fn engine() -> Engine {
    let _ = env_logger::builder().is_test(true).try_init();
    InteractionEngine::new(RetainedScene::new(800.0, 600.0), EditorConfig::default())
}

fn click(engine: &mut Engine, target: ElementRef, at: Point, time_ms: f64) -> bool {
    engine.handle(InputEvent::Click {
        x: at.x,
        y: at.y,
        target,
        time_ms,
    })
}

fn shape_el(engine: &Engine, id: ShapeId) -> ElementRef {
    engine.scene().shape_element(id).unwrap()
}

/// Single click on a shape, then let the debounce window elapse.
fn select_by_click(engine: &mut Engine, id: ShapeId, time_ms: f64) {
    let el = shape_el(engine, id);
    click(engine, el, Point::default(), time_ms);
    engine.tick(time_ms + 150.0);
}

fn key(engine: &mut Engine, key: &str) -> bool {
    engine.handle(InputEvent::key_down(key, Modifiers::NONE))
}

// ─── Drop → edit → commit ───────────────────────────────────────────────

#[test]
fn drop_creates_shape_in_edit_mode() {
    let mut engine = engine();
    assert!(engine.handle(InputEvent::Drop {
        kind: "Command".into(),
        x: 100.0,
        y: 50.0,
    }));

    let id = engine.selected_shape().unwrap();
    let shape = engine.shapes().get(id).unwrap();
    assert_eq!((shape.kind, shape.x, shape.y), (ShapeKind::Command, 100.0, 50.0));
    assert_eq!(engine.mode(), Mode::Editing(id));
    assert!(engine.scene().is_selected_visual(id));
    assert_eq!(engine.scene().live_edit_of(id).unwrap().text, "Command");

    // Focus is applied on the next turn, once the surface is live.
    assert_eq!(engine.scene().focused_element(), None);
    engine.run_deferred();
    assert_eq!(
        engine.scene().focused_element(),
        engine.scene().edit_surface_element(id)
    );
    assert!(engine.scene().live_edit_of(id).unwrap().all_selected);
}

#[test]
fn enter_commits_and_reopens_menu() {
    let mut engine = engine();
    engine.handle(InputEvent::Drop {
        kind: "Command".into(),
        x: 100.0,
        y: 50.0,
    });
    engine.run_deferred();
    let id = engine.editing_shape().unwrap();

    engine.scene_mut().type_into_live_edit(id, "Place Order");
    assert!(key(&mut engine, "Enter"));

    assert_eq!(engine.shapes().get(id).unwrap().label, "Place Order");
    assert_eq!(engine.scene().label_of(id), Some("Place Order"));
    assert_eq!(engine.mode(), Mode::ShapeSelected(id));
    assert!(engine.scene().live_edit_of(id).is_none());
    assert_eq!(
        engine.scene().menu(),
        MenuState::Shape {
            id,
            at: Point::new(220.0, 50.0),
        }
    );
}

// ─── Connecting ─────────────────────────────────────────────────────────

#[test]
fn connect_action_then_click_creates_connection() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);

    select_by_click(&mut engine, a, 0.0);
    assert_eq!(engine.mode(), Mode::ShapeSelected(a));

    engine.menu_action(MenuAction::Connect);
    assert_eq!(engine.mode(), Mode::ConnectingFrom(a));
    assert_eq!(engine.scene().menu(), MenuState::Hidden);
    assert_eq!(engine.scene().cursor(), Cursor::Crosshair);
    assert_eq!(
        engine.scene().draft(),
        Some((Point::new(120.0, 40.0), Point::new(120.0, 40.0)))
    );

    // Rubber band leaves from the side nearest the pointer.
    engine.handle(InputEvent::PointerMove { x: 250.0, y: 40.0 });
    assert_eq!(
        engine.scene().draft(),
        Some((Point::new(120.0, 40.0), Point::new(250.0, 40.0)))
    );

    let b_el = shape_el(&engine, b);
    click(&mut engine, b_el, Point::new(310.0, 40.0), 1000.0);

    assert_eq!(engine.connections().len(), 1);
    let connection = engine.connections().iter().next().unwrap();
    assert_eq!((connection.source, connection.target), (a, b));
    assert_eq!(
        (connection.source_side, connection.target_side),
        (Side::Right, Side::Left)
    );
    assert!(engine.scene().connection_visual(connection.id).is_some());
    assert_eq!(engine.connection_draft_source(), None);
    assert_eq!(engine.scene().draft(), None);
    assert_eq!(engine.scene().cursor(), Cursor::Default);
}

#[test]
fn stacked_shapes_connect_bottom_to_top() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 0.0, 300.0, None);

    select_by_click(&mut engine, a, 0.0);
    engine.menu_action(MenuAction::Connect);
    let b_el = shape_el(&engine, b);
    click(&mut engine, b_el, Point::default(), 500.0);

    let connection = engine.connections().iter().next().unwrap();
    assert_eq!(
        (connection.source_side, connection.target_side),
        (Side::Bottom, Side::Top)
    );
}

#[test]
fn clicking_the_source_cancels_the_draft() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);

    select_by_click(&mut engine, a, 0.0);
    engine.menu_action(MenuAction::Connect);
    let a_el = shape_el(&engine, a);
    click(&mut engine, a_el, Point::default(), 500.0);

    assert!(engine.connections().is_empty());
    assert_eq!(engine.connection_draft_source(), None);
    assert_eq!(engine.scene().draft(), None);
}

#[test]
fn background_click_cancels_draft_and_deselects() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);

    select_by_click(&mut engine, a, 0.0);
    engine.menu_action(MenuAction::Connect);
    engine.handle(InputEvent::PointerMove { x: 200.0, y: 200.0 });
    assert!(engine.scene().draft().is_some());

    let canvas = engine.scene().canvas_element();
    click(&mut engine, canvas, Point::new(600.0, 500.0), 500.0);

    assert_eq!(engine.mode(), Mode::Idle);
    assert!(engine.connections().is_empty());
    assert_eq!(engine.selected_shape(), None);
    assert_eq!(engine.scene().draft(), None);
    assert!(!engine.scene().is_selected_visual(a));
}

// ─── Deleting ───────────────────────────────────────────────────────────

#[test]
fn deleting_source_removes_its_connections_first() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);
    let cid = engine.connect(a, b).unwrap();
    let conn_el = engine.scene().connection_element(cid).unwrap();

    select_by_click(&mut engine, a, 0.0);
    assert!(key(&mut engine, "Delete"));

    assert!(engine.shapes().get(a).is_none());
    assert!(engine.connections().get(cid).is_none());
    assert!(engine.connections().connections_touching(a).is_empty());
    assert!(engine.connections().connections_touching(b).is_empty());
    assert!(engine.scene().connection_visual(cid).is_none());
    assert!(engine.scene().shape_visual(a).is_none());
    assert_eq!(
        engine.scene().element_role(conn_el),
        eb_editor::ElementRole::Unknown
    );
    assert_eq!(engine.mode(), Mode::Idle);
    assert_eq!(engine.scene().menu(), MenuState::Hidden);
}

#[test]
fn delete_action_cancels_edit_then_deletes() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let a_el = shape_el(&engine, a);
    engine.handle(InputEvent::DoubleClick { target: a_el });
    engine.scene_mut().type_into_live_edit(a, "half typed");

    engine.menu_action(MenuAction::Delete);

    assert!(engine.shapes().is_empty());
    assert_eq!(engine.mode(), Mode::Idle);
    assert_eq!(engine.editing_shape(), None);
    assert!(engine.scene().shape_visual(a).is_none());
}

#[test]
fn connection_menu_deletes_the_connection() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);
    let cid = engine.connect(a, b).unwrap();
    select_by_click(&mut engine, a, 0.0);

    let conn_el = engine.scene().connection_element(cid).unwrap();
    click(&mut engine, conn_el, Point::new(210.0, 40.0), 500.0);

    assert_eq!(engine.selected_shape(), None);
    assert_eq!(engine.menu_connection(), Some(cid));
    assert_eq!(
        engine.scene().menu(),
        MenuState::Connection {
            id: cid,
            at: Point::new(210.0, 40.0),
        }
    );

    engine.menu_action(MenuAction::DeleteConnection);
    assert!(engine.connections().is_empty());
    assert!(engine.scene().connection_visual(cid).is_none());
    assert_eq!(engine.menu_connection(), None);
    assert_eq!(engine.scene().menu(), MenuState::Hidden);
    assert_eq!(engine.shapes().len(), 2);
}

// ─── Selection ──────────────────────────────────────────────────────────

#[test]
fn click_while_editing_other_shape_commits_then_selects() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);

    let a_el = shape_el(&engine, a);
    engine.handle(InputEvent::DoubleClick { target: a_el });
    engine.run_deferred();
    engine.scene_mut().type_into_live_edit(a, "Ship Order");

    // The browser blurs the surface and moves focus before the click lands.
    let b_el = shape_el(&engine, b);
    engine.handle(InputEvent::Blur { shape: a });
    engine.scene_mut().focus(Some(b_el));
    click(&mut engine, b_el, Point::new(310.0, 10.0), 1000.0);
    engine.run_deferred();

    assert_eq!(engine.shapes().get(a).unwrap().label, "Ship Order");
    assert_eq!(engine.editing_shape(), None);
    assert_eq!(engine.scene().menu(), MenuState::Hidden);

    engine.tick(1150.0);
    assert_eq!(engine.mode(), Mode::ShapeSelected(b));
    assert!(engine.scene().is_selected_visual(b));
    assert!(!engine.scene().is_selected_visual(a));
    assert_eq!(
        engine.scene().menu(),
        MenuState::Shape {
            id: b,
            at: Point::new(420.0, 0.0),
        }
    );
}

#[test]
fn click_elsewhere_without_blur_still_commits() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);

    let a_el = shape_el(&engine, a);
    engine.handle(InputEvent::DoubleClick { target: a_el });
    engine.scene_mut().type_into_live_edit(a, "Ship Order");
    select_by_click(&mut engine, b, 1000.0);

    assert_eq!(engine.shapes().get(a).unwrap().label, "Ship Order");
    assert_eq!(engine.mode(), Mode::ShapeSelected(b));
}

#[test]
fn second_click_toggles_selection_off() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);

    select_by_click(&mut engine, a, 0.0);
    assert_eq!(engine.selected_shape(), Some(a));
    select_by_click(&mut engine, a, 1000.0);

    assert_eq!(engine.selected_shape(), None);
    assert!(!engine.scene().is_selected_visual(a));
    assert_eq!(engine.scene().menu(), MenuState::Hidden);
}

#[test]
fn escape_deselects_and_hides_menu() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    select_by_click(&mut engine, a, 0.0);
    assert!(engine.scene().menu().is_visible());

    assert!(key(&mut engine, "Escape"));
    assert_eq!(engine.mode(), Mode::Idle);
    assert_eq!(engine.scene().menu(), MenuState::Hidden);
}

#[test]
fn delete_with_nothing_selected_is_not_consumed() {
    let mut engine = engine();
    engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    assert!(!key(&mut engine, "Delete"));
    assert_eq!(engine.shapes().len(), 1);
}

// ─── Drag ───────────────────────────────────────────────────────────────

#[test]
fn dragging_replots_only_touching_connections() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let b = engine.add_shape(ShapeKind::Event, 300.0, 0.0, None);
    let c = engine.add_shape(ShapeKind::ReadModel, 0.0, 300.0, None);
    let d = engine.add_shape(ShapeKind::Gui, 300.0, 300.0, None);
    let ab = engine.connect(a, b).unwrap();
    let cd = engine.connect(c, d).unwrap();
    let cd_before = engine.scene().connection_visual(cd).unwrap().path;

    assert!(engine.handle(InputEvent::DragStart { shape: a }));
    assert_eq!(engine.dragging_shape(), Some(a));
    engine.handle(InputEvent::DragMove {
        shape: a,
        x: 300.0,
        y: 150.0,
    });

    let moved = engine.shapes().get(a).unwrap();
    assert_eq!((moved.x, moved.y), (300.0, 150.0));
    let ab_conn = engine.connections().get(ab).unwrap();
    assert_eq!(
        (ab_conn.source_side, ab_conn.target_side),
        (Side::Top, Side::Bottom)
    );
    let ab_path = engine.scene().connection_visual(ab).unwrap().path;
    assert_eq!(ab_path.start, Point::new(360.0, 150.0));
    assert_eq!(ab_path.end, Point::new(360.0, 80.0));
    assert_eq!(engine.scene().connection_visual(cd).unwrap().path, cd_before);
    assert_eq!(
        engine.scene().shape_visual(a).unwrap().bounds.x,
        300.0
    );

    assert!(engine.handle(InputEvent::DragEnd { shape: a }));
    assert_eq!(engine.dragging_shape(), None);
}

#[test]
fn drag_move_without_drag_start_is_ignored() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);

    assert!(!engine.handle(InputEvent::DragMove {
        shape: a,
        x: 200.0,
        y: 200.0,
    }));

    let shape = engine.shapes().get(a).unwrap();
    assert_eq!((shape.x, shape.y), (0.0, 0.0));
    assert_eq!(engine.dragging_shape(), None);
}

#[test]
fn drag_start_commits_edit_and_hides_menus() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let a_el = shape_el(&engine, a);
    engine.handle(InputEvent::DoubleClick { target: a_el });
    engine.scene_mut().type_into_live_edit(a, "Register");

    engine.handle(InputEvent::DragStart { shape: a });

    assert_eq!(engine.shapes().get(a).unwrap().label, "Register");
    assert_eq!(engine.mode(), Mode::ShapeSelected(a));
    assert_eq!(engine.scene().menu(), MenuState::Hidden);
}

// ─── Viewport ───────────────────────────────────────────────────────────

#[test]
fn space_drag_pans_incrementally() {
    let mut engine = engine();
    let canvas = engine.scene().canvas_element();

    assert!(key(&mut engine, " "));
    assert_eq!(engine.scene().cursor(), Cursor::Grab);

    assert!(engine.handle(InputEvent::PointerDown {
        x: 10.0,
        y: 10.0,
        button: PointerButton::Primary,
        target: canvas,
    }));
    assert_eq!(engine.mode(), Mode::Panning);
    assert_eq!(engine.scene().cursor(), Cursor::Grabbing);

    engine.handle(InputEvent::PointerMove { x: 30.0, y: 40.0 });
    engine.handle(InputEvent::PointerMove { x: 40.0, y: 40.0 });
    let viewport = engine.scene().viewport();
    assert_eq!((viewport.x, viewport.y), (-30.0, -30.0));

    // Still held: back to the open hand.
    engine.handle(InputEvent::PointerUp { x: 40.0, y: 40.0 });
    assert_eq!(engine.mode(), Mode::Idle);
    assert_eq!(engine.scene().cursor(), Cursor::Grab);

    engine.handle(InputEvent::key_up(" "));
    assert_eq!(engine.scene().cursor(), Cursor::Default);
    assert!(!engine.is_pan_armed());
}

#[test]
fn middle_button_pans_and_divides_by_zoom() {
    let mut engine = engine();
    engine.scene_mut().set_zoom_factor(2.0);
    let canvas = engine.scene().canvas_element();

    engine.handle(InputEvent::PointerDown {
        x: 0.0,
        y: 0.0,
        button: PointerButton::Middle,
        target: canvas,
    });
    engine.handle(InputEvent::PointerMove { x: 20.0, y: -10.0 });
    engine.handle(InputEvent::PointerUp { x: 20.0, y: -10.0 });

    let viewport = engine.scene().viewport();
    assert_eq!((viewport.x, viewport.y), (-10.0, 5.0));
    assert_eq!(engine.scene().cursor(), Cursor::Default);
}

#[test]
fn pointer_down_on_shape_never_pans() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    key(&mut engine, " ");
    let a_el = shape_el(&engine, a);

    assert!(!engine.handle(InputEvent::PointerDown {
        x: 10.0,
        y: 10.0,
        button: PointerButton::Middle,
        target: a_el,
    }));
    assert_ne!(engine.mode(), Mode::Panning);
}

#[test]
fn zoom_is_clamped_and_centered() {
    let mut engine = engine();

    engine.menu_action(MenuAction::ZoomIn);
    assert!((engine.scene().zoom_factor() - 1.2).abs() < 1e-5);
    let center = engine.scene().viewport().center();
    assert!((center.x - 400.0).abs() < 1e-3);
    assert!((center.y - 300.0).abs() < 1e-3);

    for _ in 0..20 {
        engine.menu_action(MenuAction::ZoomIn);
    }
    assert_eq!(engine.scene().zoom_factor(), 3.0);

    for _ in 0..40 {
        engine.handle(InputEvent::key_down(
            "-",
            Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        ));
    }
    assert_eq!(engine.scene().zoom_factor(), 0.2);

    engine.menu_action(MenuAction::ResetView);
    assert_eq!(engine.scene().zoom_factor(), 1.0);
    let viewport = engine.scene().viewport();
    assert_eq!(
        (viewport.x, viewport.y, viewport.width, viewport.height),
        (0.0, 0.0, 800.0, 600.0)
    );
}

#[test]
fn inverted_zoom_range_does_not_abort() {
    let config = EditorConfig {
        zoom_max: 0.1,
        ..EditorConfig::default()
    };
    let mut engine = InteractionEngine::new(RetainedScene::new(800.0, 600.0), config);

    engine.menu_action(MenuAction::ZoomIn);

    let zoom = engine.scene().zoom_factor();
    assert!((0.1..=0.2).contains(&zoom));
}

#[test]
fn zoom_commits_edit_and_deselects() {
    let mut engine = engine();
    let a = engine.add_shape(ShapeKind::Command, 0.0, 0.0, None);
    let a_el = shape_el(&engine, a);
    engine.handle(InputEvent::DoubleClick { target: a_el });
    engine.scene_mut().type_into_live_edit(a, "Zoomed");

    engine.menu_action(MenuAction::ZoomOut);

    assert_eq!(engine.shapes().get(a).unwrap().label, "Zoomed");
    assert_eq!(engine.mode(), Mode::Idle);
}
