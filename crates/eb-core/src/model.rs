//! Core data model for Event Board diagrams.
//!
//! A board holds typed, positioned shapes and directed connections between
//! them. Shapes own their geometry; connections only cache which side of
//! each endpoint they attach to (recomputed whenever an endpoint moves).

use crate::error::EditorError;
use crate::id::{ConnectionId, ShapeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A point in canvas or screen space (which one is stated by the API).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }
}

/// Axis-aligned box: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.x + self.width, self.y)
    }

    /// Strict AABB overlap. Boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Midpoint of one side of the box.
    pub fn anchor(&self, side: Side) -> Point {
        match side {
            Side::Top => Point::new(self.x + self.width / 2.0, self.y),
            Side::Right => Point::new(self.x + self.width, self.y + self.height / 2.0),
            Side::Bottom => Point::new(self.x + self.width / 2.0, self.y + self.height),
            Side::Left => Point::new(self.x, self.y + self.height / 2.0),
        }
    }
}

/// One of the four sides of a shape a connection can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    #[default]
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Outward unit normal, in canvas coordinates (y grows downward).
    pub fn normal(self) -> (f32, f32) {
        match self {
            Side::Top => (0.0, -1.0),
            Side::Right => (1.0, 0.0),
            Side::Bottom => (0.0, 1.0),
            Side::Left => (-1.0, 0.0),
        }
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// The closed set of shape kinds on an event-modeling board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Event,
    ExternalEvent,
    Command,
    ReadModel,
    Comment,
    Processor,
    Gui,
    Slice,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Event,
        ShapeKind::ExternalEvent,
        ShapeKind::Command,
        ShapeKind::ReadModel,
        ShapeKind::Comment,
        ShapeKind::Processor,
        ShapeKind::Gui,
        ShapeKind::Slice,
    ];

    /// Label used when a shape's label is empty.
    pub fn display_name(self) -> &'static str {
        match self {
            ShapeKind::Event => "Event",
            ShapeKind::ExternalEvent => "External Event",
            ShapeKind::Command => "Command",
            ShapeKind::ReadModel => "Read Model",
            ShapeKind::Comment => "Comment",
            ShapeKind::Processor => "Processor",
            ShapeKind::Gui => "GUI",
            ShapeKind::Slice => "Slice",
        }
    }

    /// Width and height assigned at creation.
    pub fn default_size(self) -> (f32, f32) {
        match self {
            ShapeKind::Slice => (320.0, 480.0),
            ShapeKind::Gui => (160.0, 100.0),
            ShapeKind::Comment => (140.0, 80.0),
            _ => (120.0, 80.0),
        }
    }

    /// Slices are background lanes: they never collide with anything.
    pub fn participates_in_collision(self) -> bool {
        !matches!(self, ShapeKind::Slice)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ShapeKind {
    type Err = EditorError;

    /// Accepts `ReadModel`, `read-model`, `read_model`, `Read Model`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "event" => Ok(ShapeKind::Event),
            "externalevent" => Ok(ShapeKind::ExternalEvent),
            "command" => Ok(ShapeKind::Command),
            "readmodel" => Ok(ShapeKind::ReadModel),
            "comment" => Ok(ShapeKind::Comment),
            "processor" => Ok(ShapeKind::Processor),
            "gui" => Ok(ShapeKind::Gui),
            "slice" => Ok(ShapeKind::Slice),
            _ => Err(EditorError::UnknownShapeKind(s.to_string())),
        }
    }
}

/// A positioned, typed node on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
}

impl Shape {
    /// Build a shape sized for its kind. An empty label falls back to the
    /// kind's display name.
    pub fn new(id: ShapeId, kind: ShapeKind, x: f32, y: f32, label: Option<&str>) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id,
            kind,
            x,
            y,
            width,
            height,
            label: label_or_default(kind, label.unwrap_or_default()),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }
}

/// Trim surrounding whitespace; fall back to the kind's name when nothing is left.
pub fn label_or_default(kind: ShapeKind, text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        kind.display_name().to_string()
    } else {
        trimmed.to_string()
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A directed edge between two distinct shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: ShapeId,
    pub target: ShapeId,
    /// Cached attachment sides; authoritative geometry is the shapes'.
    pub source_side: Side,
    pub target_side: Side,
}

impl Connection {
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.source == shape || self.target == shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_lenient() {
        assert_eq!("ReadModel".parse::<ShapeKind>(), Ok(ShapeKind::ReadModel));
        assert_eq!("read-model".parse::<ShapeKind>(), Ok(ShapeKind::ReadModel));
        assert_eq!("external_event".parse::<ShapeKind>(), Ok(ShapeKind::ExternalEvent));
        assert_eq!("GUI".parse::<ShapeKind>(), Ok(ShapeKind::Gui));
        assert_eq!(
            "widget".parse::<ShapeKind>(),
            Err(EditorError::UnknownShapeKind("widget".into()))
        );
    }

    #[test]
    fn every_kind_parses_its_display_name() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.display_name().parse::<ShapeKind>(), Ok(kind));
        }
    }

    #[test]
    fn slice_has_larger_footprint() {
        let (sw, sh) = ShapeKind::Slice.default_size();
        let (cw, ch) = ShapeKind::Command.default_size();
        assert!(sw > cw && sh > ch);
        assert!(!ShapeKind::Slice.participates_in_collision());
    }

    #[test]
    fn empty_label_falls_back_to_kind_name() {
        let s = Shape::new(ShapeId::intern("m1"), ShapeKind::Command, 0.0, 0.0, Some("   "));
        assert_eq!(s.label, "Command");
        assert_eq!(label_or_default(ShapeKind::Event, "  Order\nPlaced "), "Order\nPlaced");
    }

    #[test]
    fn edge_touching_boxes_do_not_overlap() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(10.0, 0.0, 10.0, 10.0);
        let c = Bounds::new(9.0, 9.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn anchors_are_side_midpoints() {
        let b = Bounds::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(b.anchor(Side::Top), Point::new(60.0, 20.0));
        assert_eq!(b.anchor(Side::Right), Point::new(110.0, 40.0));
        assert_eq!(b.anchor(Side::Bottom), Point::new(60.0, 60.0));
        assert_eq!(b.anchor(Side::Left), Point::new(10.0, 40.0));
    }
}
