//! Shape storage with best-effort collision avoidance.
//!
//! The store knows nothing about connections: callers must cascade
//! connection removal through `ConnectionStore` before removing a shape.

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::id::{IdGenerator, SequentialIds, ShapeId, draw_unique};
use crate::model::{Bounds, Shape, ShapeKind};
use std::collections::HashMap;

/// Outcome of `ShapeStore::create`.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub shape: Shape,
    /// `false` when every retry still collided and the shape was placed
    /// on top of another one.
    pub placed_without_overlap: bool,
}

pub struct ShapeStore {
    shapes: HashMap<ShapeId, Shape>,
    /// Insertion (paint) order.
    order: Vec<ShapeId>,
    ids: Box<dyn IdGenerator>,
    placement_offset: f32,
    placement_attempts: u32,
}

impl Default for ShapeStore {
    fn default() -> Self {
        Self::new(Box::new(SequentialIds::new()), &EditorConfig::default())
    }
}

impl ShapeStore {
    pub fn new(ids: Box<dyn IdGenerator>, config: &EditorConfig) -> Self {
        Self {
            shapes: HashMap::new(),
            order: Vec::new(),
            ids,
            placement_offset: config.placement_offset,
            placement_attempts: config.placement_attempts,
        }
    }

    /// Create a shape at `(x, y)`, nudging it by the placement offset while
    /// it overlaps a non-Slice shape. Never fails: after the last attempt
    /// the shape is placed anyway.
    pub fn create(&mut self, kind: ShapeKind, x: f32, y: f32, label: Option<&str>) -> Placement {
        let id = self.fresh_id();
        let mut shape = Shape::new(id, kind, x, y, label);

        let mut placed_without_overlap = !self.collides(kind, &shape.bounds());
        let mut attempt = 0;
        while !placed_without_overlap && attempt < self.placement_attempts {
            attempt += 1;
            shape.x += self.placement_offset;
            shape.y += self.placement_offset;
            placed_without_overlap = !self.collides(kind, &shape.bounds());
        }
        if !placed_without_overlap {
            log::warn!(
                "{id} placed overlapping after {} attempts at ({}, {})",
                self.placement_attempts,
                shape.x,
                shape.y
            );
        }

        self.order.push(id);
        self.shapes.insert(id, shape.clone());
        Placement {
            shape,
            placed_without_overlap,
        }
    }

    /// Remove a shape. Unknown IDs are a logged no-op.
    pub fn remove(&mut self, id: ShapeId) -> Result<Shape> {
        match self.shapes.remove(&id) {
            Some(shape) => {
                self.order.retain(|s| *s != id);
                Ok(shape)
            }
            None => {
                log::warn!("remove: {id} not found");
                Err(EditorError::ShapeNotFound(id))
            }
        }
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Unconditional position update; no collision policy on move.
    pub fn move_to(&mut self, id: ShapeId, x: f32, y: f32) -> Result<()> {
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(EditorError::ShapeNotFound(id))?;
        shape.x = x;
        shape.y = y;
        Ok(())
    }

    pub fn set_label(&mut self, id: ShapeId, label: &str) -> Result<()> {
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(EditorError::ShapeNotFound(id))?;
        shape.label = label.to_string();
        Ok(())
    }

    /// Whether a box of `kind` at `bounds` would overlap an existing shape.
    /// Slice shapes never collide, in either role.
    pub fn collides(&self, kind: ShapeKind, bounds: &Bounds) -> bool {
        if !kind.participates_in_collision() {
            return false;
        }
        self.shapes
            .values()
            .filter(|s| s.kind.participates_in_collision())
            .any(|s| s.bounds().overlaps(bounds))
    }

    /// Shapes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn fresh_id(&mut self) -> ShapeId {
        let shapes = &self.shapes;
        let raw = draw_unique(self.ids.as_mut(), "shape", |s| {
            shapes.contains_key(&ShapeId::intern(s))
        });
        ShapeId::intern(&raw)
    }
}
