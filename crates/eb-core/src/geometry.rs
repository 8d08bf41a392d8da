//! Anchor selection for connections.

use crate::model::{Bounds, Connection, Point, Shape, Side};
use serde::Serialize;

/// Pick the pair of side-midpoints (one per box) with the smallest
/// Euclidean distance. Ties keep the first pair in `Side::ALL` order.
pub fn closest_anchors(source: &Bounds, target: &Bounds) -> (Side, Side) {
    let mut best = (Side::Right, Side::Left);
    let mut best_dist = f32::INFINITY;
    for s in Side::ALL {
        let from = source.anchor(s);
        for t in Side::ALL {
            let d = from.distance_sq(target.anchor(t));
            if d < best_dist {
                best_dist = d;
                best = (s, t);
            }
        }
    }
    best
}

/// Side of `bounds` whose midpoint is nearest to `p`.
pub fn nearest_side(bounds: &Bounds, p: Point) -> Side {
    Side::ALL
        .into_iter()
        .min_by(|a, b| {
            let da = bounds.anchor(*a).distance_sq(p);
            let db = bounds.anchor(*b).distance_sq(p);
            da.total_cmp(&db)
        })
        .unwrap_or_default()
}

/// Endpoints of a connection, ready for a renderer to turn into a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectionPath {
    pub start: Point,
    pub start_side: Side,
    pub end: Point,
    pub end_side: Side,
}

impl ConnectionPath {
    pub fn new(connection: &Connection, source: &Shape, target: &Shape) -> Self {
        Self {
            start: source.bounds().anchor(connection.source_side),
            start_side: connection.source_side,
            end: target.bounds().anchor(connection.target_side),
            end_side: connection.target_side,
        }
    }
}
