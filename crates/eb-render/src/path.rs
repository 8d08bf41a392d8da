//! Connection curves.
//!
//! A connection is drawn as a cubic Bézier leaving each endpoint along the
//! outward normal of the side it attaches to.

use eb_core::geometry::ConnectionPath;
use eb_core::{Point, Side};
use kurbo::{BezPath, CubicBez, ParamCurveNearest, Vec2};

/// Maximum distance from an endpoint to its control point.
pub const CONTROL_REACH: f64 = 60.0;

const NEAREST_ACCURACY: f64 = 0.1;

pub fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(f64::from(p.x), f64::from(p.y))
}

fn outward(side: Side) -> Vec2 {
    let (x, y) = side.normal();
    Vec2::new(f64::from(x), f64::from(y))
}

pub fn connection_curve(path: &ConnectionPath) -> CubicBez {
    let start = to_kurbo(path.start);
    let end = to_kurbo(path.end);
    // Short connections get proportionally tighter bends.
    let reach = (start.distance(end) / 2.0).min(CONTROL_REACH);
    CubicBez::new(
        start,
        start + outward(path.start_side) * reach,
        end + outward(path.end_side) * reach,
        end,
    )
}

pub fn curve_to_path(curve: &CubicBez) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(curve.p0);
    path.curve_to(curve.p1, curve.p2, curve.p3);
    path
}

/// SVG path data (`M … C …`) for a connection.
pub fn svg_path_data(path: &ConnectionPath) -> String {
    curve_to_path(&connection_curve(path)).to_svg()
}

/// Distance from `p` (canvas space) to the drawn curve.
pub fn distance_to_curve(path: &ConnectionPath, p: Point) -> f64 {
    connection_curve(path)
        .nearest(to_kurbo(p), NEAREST_ACCURACY)
        .distance_sq
        .sqrt()
}
