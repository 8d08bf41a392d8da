use crate::path::svg_path_data;
use crate::scene::{RetainedScene, ShapeVisual};
use eb_core::ShapeKind;
use eb_editor::scene::Scene;

const PADDING: f32 = 16.0;
const FONT_SIZE: f32 = 14.0;

/// Sticky-note colors of the event-modeling notation.
fn kind_fill(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Event => "#FFA94D",
        ShapeKind::ExternalEvent => "#FFD8A8",
        ShapeKind::Command => "#74C0FC",
        ShapeKind::ReadModel => "#8CE99A",
        ShapeKind::Comment => "#FFF3BF",
        ShapeKind::Processor => "#B197FC",
        ShapeKind::Gui => "#FFFFFF",
        ShapeKind::Slice => "none",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Export the retained scene as a standalone SVG document, cropped to the
/// shapes (or the container when the board is empty).
pub fn render_svg(scene: &RetainedScene) -> String {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    let mut found = false;
    for visual in scene.shape_visuals() {
        let b = visual.bounds;
        min_x = min_x.min(b.x);
        min_y = min_y.min(b.y);
        max_x = max_x.max(b.x + b.width);
        max_y = max_y.max(b.y + b.height);
        found = true;
    }
    if !found {
        let (w, h) = scene.container_size();
        (min_x, min_y, max_x, max_y) = (0.0, 0.0, w, h);
    }

    let width = max_x - min_x + PADDING * 2.0;
    let height = max_y - min_y + PADDING * 2.0;
    let offset_x = min_x - PADDING;
    let offset_y = min_y - PADDING;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str("<defs>\n");
    svg.push_str("  <marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\">\n");
    svg.push_str("    <path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"#495057\" />\n");
    svg.push_str("  </marker>\n");
    svg.push_str("</defs>\n");
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; }\n");
    svg.push_str("</style>\n");
    svg.push_str(&format!(
        "<g transform=\"translate({}, {})\">\n",
        -offset_x, -offset_y
    ));

    // Slices are lanes behind everything else.
    for visual in scene.shape_visuals().filter(|v| v.kind == ShapeKind::Slice) {
        render_shape(&mut svg, visual);
    }
    for connection in scene.connection_visuals() {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"#495057\" stroke-width=\"2\" marker-end=\"url(#arrow)\" data-id=\"{}\" />\n",
            svg_path_data(&connection.path),
            escape(connection.id.as_str())
        ));
    }
    for visual in scene.shape_visuals().filter(|v| v.kind != ShapeKind::Slice) {
        render_shape(&mut svg, visual);
    }
    if let Some((from, to)) = scene.draft() {
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#868E96\" stroke-width=\"2\" stroke-dasharray=\"6 4\" />\n",
            from.x, from.y, to.x, to.y
        ));
    }

    svg.push_str("</g>\n</svg>");
    svg
}

impl RetainedScene {
    pub fn to_svg(&self) -> String {
        render_svg(self)
    }
}

fn render_shape(out: &mut String, visual: &ShapeVisual) {
    let b = visual.bounds;
    let stroke = if visual.selected { "#1C7ED6" } else { "#495057" };
    let stroke_width = if visual.selected { 3.0 } else { 1.0 };
    let dash = if visual.kind == ShapeKind::Slice {
        " stroke-dasharray=\"8 6\""
    } else {
        ""
    };
    out.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"{} data-id=\"{}\" />\n",
        b.x,
        b.y,
        b.width,
        b.height,
        kind_fill(visual.kind),
        stroke,
        stroke_width,
        dash,
        escape(visual.id.as_str())
    ));

    // Slice titles sit at the top of the lane, everything else is centered.
    let (y, anchor_y) = if visual.kind == ShapeKind::Slice {
        (b.y + FONT_SIZE * 1.5, "auto")
    } else {
        (b.y + b.height / 2.0, "middle")
    };
    out.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"#212529\" text-anchor=\"middle\" dominant-baseline=\"{}\">{}</text>\n",
        b.x + b.width / 2.0,
        y,
        FONT_SIZE,
        anchor_y,
        escape(&visual.label)
    ));
}
