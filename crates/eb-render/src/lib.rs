pub mod path;
pub mod scene;
pub mod svg;

pub use scene::{LiveEdit, MenuState, RetainedScene};
pub use svg::render_svg;
