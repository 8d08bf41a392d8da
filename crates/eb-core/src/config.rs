//! Editor tuning knobs.

use crate::error::{EditorError, Result};
use serde::Deserialize;

/// Configuration for the interaction engine and the shape store.
///
/// Every field has a default, so hosts can pass a partial JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Window in which a second click turns into a double-click. Default: **150 ms**.
    pub click_debounce_ms: f64,

    /// Lower zoom clamp. Default: **0.2**.
    pub zoom_min: f32,

    /// Upper zoom clamp. Default: **3.0**.
    pub zoom_max: f32,

    /// Multiplicative factor applied by zoom-in (and divided by zoom-out). Default: **1.2**.
    pub zoom_step: f32,

    /// Offset applied on both axes per collision-avoidance retry. Default: **20**.
    pub placement_offset: f32,

    /// Retries before a colliding shape is placed anyway. Default: **10**.
    pub placement_attempts: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            click_debounce_ms: 150.0,
            zoom_min: 0.2,
            zoom_max: 3.0,
            zoom_step: 1.2,
            placement_offset: 20.0,
            placement_attempts: 10,
        }
    }
}

impl EditorConfig {
    /// Reject values the engine cannot work with. Partial JSON is merged
    /// with the defaults first, so a lone `zoom_max` can still invert the
    /// range.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.click_debounce_ms as f32,
            self.zoom_min,
            self.zoom_max,
            self.zoom_step,
            self.placement_offset,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(EditorError::InvalidConfig("non-finite value".into()));
        }
        if self.zoom_min <= 0.0 || self.zoom_min > self.zoom_max {
            return Err(EditorError::InvalidConfig(format!(
                "zoom range {}..{}",
                self.zoom_min, self.zoom_max
            )));
        }
        if self.zoom_step <= 0.0 {
            return Err(EditorError::InvalidConfig(format!(
                "zoom step {}",
                self.zoom_step
            )));
        }
        Ok(())
    }

    /// Clamp into the zoom range. Tolerates an inverted or NaN range.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        let lo = self.zoom_min.min(self.zoom_max);
        let hi = self.zoom_max.max(self.zoom_min);
        zoom.max(lo).min(hi)
    }
}
