//! Approximate layer bounds and hit-testing.
//!
//! Bounds here are a cheap estimate from character counts, not glyph
//! metrics. They only gate drag pickup and hover, never painting.

use crate::config::CompositorConfig;
use crate::layer::TextLayer;
use kurbo::{Point, Rect};

/// Factors used to estimate text extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitMetrics {
    /// Average glyph width as a multiple of the font size.
    pub char_width_factor: f64,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
}

impl Default for HitMetrics {
    fn default() -> Self {
        Self {
            char_width_factor: 0.6,
            line_height_factor: 1.2,
        }
    }
}

impl From<&CompositorConfig> for HitMetrics {
    fn from(config: &CompositorConfig) -> Self {
        Self {
            char_width_factor: config.char_width_factor,
            line_height_factor: config.line_height_factor,
        }
    }
}

/// Estimated bounds of a layer in surface coordinates.
///
/// Horizontally centered on `x`; from `y` down by one line height per line.
pub fn layer_bounds(layer: &TextLayer, metrics: &HitMetrics) -> Rect {
    let width = layer.size * metrics.char_width_factor * layer.longest_line_len() as f64;
    let height = layer.line_count() as f64 * layer.line_height(metrics.line_height_factor);
    Rect::new(
        layer.x - width / 2.0,
        layer.y,
        layer.x + width / 2.0,
        layer.y + height,
    )
}

/// Edge-inclusive containment.
fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Find the topmost interactive layer whose bounds contain `point`.
///
/// Later layers paint on top and therefore win ties. Blank layers and layers
/// with invalid geometry are never returned.
pub fn hit_test<'a>(layers: &'a [TextLayer], point: Point, metrics: &HitMetrics) -> Option<&'a TextLayer> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return None;
    }
    layers
        .iter()
        .rev()
        .filter(|layer| layer.is_interactive())
        .find(|layer| contains_inclusive(layer_bounds(layer, metrics), point))
}
