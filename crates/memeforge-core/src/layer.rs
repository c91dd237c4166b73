//! Text layers and the copy-on-write layer collection.

use crate::color;
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Unique, render-stable identifier of a text layer.
pub type LayerId = u64;

/// One text overlay positioned on the surface.
///
/// `x` is the horizontal center of the text, `y` the top of the first line,
/// both in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub id: LayerId,
    /// Text content, lines separated by `\n`.
    pub text: String,
    /// Font family name.
    pub font: String,
    /// Fill color as a hex string.
    pub color: String,
    /// Font size in surface pixels.
    pub size: f64,
    pub x: f64,
    pub y: f64,
}

impl TextLayer {
    /// Default font family.
    pub const DEFAULT_FONT: &'static str = "Impact";
    /// Default fill color.
    pub const DEFAULT_COLOR: &'static str = "#FFFFFF";
    /// Default font size.
    pub const DEFAULT_SIZE: f64 = 32.0;

    /// Create a layer with default style at the origin.
    pub fn new(id: LayerId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            font: Self::DEFAULT_FONT.to_string(),
            color: Self::DEFAULT_COLOR.to_string(),
            size: Self::DEFAULT_SIZE,
            x: 0.0,
            y: 0.0,
        }
    }

    /// Set the anchor position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the font size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Set the font family.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Set the fill color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Anchor point (center of the first line, top edge).
    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// True for empty or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether the layer has finite, positive geometry.
    pub fn has_valid_geometry(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.size.is_finite() && self.size > 0.0
    }

    /// Whether the layer takes part in painting and hit-testing.
    pub fn is_interactive(&self) -> bool {
        !self.is_blank() && self.has_valid_geometry()
    }

    /// Lines of text, split on explicit line breaks.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    /// Number of lines (an empty string is one line).
    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// Length of the longest line in UTF-16 code units, the unit browsers
    /// report for string length. Lines are measured before `\r` is stripped.
    pub fn longest_line_len(&self) -> usize {
        self.text
            .split('\n')
            .map(|line| line.encode_utf16().count())
            .max()
            .unwrap_or(0)
    }

    /// Vertical distance between consecutive line tops.
    pub fn line_height(&self, factor: f64) -> f64 {
        self.size * factor
    }

    /// Fill color, falling back to white for unparsable values.
    pub fn fill_color(&self) -> Color {
        color::parse_hex(&self.color).unwrap_or_else(|| {
            log::debug!("Layer {} has invalid color {:?}, using white", self.id, self.color);
            Color::WHITE
        })
    }

    /// Outline color derived from the fill.
    pub fn stroke_color(&self) -> Color {
        color::stroke_for(self.fill_color())
    }

    /// Outline width in surface pixels.
    pub fn stroke_width(&self) -> f64 {
        (self.size / 20.0).max(1.0)
    }
}

/// An immutable, ordered snapshot of text layers.
///
/// Order is paint order (later = on top). Every mutation produces a new
/// snapshot; clones share storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TextLayer>", into = "Vec<TextLayer>")]
pub struct Layers(Arc<[TextLayer]>);

impl Layers {
    /// Create a snapshot from a list of layers.
    pub fn new(layers: Vec<TextLayer>) -> Self {
        Self(layers.into())
    }

    /// Get a layer by id.
    pub fn get(&self, id: LayerId) -> Option<&TextLayer> {
        self.0.iter().find(|layer| layer.id == id)
    }

    /// Whether a layer with this id exists.
    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Whether both snapshots share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// New snapshot with `f` applied to the layer `id`.
    ///
    /// Returns `None` if no such layer exists.
    pub fn map_layer(&self, id: LayerId, f: impl FnOnce(&mut TextLayer)) -> Option<Self> {
        let index = self.0.iter().position(|layer| layer.id == id)?;
        let mut next = self.0.to_vec();
        f(&mut next[index]);
        Some(Self::new(next))
    }

    /// New snapshot with layer `id` moved to `position`.
    pub fn with_position(&self, id: LayerId, position: Point) -> Option<Self> {
        self.map_layer(id, |layer| {
            layer.x = position.x;
            layer.y = position.y;
        })
    }

    /// New snapshot with `layer` appended on top.
    pub fn pushed(&self, layer: TextLayer) -> Self {
        let mut next = self.0.to_vec();
        next.push(layer);
        Self::new(next)
    }

    /// New snapshot without layer `id`.
    pub fn without(&self, id: LayerId) -> Self {
        Self::new(self.0.iter().filter(|layer| layer.id != id).cloned().collect())
    }

    /// Largest id in the snapshot.
    pub fn max_id(&self) -> Option<LayerId> {
        self.0.iter().map(|layer| layer.id).max()
    }
}

impl Deref for Layers {
    type Target = [TextLayer];

    fn deref(&self) -> &[TextLayer] {
        &self.0
    }
}

impl From<Vec<TextLayer>> for Layers {
    fn from(layers: Vec<TextLayer>) -> Self {
        Self::new(layers)
    }
}

impl From<Layers> for Vec<TextLayer> {
    fn from(layers: Layers) -> Self {
        layers.0.to_vec()
    }
}

impl FromIterator<TextLayer> for Layers {
    fn from_iter<I: IntoIterator<Item = TextLayer>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
