//! Versioned owner of the current layer snapshot, plus editing operations.

use crate::layer::{LayerId, Layers, TextLayer};

/// Smallest font size an editor may set.
pub const MIN_FONT_SIZE: f64 = 8.0;
/// Largest font size an editor may set.
pub const MAX_FONT_SIZE: f64 = 64.0;
/// Step used by grow/shrink.
pub const FONT_SIZE_STEP: f64 = 2.0;

/// Vertical spacing between newly added layers.
const NEW_LAYER_SPACING: f64 = 60.0;
/// Top of the first newly added layer.
const NEW_LAYER_TOP: f64 = 100.0;

/// Font families offered by editors.
pub const POPULAR_FONTS: &[&str] = &[
    "Impact",
    "Arial",
    "Helvetica",
    "Times New Roman",
    "Georgia",
    "Verdana",
    "Comic Sans MS",
    "Trebuchet MS",
    "Arial Black",
    "Courier New",
];

/// Partial update of a layer's style or content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub text: Option<String>,
    pub font: Option<String>,
    pub color: Option<String>,
    pub size: Option<f64>,
}

impl LayerPatch {
    /// Patch that replaces the text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn apply(self, layer: &mut TextLayer) {
        if let Some(text) = self.text {
            layer.text = text;
        }
        if let Some(font) = self.font {
            layer.font = font;
        }
        if let Some(color) = self.color {
            layer.color = color;
        }
        if let Some(size) = self.size {
            layer.size = clamp_font_size(size);
        }
    }
}

/// Clamp a font size into the editable range.
pub fn clamp_font_size(size: f64) -> f64 {
    if size.is_finite() {
        size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    } else {
        TextLayer::DEFAULT_SIZE
    }
}

/// Holds the current layer snapshot.
///
/// Every change swaps in a whole new snapshot and bumps the version, so
/// readers only ever see complete collections.
#[derive(Debug, Clone)]
pub struct LayerStore {
    layers: Layers,
    version: u64,
    surface_width: f64,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new(500.0)
    }
}

impl LayerStore {
    /// Create a store holding the initial empty caption.
    pub fn new(surface_width: f64) -> Self {
        let initial = TextLayer::new(1, "").at(surface_width / 2.0, 50.0);
        Self {
            layers: Layers::new(vec![initial]),
            version: 0,
            surface_width,
        }
    }

    /// Create a store from existing layers.
    pub fn with_layers(layers: Layers, surface_width: f64) -> Self {
        Self {
            layers,
            version: 0,
            surface_width,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Layers {
        self.layers.clone()
    }

    /// Borrow the current snapshot.
    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    /// Monotonic change counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the whole collection. Returns the new version.
    pub fn replace(&mut self, layers: Layers) -> u64 {
        self.layers = layers;
        self.version += 1;
        self.version
    }

    /// Append a new default layer below the existing ones and return its id.
    pub fn add_layer(&mut self) -> LayerId {
        let id = self.layers.max_id().map_or(1, |max| max + 1);
        let y = NEW_LAYER_TOP + self.layers.len() as f64 * NEW_LAYER_SPACING;
        let layer = TextLayer::new(id, "").at(self.surface_width / 2.0, y);
        let next = self.layers.pushed(layer);
        self.replace(next);
        id
    }

    /// Apply a patch to layer `id`. Returns false if the layer is unknown.
    pub fn update(&mut self, id: LayerId, patch: LayerPatch) -> bool {
        match self.layers.map_layer(id, |layer| patch.apply(layer)) {
            Some(next) => {
                self.replace(next);
                true
            }
            None => false,
        }
    }

    /// Increase the font size by one step, up to the maximum.
    pub fn grow_font(&mut self, id: LayerId) -> bool {
        self.step_font(id, FONT_SIZE_STEP)
    }

    /// Decrease the font size by one step, down to the minimum.
    pub fn shrink_font(&mut self, id: LayerId) -> bool {
        self.step_font(id, -FONT_SIZE_STEP)
    }

    fn step_font(&mut self, id: LayerId, delta: f64) -> bool {
        let Some(layer) = self.layers.get(id) else {
            return false;
        };
        let size = clamp_font_size(layer.size + delta);
        if (size - layer.size).abs() < f64::EPSILON {
            return false;
        }
        self.update(
            id,
            LayerPatch {
                size: Some(size),
                ..LayerPatch::default()
            },
        )
    }

    /// Remove layer `id`. The last remaining layer is never removed.
    pub fn remove(&mut self, id: LayerId) -> bool {
        if self.layers.len() <= 1 || !self.layers.contains(id) {
            return false;
        }
        let next = self.layers.without(id);
        self.replace(next);
        true
    }
}
