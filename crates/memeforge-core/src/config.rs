//! Compositor configuration.

use crate::color;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Placeholder drawn when an image cannot be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Width and height of the square placeholder.
    pub size: u32,
    pub background: String,
    pub label: String,
    pub label_color: String,
    pub label_size: f64,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            size: 500,
            background: "#f3f4f6".to_string(),
            label: "Image not found".to_string(),
            label_color: "#9ca3af".to_string(),
            label_size: 20.0,
        }
    }
}

/// Glow drawn around the hovered layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Glow color, hex with optional alpha.
    pub color: String,
    /// Blur radius in surface pixels.
    pub blur: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: "#007bff80".to_string(),
            blur: 10.0,
        }
    }
}

/// Tunables for the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Fixed surface width; height follows the image aspect ratio.
    pub surface_width: u32,
    /// Tallest surface allowed. Images whose surface would be taller are
    /// replaced by the placeholder.
    pub max_surface_height: u32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    /// Average glyph width as a multiple of the font size, used by hit-testing.
    pub char_width_factor: f64,
    /// Families tried after the layer's own font.
    pub font_fallbacks: Vec<String>,
    pub placeholder: PlaceholderConfig,
    pub highlight: HighlightConfig,
    /// Font files or directories to register at start-up.
    pub font_paths: Vec<PathBuf>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            surface_width: 500,
            max_surface_height: 4096,
            line_height_factor: 1.2,
            char_width_factor: 0.6,
            font_fallbacks: vec![
                "Impact".to_string(),
                "Arial".to_string(),
                "sans-serif".to_string(),
            ],
            placeholder: PlaceholderConfig::default(),
            highlight: HighlightConfig::default(),
            font_paths: Vec::new(),
        }
    }
}

impl CompositorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded compositor config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.surface_width == 0 {
            return Err(invalid("surface_width", "must be greater than zero"));
        }
        // The placeholder is drawn on a square surface
        if self.max_surface_height < self.surface_width {
            return Err(invalid("max_surface_height", "must be at least surface_width"));
        }
        if self.placeholder.size == 0 {
            return Err(invalid("placeholder.size", "must be greater than zero"));
        }
        positive("line_height_factor", self.line_height_factor)?;
        positive("char_width_factor", self.char_width_factor)?;
        positive("placeholder.label_size", self.placeholder.label_size)?;
        if !self.highlight.blur.is_finite() || self.highlight.blur < 0.0 {
            return Err(invalid("highlight.blur", "must be finite and non-negative"));
        }
        for (field, value) in [
            ("placeholder.background", &self.placeholder.background),
            ("placeholder.label_color", &self.placeholder.label_color),
            ("highlight.color", &self.highlight.color),
        ] {
            if color::parse_hex(value).is_none() {
                return Err(invalid(field, format!("{value:?} is not a hex color")));
            }
        }
        Ok(())
    }

    /// Placeholder background color.
    pub fn placeholder_background(&self) -> Color {
        color::parse_hex(&self.placeholder.background).unwrap_or(Color::WHITE)
    }

    /// Placeholder label color.
    pub fn placeholder_label_color(&self) -> Color {
        color::parse_hex(&self.placeholder.label_color).unwrap_or(Color::BLACK)
    }

    /// Hover glow color.
    pub fn highlight_color(&self) -> Color {
        color::parse_hex(&self.highlight.color).unwrap_or(Color::from_rgba8(0, 123, 255, 128))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and positive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = CompositorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.surface_width, 500);
        assert!((config.line_height_factor - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CompositorConfig::from_json(r#"{ "surface_width": 640 }"#).unwrap();
        assert_eq!(config.surface_width, 640);
        assert!((config.char_width_factor - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.placeholder.label, "Image not found");
    }

    #[test]
    fn test_rejects_zero_width() {
        let err = CompositorConfig::from_json(r#"{ "surface_width": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "surface_width", .. }));
    }

    #[test]
    fn test_rejects_surface_cap_below_width() {
        let err = CompositorConfig::from_json(r#"{ "surface_width": 640, "max_surface_height": 600 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_surface_height", .. }));
        assert!(CompositorConfig::from_json(r#"{ "max_surface_height": 500 }"#).is_ok());
    }

    #[test]
    fn test_rejects_bad_color() {
        let err = CompositorConfig::from_json(r#"{ "highlight": { "color": "blue" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "highlight.color", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            CompositorConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "font_fallbacks": ["Comic Sans MS"] }}"#).unwrap();

        let config = CompositorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.font_fallbacks, vec!["Comic Sans MS".to_string()]);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CompositorConfig::default();
        let back = CompositorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
