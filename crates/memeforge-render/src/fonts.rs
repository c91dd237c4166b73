//! Font registry, text measurement and line rasterization.

use crate::mask::Mask;
use crate::surface::{RenderError, RenderResult};
use fontdue::{Font, FontSettings};
use std::path::Path;

/// Generic CSS families that resolve to the first registered font.
const GENERIC_FAMILIES: &[&str] = &["sans-serif", "serif", "monospace", "system-ui", "cursive", "fantasy"];

/// Fraction of the font size used as ascent when the font has no line metrics.
const FALLBACK_ASCENT: f32 = 0.8;

/// Normalize a family name for lookup.
fn family_key(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Whether a normalized key names a generic CSS family.
fn is_generic_family(key: &str) -> bool {
    GENERIC_FAMILIES.iter().any(|generic| family_key(generic) == key)
}

/// Registered fonts, keyed by family name.
#[derive(Default)]
pub struct FontBook {
    fonts: Vec<(String, Font)>,
    fallbacks: Vec<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families())
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}

impl FontBook {
    /// Create an empty book with the given fallback stack.
    pub fn new(fallbacks: Vec<String>) -> Self {
        Self {
            fonts: Vec::new(),
            fallbacks,
        }
    }

    /// Registered family names (normalized).
    pub fn families(&self) -> Vec<&str> {
        self.fonts.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether any font is registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Register font data under `family`, replacing an existing entry.
    pub fn register(&mut self, family: &str, data: &[u8]) -> RenderResult<()> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| RenderError::Font(format!("{family}: {e}")))?;
        let key = family_key(family);
        self.fonts.retain(|(name, _)| *name != key);
        log::debug!("Registered font family {:?}", key);
        self.fonts.push((key, font));
        Ok(())
    }

    /// Register a font file, or every `.ttf`/`.otf` file in a directory.
    ///
    /// The family name is the file stem. Returns the number of fonts added.
    pub fn load_path(&mut self, path: &Path) -> RenderResult<usize> {
        if path.is_dir() {
            let entries = std::fs::read_dir(path)
                .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
            let mut count = 0;
            for entry in entries.flatten() {
                let file = entry.path();
                if is_font_file(&file) {
                    match self.load_file(&file) {
                        Ok(()) => count += 1,
                        Err(e) => log::warn!("Skipping font {}: {}", file.display(), e),
                    }
                }
            }
            Ok(count)
        } else {
            self.load_file(path)?;
            Ok(1)
        }
    }

    fn load_file(&mut self, path: &Path) -> RenderResult<()> {
        let family = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| RenderError::Font(format!("{}: no usable file name", path.display())))?
            .to_string();
        let data = std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        self.register(&family, &data)
    }

    /// Resolve a (possibly comma-separated) family list against the book,
    /// then the fallback stack.
    pub fn resolve(&self, requested: &str) -> Option<&Font> {
        requested
            .split(',')
            .map(str::to_string)
            .chain(self.fallbacks.iter().cloned())
            .find_map(|name| self.lookup(&name))
    }

    fn lookup(&self, name: &str) -> Option<&Font> {
        let key = family_key(name);
        if key.is_empty() {
            return None;
        }
        if let Some((_, font)) = self.fonts.iter().find(|(family, _)| *family == key) {
            return Some(font);
        }
        if is_generic_family(&key) {
            return self.fonts.first().map(|(_, font)| font);
        }
        None
    }

    /// Advance width of `text` at `px`, including kerning.
    pub fn measure(font: &Font, text: &str, px: f32) -> f32 {
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            if let Some(prev) = previous {
                width += font.horizontal_kern(prev, ch, px).unwrap_or(0.0);
            }
            width += font.metrics(ch, px).advance_width;
            previous = Some(ch);
        }
        width
    }

    /// Rasterize one line of text, horizontally centered on `center_x` with the
    /// top of the em box at `top`.
    ///
    /// The mask gets `pad` pixels of empty border so it can be dilated or
    /// blurred without clipping.
    pub fn rasterize_line(font: &Font, text: &str, px: f32, center_x: f64, top: f64, pad: usize) -> Option<LineRaster> {
        let ascent = font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent)
            .unwrap_or(px * FALLBACK_ASCENT);

        struct Placed {
            x: f32,
            y: f32,
            width: usize,
            height: usize,
            bitmap: Vec<u8>,
        }

        let mut placed = Vec::new();
        let mut pen = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            if let Some(prev) = previous {
                pen += font.horizontal_kern(prev, ch, px).unwrap_or(0.0);
            }
            let (metrics, bitmap) = font.rasterize(ch, px);
            if metrics.width > 0 && metrics.height > 0 {
                placed.push(Placed {
                    x: pen + metrics.xmin as f32,
                    // Glyph bitmap top relative to the em-box top
                    y: ascent - (metrics.ymin as f32 + metrics.height as f32),
                    width: metrics.width,
                    height: metrics.height,
                    bitmap,
                });
            }
            pen += metrics.advance_width;
            previous = Some(ch);
        }
        if placed.is_empty() {
            return None;
        }

        let left = placed.iter().map(|g| g.x.floor()).fold(0.0f32, f32::min);
        let right = placed.iter().map(|g| g.x.round() + g.width as f32).fold(pen, f32::max);
        let upper = placed.iter().map(|g| g.y.floor()).fold(0.0f32, f32::min);
        let lower = placed.iter().map(|g| g.y.round() + g.height as f32).fold(px, f32::max);

        let width = (right - left).ceil() as usize + 2 * pad;
        let height = (lower - upper).ceil() as usize + 2 * pad;
        let mut mask = Mask::new(width, height);
        for glyph in &placed {
            let gx = (glyph.x - left).round() as i64 + pad as i64;
            let gy = (glyph.y - upper).round() as i64 + pad as i64;
            mask.place(&glyph.bitmap, glyph.width, glyph.height, gx, gy);
        }

        let text_left = center_x - pen as f64 / 2.0;
        Some(LineRaster {
            mask,
            x: (text_left + left as f64).round() as i64 - pad as i64,
            y: (top + upper as f64).round() as i64 - pad as i64,
            advance: pen,
        })
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
        .unwrap_or(false)
}

/// A rasterized line of text and where its mask goes on the surface.
#[derive(Debug, Clone)]
pub struct LineRaster {
    pub mask: Mask,
    /// Surface x of the mask's left edge.
    pub x: i64,
    /// Surface y of the mask's top edge.
    pub y: i64,
    /// Total advance width of the line.
    pub advance: f32,
}

/// DejaVu Sans, used by tests that need real glyphs.
#[cfg(test)]
pub(crate) const TEST_FONT: &[u8] = include_bytes!("../tests/fixtures/DejaVuSans.ttf");

/// A book holding only DejaVu Sans, with the default fallback stack.
#[cfg(test)]
pub(crate) fn test_book() -> FontBook {
    let fallbacks = memeforge_core::CompositorConfig::default().font_fallbacks;
    let mut book = FontBook::new(fallbacks);
    book.register("DejaVu Sans", TEST_FONT).unwrap();
    book
}
