//! Pixmap-backed drawing surface.

use crate::fonts::FontBook;
use crate::frame::{DrawOp, Frame, TextOp, TextPass};
use crate::raster::RasterImage;
use thiserror::Error;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

/// Smallest outward stroke reach in surface pixels.
const MIN_STROKE_SPREAD: f64 = 1.5;

/// Errors that can occur while painting.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No font available for {0:?}")]
    NoFont(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Cannot allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Counters for one repaint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Text operations that produced pixels.
    pub drawn: usize,
    /// Text operations skipped (no font, nothing to draw).
    pub skipped: usize,
}

/// The backing pixel surface.
#[derive(Debug, Clone)]
pub struct PixmapSurface {
    pixmap: Pixmap,
    allocations: u64,
}

impl PixmapSurface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })?;
        Ok(Self { pixmap, allocations: 1 })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Number of times the backing pixmap was allocated.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Resize if the dimensions differ. Returns whether a reallocation happened.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<bool> {
        if self.width() == width && self.height() == height {
            return Ok(false);
        }
        self.pixmap = Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })?;
        self.allocations += 1;
        log::debug!("Surface resized to {}x{}", width, height);
        Ok(true)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Paint a frame. The surface is resized to the frame first.
    ///
    /// Text failures are logged and skipped; only allocation failures abort.
    pub fn render(&mut self, frame: &Frame, background: &RasterImage, fonts: &FontBook) -> RenderResult<RenderStats> {
        self.resize(frame.width, frame.height)?;
        let mut stats = RenderStats::default();

        for op in &frame.ops {
            match op {
                DrawOp::Clear => self.pixmap.fill(tiny_skia::Color::TRANSPARENT),
                DrawOp::Background => self.draw_background(background),
                DrawOp::Text(text) => match self.draw_text(text, fonts) {
                    Ok(true) => stats.drawn += 1,
                    Ok(false) => stats.skipped += 1,
                    Err(e) => {
                        log::warn!("Skipping text of layer {}: {}", text.layer, e);
                        stats.skipped += 1;
                    }
                },
            }
        }
        Ok(stats)
    }

    fn draw_background(&mut self, image: &RasterImage) {
        let source = image.pixmap();
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let sx = self.width() as f32 / source.width() as f32;
        let sy = self.height() as f32 / source.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, Transform::from_scale(sx, sy), None);
    }

    fn draw_text(&mut self, op: &TextOp, fonts: &FontBook) -> RenderResult<bool> {
        let font = fonts.resolve(&op.font).ok_or_else(|| RenderError::NoFont(op.font.clone()))?;
        let (spread, blur) = match op.pass {
            TextPass::Fill => (0.0, 0),
            // Canvas strokes straddle the outline, so half the width lands outside
            TextPass::Stroke { width } => ((width / 2.0).max(MIN_STROKE_SPREAD), 0),
            TextPass::Glow { radius } => (op.size / 20.0, radius.max(0.0).round() as usize),
        };
        // Three box passes spread the blur by up to three radii
        let pad = spread.ceil() as usize + 3 * blur + 1;
        let Some(raster) = FontBook::rasterize_line(font, &op.line, op.size as f32, op.center_x, op.top, pad) else {
            return Ok(false);
        };

        let mut mask = raster.mask;
        if spread > 0.0 {
            mask = mask.dilate(spread as f32);
        }
        if blur > 0 {
            mask = mask.blur(blur);
        }
        mask.composite(&mut self.pixmap, raster.x, raster.y, op.color);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::test_book;
    use crate::frame::build_frame;
    use memeforge_core::{CompositorConfig, TextLayer};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RasterImage {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
        RasterImage::from_pixmap(pixmap)
    }

    #[test]
    fn test_resize_only_when_dimensions_change() {
        let mut surface = PixmapSurface::new(500, 500).unwrap();
        assert!(!surface.resize(500, 500).unwrap());
        assert_eq!(surface.allocations(), 1);
        assert!(surface.resize(500, 250).unwrap());
        assert_eq!((surface.width(), surface.height()), (500, 250));
        assert_eq!(surface.allocations(), 2);
    }

    #[test]
    fn test_zero_sized_surface_is_an_error() {
        assert!(matches!(PixmapSurface::new(0, 10), Err(RenderError::Allocation { .. })));
    }

    #[test]
    fn test_background_stretched_to_fill() {
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        let frame = build_frame((40, 20), &[], None, &CompositorConfig::default());
        let stats = surface.render(&frame, &solid(4, 4, [200, 10, 10, 255]), &FontBook::default()).unwrap();

        assert_eq!(stats, RenderStats::default());
        assert_eq!((surface.width(), surface.height()), (40, 20));
        for (x, y) in [(0, 0), (39, 0), (0, 19), (39, 19), (20, 10)] {
            let [r, g, b, a] = surface.pixel(x, y).unwrap();
            assert_eq!(a, 255, "pixel ({x}, {y})");
            assert!(r.abs_diff(200) <= 2 && g.abs_diff(10) <= 2 && b.abs_diff(10) <= 2, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_text_without_fonts_is_skipped() {
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let layers = vec![TextLayer::new(1, "hello").at(50.0, 20.0)];
        let frame = build_frame((100, 100), &layers, Some(1), &CompositorConfig::default());
        let stats = surface.render(&frame, &solid(1, 1, [0, 0, 255, 255]), &FontBook::default()).unwrap();

        // glow, stroke and fill all lack a font
        assert_eq!(stats, RenderStats { drawn: 0, skipped: 3 });
        let [r, _, b, a] = surface.pixel(50, 30).unwrap();
        assert_eq!((r, a), (0, 255));
        assert!(b >= 253);
    }

    #[test]
    fn test_white_text_gets_dark_outline() {
        let mut surface = PixmapSurface::new(500, 200).unwrap();
        let layers = vec![
            TextLayer::new(1, "TOP\nTEXT")
                .with_color("#FFFFFF")
                .with_size(32.0)
                .at(250.0, 50.0),
        ];
        let frame = build_frame((500, 200), &layers, None, &CompositorConfig::default());
        let stats = surface.render(&frame, &solid(1, 1, [0, 128, 0, 255]), &test_book()).unwrap();
        assert_eq!(stats, RenderStats { drawn: 4, skipped: 0 });

        let mut white = Vec::new();
        let mut black = Vec::new();
        for y in 0..200 {
            for x in 0..500 {
                let [r, g, b, _] = surface.pixel(x, y).unwrap();
                let sum = r as u32 + g as u32 + b as u32;
                if sum >= 750 {
                    white.push((x, y));
                }
                if sum <= 30 {
                    black.push((x, y));
                }
            }
        }
        assert!(white.len() > 100, "{} white pixels", white.len());
        assert!(black.len() > 50, "{} black pixels", black.len());
        // The outline hugs the text
        for &(x, y) in &black {
            assert!((200..300).contains(&x) && (50..130).contains(&y), "stray outline pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_glow_only_around_hovered_layer() {
        let layers = vec![
            TextLayer::new(1, "TOP").at(250.0, 40.0),
            TextLayer::new(2, "BOTTOM").at(250.0, 200.0),
        ];
        let config = CompositorConfig::default();
        let background = solid(1, 1, [40, 40, 40, 255]);
        let fonts = test_book();

        let mut plain = PixmapSurface::new(500, 300).unwrap();
        plain.render(&build_frame((500, 300), &layers, None, &config), &background, &fonts).unwrap();
        let mut hovered = PixmapSurface::new(500, 300).unwrap();
        let stats = hovered
            .render(&build_frame((500, 300), &layers, Some(1), &config), &background, &fonts)
            .unwrap();
        assert_eq!(stats, RenderStats { drawn: 5, skipped: 0 });

        let mut glowing_rows = Vec::new();
        for y in 0..300 {
            for x in 0..500 {
                if plain.pixel(x, y) != hovered.pixel(x, y) {
                    glowing_rows.push(y);
                }
            }
        }
        assert!(!glowing_rows.is_empty());
        // Layer 2's text starts at y = 200; its surroundings are untouched
        assert!(glowing_rows.iter().all(|&y| y < 150), "glow reached row {:?}", glowing_rows.iter().max());

        // The glow is blue-tinted next to the text
        let tinted = (0..300)
            .flat_map(|y| (0..500).map(move |x| (x, y)))
            .filter_map(|(x, y)| hovered.pixel(x, y))
            .filter(|&[r, _, b, _]| b as u16 > r as u16 + 10)
            .count();
        assert!(tinted > 50, "{tinted} tinted pixels");
    }

    #[test]
    fn test_clear_resets_previous_frame() {
        let mut surface = PixmapSurface::new(8, 8).unwrap();
        let config = CompositorConfig::default();
        let frame = build_frame((8, 8), &[], None, &config);
        surface.render(&frame, &solid(1, 1, [255, 255, 255, 255]), &FontBook::default()).unwrap();
        surface.render(&frame, &solid(1, 1, [0, 0, 0, 0]), &FontBook::default()).unwrap();
        assert_eq!(surface.pixel(3, 3).map(|p| p[3]), Some(0));
    }
}
