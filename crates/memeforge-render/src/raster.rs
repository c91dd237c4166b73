//! Decoded background images.

use crate::fonts::FontBook;
use crate::loader::LoadError;
use crate::surface::{RenderError, RenderResult};
use memeforge_core::CompositorConfig;
use tiny_skia::{ColorU8, Pixmap};

/// A decoded RGBA image ready to be blitted.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixmap: Pixmap,
}

impl RasterImage {
    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| LoadError::Decode(format!("unusable image size {width}x{height}")))?;

        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(Self { pixmap })
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    /// The neutral stand-in used when a background cannot be loaded.
    ///
    /// The label is drawn with the first font the book can resolve; without
    /// fonts the placeholder is a plain square.
    pub fn placeholder(config: &CompositorConfig, fonts: &FontBook) -> RenderResult<Self> {
        let settings = &config.placeholder;
        let size = settings.size;
        let mut pixmap = Pixmap::new(size, size).ok_or(RenderError::Allocation {
            width: size,
            height: size,
        })?;
        let background = config.placeholder_background().to_rgba8();
        pixmap.fill(tiny_skia::Color::from_rgba8(background.r, background.g, background.b, background.a));

        match fonts.resolve("sans-serif") {
            Some(font) => {
                let px = settings.label_size as f32;
                let center = size as f64 / 2.0;
                let ascent = font
                    .horizontal_line_metrics(px)
                    .map(|m| m.ascent as f64)
                    .unwrap_or(px as f64 * 0.8);
                // The label's baseline sits on the vertical center
                if let Some(line) = FontBook::rasterize_line(font, &settings.label, px, center, center - ascent, 0) {
                    line.mask
                        .composite(&mut pixmap, line.x, line.y, config.placeholder_label_color());
                }
            }
            None => log::warn!("No font registered, placeholder drawn without its label"),
        }
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::test_book;

    fn encode(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(rgba).unwrap();
        }
        out
    }

    #[test]
    fn test_decode_png_premultiplies() {
        let bytes = encode(2, 1, &[255, 0, 0, 255, 255, 255, 255, 128]);
        let image = RasterImage::decode(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (2, 1));

        let opaque = image.pixmap().pixel(0, 0).unwrap();
        assert_eq!((opaque.red(), opaque.alpha()), (255, 255));
        let translucent = image.pixmap().pixel(1, 0).unwrap();
        assert_eq!(translucent.alpha(), 128);
        assert_eq!(translucent.red(), 128);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(RasterImage::decode(b"definitely not an image"), Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_placeholder_without_fonts() {
        let config = CompositorConfig::default();
        let image = RasterImage::placeholder(&config, &FontBook::default()).unwrap();
        assert_eq!((image.width(), image.height()), (500, 500));

        let pixel = image.pixmap().pixel(250, 250).unwrap();
        // #f3f4f6
        assert_eq!((pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()), (0xf3, 0xf4, 0xf6, 0xff));
    }

    #[test]
    fn test_placeholder_label_sits_on_center() {
        let config = CompositorConfig::default();
        let image = RasterImage::placeholder(&config, &test_book()).unwrap();

        let mut label = Vec::new();
        for y in 0..image.height() {
            for x in 0..image.width() {
                let pixel = image.pixmap().pixel(x, y).unwrap();
                if pixel.red() < 0xe0 {
                    label.push((x, y));
                }
            }
        }
        assert!(label.len() > 100, "{} label pixels", label.len());

        let (left, right) = label.iter().fold((u32::MAX, 0), |(l, r), &(x, _)| (l.min(x), r.max(x)));
        let (top, bottom) = label.iter().fold((u32::MAX, 0), |(t, b), &(_, y)| (t.min(y), b.max(y)));
        assert!(((left + right) as i64 - 500).abs() <= 6, "label spans x {left}..{right}");
        // Baseline on the vertical center; "g" descends a little below it
        assert!(top >= 230 && top < 250, "label spans y {top}..{bottom}");
        assert!(bottom > 250 && bottom <= 258, "label spans y {top}..{bottom}");
    }

    #[test]
    fn test_placeholder_zero_size_is_an_error() {
        let mut config = CompositorConfig::default();
        config.placeholder.size = 0;
        assert!(RasterImage::placeholder(&config, &FontBook::default()).is_err());
    }
}
