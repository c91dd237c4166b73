//! PNG export of the composited surface.

use thiserror::Error;
use tiny_skia::Pixmap;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("Nothing to export: surface has not been painted")]
    Empty,
}

/// Straight-alpha RGBA bytes of a pixmap, row-major.
pub fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    rgba
}

/// Encode a pixmap as straight-alpha RGBA PNG.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let rgba = demultiplied_rgba(pixmap);

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
    }
    log::debug!("Encoded {}x{} PNG ({} bytes)", pixmap.width(), pixmap.height(), out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_decodes_back() {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(10, 200, 30, 255));

        let bytes = encode_png(&pixmap).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 200, 30, 255]);
    }

    #[test]
    fn test_demultiplied_rgba_layout() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));
        assert_eq!(demultiplied_rgba(&pixmap), vec![0, 0, 255, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn test_transparent_pixels_stay_transparent() {
        let pixmap = Pixmap::new(1, 1).unwrap();
        let bytes = encode_png(&pixmap).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    }
}
