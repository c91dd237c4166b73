//! 8-bit coverage masks: glyph placement, dilation, blur and compositing.

use peniko::Color;
use tiny_skia::{IntSize, Mask as ClipMask, Paint, Pixmap, Rect, Transform};

/// A grayscale coverage buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Mask {
    /// Create an empty (fully transparent) mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Coverage at `(x, y)`, zero outside the mask.
    pub fn get(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    /// Whether no pixel has coverage.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&c| c == 0)
    }

    /// Combine a `src_w × src_h` bitmap at `(x, y)`, keeping the maximum coverage.
    pub fn place(&mut self, src: &[u8], src_w: usize, src_h: usize, x: i64, y: i64) {
        for sy in 0..src_h {
            let dy = y + sy as i64;
            if dy < 0 || dy as usize >= self.height {
                continue;
            }
            for sx in 0..src_w {
                let dx = x + sx as i64;
                if dx < 0 || dx as usize >= self.width {
                    continue;
                }
                let Some(&value) = src.get(sy * src_w + sx) else {
                    continue;
                };
                let cell = &mut self.data[dy as usize * self.width + dx as usize];
                *cell = (*cell).max(value);
            }
        }
    }

    /// Grow coverage outward by `radius` pixels.
    ///
    /// A pixel's coverage is read as how far the outline reaches into it, so
    /// everything within `radius` of the outline is fully covered and only
    /// the outermost ring is anti-aliased.
    pub fn dilate(&self, radius: f32) -> Mask {
        if radius <= 0.0 {
            return self.clone();
        }
        let reach = (radius + 1.0).ceil() as i64;
        let mut kernel = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let distance = ((dx * dx + dy * dy) as f32).sqrt();
                if distance < radius + 1.0 {
                    kernel.push((dx, dy, distance));
                }
            }
        }

        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let mut best = 0.0f32;
                for &(dx, dy, distance) in &kernel {
                    let coverage = self.get(x + dx, y + dy);
                    if coverage == 0 {
                        continue;
                    }
                    let value = (radius + coverage as f32 / 255.0 - distance).clamp(0.0, 1.0);
                    if value > best {
                        best = value;
                    }
                }
                out.data[y as usize * self.width + x as usize] = (best * 255.0).round() as u8;
            }
        }
        out
    }

    /// Approximate a gaussian blur with three box-blur passes per axis.
    pub fn blur(&self, radius: usize) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let mut current = self.clone();
        for _ in 0..3 {
            current = current.box_blur_horizontal(radius).box_blur_vertical(radius);
        }
        current
    }

    fn box_blur_horizontal(&self, radius: usize) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        let window = (2 * radius + 1) as u32;
        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            for x in 0..self.width {
                let start = x.saturating_sub(radius);
                let end = (x + radius + 1).min(self.width);
                let sum: u32 = row[start..end].iter().map(|&v| v as u32).sum();
                out.data[y * self.width + x] = (sum / window) as u8;
            }
        }
        out
    }

    fn box_blur_vertical(&self, radius: usize) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        let window = (2 * radius + 1) as u32;
        for x in 0..self.width {
            for y in 0..self.height {
                let start = y.saturating_sub(radius);
                let end = (y + radius + 1).min(self.height);
                let sum: u32 = (start..end).map(|yy| self.data[yy * self.width + x] as u32).sum();
                out.data[y * self.width + x] = (sum / window) as u8;
            }
        }
        out
    }

    /// Paint `color` through this mask onto `pixmap` with its origin at `(x, y)`
    /// (source-over).
    pub fn composite(&self, pixmap: &mut Pixmap, x: i64, y: i64, color: Color) {
        let (pw, ph) = (pixmap.width() as i64, pixmap.height() as i64);
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + self.width as i64).min(pw);
        let bottom = (y + self.height as i64).min(ph);
        if left >= right || top >= bottom {
            return;
        }

        // tiny-skia clip masks cover the whole pixmap
        let Some(size) = IntSize::from_wh(pw as u32, ph as u32) else {
            return;
        };
        let mut coverage = vec![0u8; (pw * ph) as usize];
        for py in top..bottom {
            let row = (py - y) as usize * self.width;
            let src = &self.data[row + (left - x) as usize..row + (right - x) as usize];
            let start = (py * pw + left) as usize;
            coverage[start..start + src.len()].copy_from_slice(src);
        }
        let Some(clip) = ClipMask::from_vec(coverage, size) else {
            return;
        };
        let Some(rect) = Rect::from_ltrb(left as f32, top as f32, right as f32, bottom as f32) else {
            return;
        };

        let rgba = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
        pixmap.fill_rect(rect, &paint, Transform::identity(), Some(&clip));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(size: usize) -> Mask {
        let mut mask = Mask::new(size, size);
        mask.place(&[255], 1, 1, (size / 2) as i64, (size / 2) as i64);
        mask
    }

    #[test]
    fn test_place_clips_and_keeps_max() {
        let mut mask = Mask::new(3, 3);
        mask.place(&[10, 200, 30, 40], 2, 2, 2, 2);
        assert_eq!(mask.get(2, 2), 10);
        assert_eq!(mask.get(3, 2), 0);
        mask.place(&[5], 1, 1, 2, 2);
        assert_eq!(mask.get(2, 2), 10);
    }

    #[test]
    fn test_dilate_grows_coverage() {
        let mask = dot(9);
        let grown = mask.dilate(2.0);
        assert_eq!(grown.get(4, 4), 255);
        assert_eq!(grown.get(6, 4), 255);
        assert_eq!(grown.get(4, 2), 255);
        // sqrt(5) from the dot: only the outer ring is partial
        assert!(grown.get(6, 5) > 0 && grown.get(6, 5) < 255);
        assert_eq!(grown.get(7, 4), 0);
        assert_eq!(grown.get(8, 4), 0);
        assert_eq!(mask.dilate(0.0), mask);
    }

    #[test]
    fn test_dilate_reads_partial_coverage_as_outline_depth() {
        let mut solid_edge = Mask::new(6, 1);
        solid_edge.place(&[255, 255, 255], 3, 1, 0, 0);
        let grown = solid_edge.dilate(1.5);
        assert_eq!(grown.get(3, 0), 255);
        assert_eq!(grown.get(4, 0), 128);
        assert_eq!(grown.get(5, 0), 0);

        // The outline reaches a quarter into x = 2, so 1.5px beyond it
        // covers three quarters of x = 3
        let mut soft_edge = Mask::new(6, 1);
        soft_edge.place(&[255, 255, 64], 3, 1, 0, 0);
        let grown = soft_edge.dilate(1.5);
        assert_eq!(grown.get(2, 0), 255);
        assert!((190..=193).contains(&grown.get(3, 0)));
        assert_eq!(grown.get(4, 0), 0);
    }

    #[test]
    fn test_blur_spreads_and_softens() {
        let mask = dot(21).dilate(3.0);
        let blurred = mask.blur(2);
        assert!(blurred.get(10, 10) < 255);
        assert!(blurred.get(10, 10) > 0);
        assert!(blurred.get(10, 14) > 0);
        assert_eq!(mask.get(10, 14), 0);
    }

    #[test]
    fn test_composite_opaque_and_clipped() {
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        let mut mask = Mask::new(2, 2);
        mask.place(&[255, 255, 255, 255], 2, 2, 0, 0);
        mask.composite(&mut pixmap, 3, 3, Color::from_rgba8(255, 0, 0, 255));

        let p = pixmap.pixel(3, 3).unwrap();
        assert_eq!((p.red(), p.green(), p.blue(), p.alpha()), (255, 0, 0, 255));
        let untouched = pixmap.pixel(2, 2).unwrap();
        assert_eq!(untouched.alpha(), 0);
    }

    #[test]
    fn test_composite_half_alpha_over_white() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);
        let mut mask = Mask::new(1, 1);
        mask.place(&[255], 1, 1, 0, 0);
        mask.composite(&mut pixmap, 0, 0, Color::from_rgba8(0, 0, 0, 128));

        let p = pixmap.pixel(0, 0).unwrap();
        assert_eq!(p.alpha(), 255);
        assert!((126..=128).contains(&p.red()));
    }
}
