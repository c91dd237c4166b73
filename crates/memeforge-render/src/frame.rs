//! Per-frame display list.
//!
//! Building the list is pure; the surface turns it into pixels. Keeping the
//! two apart lets the paint order be checked without any fonts installed.

use memeforge_core::{CompositorConfig, LayerId, TextLayer};
use peniko::Color;

/// Which pass a text operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextPass {
    /// Soft highlight around the glyphs of the hovered layer.
    Glow { radius: f64 },
    /// Outline of the given width, centered on the glyph edge.
    Stroke { width: f64 },
    Fill,
}

/// One line of one layer in one pass.
#[derive(Debug, Clone)]
pub struct TextOp {
    pub layer: LayerId,
    pub line: String,
    /// Horizontal center in surface pixels.
    pub center_x: f64,
    /// Top of the line box in surface pixels.
    pub top: f64,
    pub font: String,
    pub size: f64,
    pub color: Color,
    pub pass: TextPass,
}

/// A drawing operation, executed in order.
#[derive(Debug, Clone)]
pub enum DrawOp {
    /// Clear the full surface to transparent.
    Clear,
    /// Blit the background stretched to the full surface.
    Background,
    Text(TextOp),
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp>,
}

impl Frame {
    /// Text operations in paint order.
    pub fn text_ops(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(text) => Some(text),
            _ => None,
        })
    }
}

/// Surface size for an image of the given natural size: fixed width, height
/// following the image's aspect ratio.
pub fn surface_size_for(natural_width: u32, natural_height: u32, surface_width: u32) -> (u32, u32) {
    if natural_width == 0 || natural_height == 0 {
        return (surface_width, surface_width);
    }
    let height = (surface_width as f64 * natural_height as f64 / natural_width as f64).floor() as u32;
    (surface_width, height.max(1))
}

/// Build the display list for a frame.
pub fn build_frame(
    size: (u32, u32),
    layers: &[TextLayer],
    hovered: Option<LayerId>,
    config: &CompositorConfig,
) -> Frame {
    let (width, height) = size;
    let mut ops = vec![DrawOp::Clear, DrawOp::Background];
    let glow = config.highlight_color();

    for layer in layers {
        if !layer.is_interactive() {
            continue;
        }
        let line_height = layer.line_height(config.line_height_factor);
        let fill = layer.fill_color();
        let stroke = layer.stroke_color();

        for (index, line) in layer.lines().enumerate() {
            let top = layer.y + index as f64 * line_height;
            if !(0.0..=height as f64).contains(&top) || line.trim().is_empty() {
                continue;
            }
            let op = |pass: TextPass, color: Color| {
                DrawOp::Text(TextOp {
                    layer: layer.id,
                    line: line.to_string(),
                    center_x: layer.x,
                    top,
                    font: layer.font.clone(),
                    size: layer.size,
                    color,
                    pass,
                })
            };
            if hovered == Some(layer.id) {
                ops.push(op(TextPass::Glow { radius: config.highlight.blur }, glow));
            }
            ops.push(op(TextPass::Stroke { width: layer.stroke_width() }, stroke));
            ops.push(op(TextPass::Fill, fill));
        }
    }

    Frame { width, height, ops }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(color: Color) -> (u8, u8, u8, u8) {
        let c = color.to_rgba8();
        (c.r, c.g, c.b, c.a)
    }

    fn passes(frame: &Frame) -> Vec<(LayerId, f64, TextPass)> {
        frame.text_ops().map(|op| (op.layer, op.top, op.pass)).collect()
    }

    #[test]
    fn test_surface_size_follows_aspect_ratio() {
        assert_eq!(surface_size_for(1000, 500, 500), (500, 250));
        assert_eq!(surface_size_for(300, 600, 500), (500, 1000));
        assert_eq!(surface_size_for(0, 10, 500), (500, 500));
        assert_eq!(surface_size_for(10_000, 1, 500), (500, 1));
    }

    #[test]
    fn test_two_line_layer_stroked_then_filled() {
        let config = CompositorConfig::default();
        let layer = TextLayer::new(1, "TOP\nTEXT").at(250.0, 50.0);
        let frame = build_frame((500, 500), &[layer], None, &config);

        assert!(matches!(frame.ops[0], DrawOp::Clear));
        assert!(matches!(frame.ops[1], DrawOp::Background));

        let ops: Vec<_> = frame.text_ops().collect();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].line, "TOP");
        assert_eq!(ops[0].top, 50.0);
        assert!(matches!(ops[0].pass, TextPass::Stroke { width } if width == 1.6));
        assert_eq!(ops[1].pass, TextPass::Fill);
        assert_eq!(ops[2].line, "TEXT");
        assert!((ops[2].top - 88.4).abs() < 1e-9);
        assert!(matches!(ops[2].pass, TextPass::Stroke { .. }));
        assert_eq!(ops[3].pass, TextPass::Fill);
        assert!(ops.iter().all(|op| op.center_x == 250.0));
    }

    #[test]
    fn test_stroke_and_fill_colors() {
        let config = CompositorConfig::default();
        let white = TextLayer::new(1, "A").at(10.0, 10.0);
        let red = TextLayer::new(2, "B").at(10.0, 10.0).with_color("#FF0000");
        let frame = build_frame((100, 100), &[white, red], None, &config);
        let colors: Vec<_> = frame.text_ops().map(|op| rgba(op.color)).collect();

        assert_eq!(
            colors,
            vec![(0, 0, 0, 255), (255, 255, 255, 255), (255, 255, 255, 255), (255, 0, 0, 255)]
        );
    }

    #[test]
    fn test_blank_layers_not_painted() {
        let config = CompositorConfig::default();
        let layers = vec![
            TextLayer::new(1, ""),
            TextLayer::new(2, "   "),
            TextLayer::new(3, "shown").at(100.0, 100.0),
        ];
        let frame = build_frame((500, 500), &layers, Some(1), &config);
        assert!(frame.text_ops().all(|op| op.layer == 3));
        assert_eq!(frame.text_ops().count(), 2);
    }

    #[test]
    fn test_lines_outside_surface_skipped() {
        let config = CompositorConfig::default();
        let layer = TextLayer::new(1, "a\nb\nc").at(50.0, 60.0).with_size(40.0);
        let frame = build_frame((100, 100), &[layer], None, &config);
        // Tops at 60, 108, 156: only the first fits a 100px tall surface
        let tops: Vec<_> = passes(&frame).iter().map(|(_, top, _)| *top).collect();
        assert_eq!(tops, vec![60.0, 60.0]);
    }

    #[test]
    fn test_glow_only_for_hovered_layer() {
        let config = CompositorConfig::default();
        let layers = vec![
            TextLayer::new(1, "one").at(100.0, 50.0),
            TextLayer::new(2, "two").at(100.0, 150.0),
        ];
        let frame = build_frame((500, 500), &layers, Some(2), &config);
        let order = passes(&frame);

        assert_eq!(order.len(), 5);
        assert!(order[..2].iter().all(|(id, _, pass)| *id == 1 && !matches!(pass, TextPass::Glow { .. })));
        assert_eq!(order[2], (2, 150.0, TextPass::Glow { radius: config.highlight.blur }));
        assert!(matches!(order[3].2, TextPass::Stroke { .. }));
        assert_eq!(order[4].2, TextPass::Fill);
        assert_eq!(
            frame.text_ops().nth(2).map(|op| rgba(op.color)),
            Some(rgba(config.highlight_color()))
        );
    }

    #[test]
    fn test_paint_order_follows_collection() {
        let config = CompositorConfig::default();
        let layers = vec![
            TextLayer::new(7, "under").at(100.0, 100.0),
            TextLayer::new(3, "over").at(100.0, 100.0),
        ];
        let frame = build_frame((500, 500), &layers, None, &config);
        let ids: Vec<_> = frame.text_ops().map(|op| op.layer).collect();
        assert_eq!(ids, vec![7, 7, 3, 3]);
    }
}
