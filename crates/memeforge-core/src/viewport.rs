//! Mapping between displayed (client) coordinates and surface pixels.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Where the surface is displayed and how large it is underneath.
///
/// The element may be scaled by layout; pointer coordinates arrive in client
/// space and are converted to surface pixels before any hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Displayed element bounds in client coordinates.
    pub element: Rect,
    /// Surface resolution in pixels.
    pub surface: Size,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(element: Rect, surface: Size) -> Self {
        Self { element, surface }
    }

    /// A viewport displayed at 1:1 scale at the client origin.
    pub fn unscaled(surface: Size) -> Self {
        Self {
            element: Rect::from_origin_size(Point::ZERO, surface),
            surface,
        }
    }

    /// Surface pixels per client pixel on each axis.
    ///
    /// Returns `None` when the element or surface is degenerate.
    pub fn scale(&self) -> Option<Vec2> {
        let displayed = self.element.size();
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(displayed.width)
            || !usable(displayed.height)
            || !usable(self.surface.width)
            || !usable(self.surface.height)
        {
            return None;
        }
        Some(Vec2::new(
            self.surface.width / displayed.width,
            self.surface.height / displayed.height,
        ))
    }

    /// Convert a client point to surface coordinates.
    pub fn client_to_surface(&self, client: Point) -> Option<Point> {
        if !client.x.is_finite() || !client.y.is_finite() {
            return None;
        }
        let scale = self.scale()?;
        Some(Point::new(
            (client.x - self.element.x0) * scale.x,
            (client.y - self.element.y0) * scale.y,
        ))
    }

    /// Convert a surface point back to client coordinates.
    pub fn surface_to_client(&self, surface: Point) -> Option<Point> {
        let scale = self.scale()?;
        Some(Point::new(
            surface.x / scale.x + self.element.x0,
            surface.y / scale.y + self.element.y0,
        ))
    }
}
