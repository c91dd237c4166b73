//! Unified pointer input for mouse and touch.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up,
    /// Pointer left the surface.
    Leave,
    /// The platform aborted the interaction.
    Cancel,
}

impl PointerEvent {
    /// Client position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position } | PointerEvent::Move { position } => Some(*position),
            PointerEvent::Up | PointerEvent::Leave | PointerEvent::Cancel => None,
        }
    }
}

/// Where a pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// A pointer event together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub event: PointerEvent,
    pub source: PointerSource,
}

impl PointerInput {
    /// Wrap a mouse event.
    pub fn mouse(event: PointerEvent) -> Self {
        Self {
            event,
            source: PointerSource::Mouse,
        }
    }

    /// Wrap a touch-derived event.
    pub fn touch(event: PointerEvent) -> Self {
        Self {
            event,
            source: PointerSource::Touch,
        }
    }

    /// Whether the host should suppress default gestures (scroll, zoom).
    pub fn suppress_default(&self) -> bool {
        self.source == PointerSource::Touch
    }
}

/// Touch sequence phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One active touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i32,
    pub position: Point,
}

/// A touch event with the touches still on the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    /// Create a touch event.
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }

    /// The primary (first) touch point.
    pub fn primary(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Translate to the equivalent pointer event.
    ///
    /// Start and move follow the primary touch and yield nothing without one.
    /// Lifting the last finger is treated as the pointer leaving the surface so
    /// no hover state lingers.
    pub fn to_pointer(&self) -> Option<PointerInput> {
        let event = match self.phase {
            TouchPhase::Start => PointerEvent::Down {
                position: self.primary()?.position,
            },
            TouchPhase::Move => PointerEvent::Move {
                position: self.primary()?.position,
            },
            TouchPhase::End => PointerEvent::Leave,
            TouchPhase::Cancel => PointerEvent::Cancel,
        };
        Some(PointerInput::touch(event))
    }
}

/// Cursor the host should show over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorStyle {
    #[default]
    Default,
    Move,
}

impl CursorStyle {
    /// CSS cursor keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            CursorStyle::Default => "default",
            CursorStyle::Move => "move",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(phase: TouchPhase, points: &[(f64, f64)]) -> TouchEvent {
        TouchEvent::new(
            phase,
            points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| TouchPoint {
                    id: i as i32,
                    position: Point::new(x, y),
                })
                .collect(),
        )
    }

    #[test]
    fn test_touch_start_uses_primary() {
        let input = touch(TouchPhase::Start, &[(10.0, 20.0), (99.0, 99.0)])
            .to_pointer()
            .unwrap();
        assert_eq!(input.event, PointerEvent::Down { position: Point::new(10.0, 20.0) });
        assert!(input.suppress_default());
    }

    #[test]
    fn test_touch_move_without_points() {
        assert!(touch(TouchPhase::Move, &[]).to_pointer().is_none());
    }

    #[test]
    fn test_touch_end_and_cancel() {
        assert_eq!(touch(TouchPhase::End, &[]).to_pointer().unwrap().event, PointerEvent::Leave);
        assert_eq!(touch(TouchPhase::Cancel, &[]).to_pointer().unwrap().event, PointerEvent::Cancel);
    }

    #[test]
    fn test_mouse_does_not_suppress() {
        assert!(!PointerInput::mouse(PointerEvent::Up).suppress_default());
    }

    #[test]
    fn test_position() {
        let p = Point::new(1.0, 2.0);
        assert_eq!(PointerEvent::Move { position: p }.position(), Some(p));
        assert_eq!(PointerEvent::Leave.position(), None);
    }
}
