//! Drag state machine for repositioning text layers.
//!
//! All positions here are surface coordinates; mapping from client space
//! happens before events reach the state machine.

use crate::hit::{HitMetrics, hit_test};
use crate::input::CursorStyle;
use crate::layer::{LayerId, Layers};
use kurbo::{Point, Size, Vec2};

/// Current drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A layer follows the pointer.
    Dragging {
        layer: LayerId,
        /// Pointer position minus the layer anchor at drag start.
        offset: Vec2,
    },
}

impl DragState {
    /// Id of the dragged layer, if any.
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { layer, .. } => Some(*layer),
        }
    }
}

/// What a pointer event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// Nothing observable changed.
    Unchanged,
    /// A drag started on this layer.
    DragStarted(LayerId),
    /// The dragged layer moved; the full replacement collection.
    Moved(Layers),
    /// The hovered layer changed.
    HoverChanged(Option<LayerId>),
    /// A drag ended.
    Released(LayerId),
}

/// Drag and hover state for one surface.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    drag: DragState,
    hovered: Option<LayerId>,
    metrics: HitMetrics,
}

impl Interaction {
    /// Create an idle interaction using the given hit-test metrics.
    pub fn new(metrics: HitMetrics) -> Self {
        Self {
            drag: DragState::Idle,
            hovered: None,
            metrics,
        }
    }

    /// Current drag state.
    pub fn drag(&self) -> DragState {
        self.drag
    }

    /// Whether a drag is active.
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Currently highlighted layer.
    pub fn hovered(&self) -> Option<LayerId> {
        self.hovered
    }

    /// Cursor to display.
    pub fn cursor(&self) -> CursorStyle {
        if self.is_dragging() || self.hovered.is_some() {
            CursorStyle::Move
        } else {
            CursorStyle::Default
        }
    }

    /// Pointer pressed at `point`.
    pub fn pointer_down(&mut self, point: Point, layers: &Layers) -> InteractionOutcome {
        if self.is_dragging() {
            return InteractionOutcome::Unchanged;
        }
        let Some(layer) = hit_test(layers, point, &self.metrics) else {
            return InteractionOutcome::Unchanged;
        };

        let offset = point - layer.anchor();
        self.drag = DragState::Dragging {
            layer: layer.id,
            offset,
        };
        self.hovered = Some(layer.id);
        log::debug!("Drag start on layer {} with offset ({:.1}, {:.1})", layer.id, offset.x, offset.y);
        InteractionOutcome::DragStarted(layer.id)
    }

    /// Pointer moved to `point` on a surface of size `bounds`.
    ///
    /// While dragging this repositions the dragged layer, clamped to the
    /// surface. Otherwise it updates the hover highlight.
    pub fn pointer_move(&mut self, point: Point, layers: &Layers, bounds: Size) -> InteractionOutcome {
        match self.drag {
            DragState::Dragging { layer, offset } => {
                let target = point - offset;
                let clamped = Point::new(
                    target.x.clamp(0.0, bounds.width.max(0.0)),
                    target.y.clamp(0.0, bounds.height.max(0.0)),
                );
                match layers.with_position(layer, clamped) {
                    Some(next) => InteractionOutcome::Moved(next),
                    None => {
                        log::debug!("Dragged layer {} disappeared, ending drag", layer);
                        self.drag = DragState::Idle;
                        self.hovered = None;
                        InteractionOutcome::Released(layer)
                    }
                }
            }
            DragState::Idle => {
                let hovered = hit_test(layers, point, &self.metrics).map(|layer| layer.id);
                if hovered == self.hovered {
                    InteractionOutcome::Unchanged
                } else {
                    self.hovered = hovered;
                    InteractionOutcome::HoverChanged(hovered)
                }
            }
        }
    }

    /// Pointer released or the interaction was cancelled.
    pub fn release(&mut self) -> InteractionOutcome {
        match std::mem::take(&mut self.drag) {
            DragState::Dragging { layer, .. } => {
                log::debug!("Drag end on layer {}", layer);
                InteractionOutcome::Released(layer)
            }
            DragState::Idle => InteractionOutcome::Unchanged,
        }
    }

    /// Pointer left the surface: end any drag and clear the highlight.
    pub fn leave(&mut self) -> InteractionOutcome {
        let released = self.release();
        if released != InteractionOutcome::Unchanged {
            self.hovered = None;
            return released;
        }
        match self.hovered.take() {
            Some(_) => InteractionOutcome::HoverChanged(None),
            None => InteractionOutcome::Unchanged,
        }
    }

    /// Forget hover and drag state (e.g. after the image changed).
    pub fn reset(&mut self) {
        self.drag = DragState::Idle;
        self.hovered = None;
    }
}
