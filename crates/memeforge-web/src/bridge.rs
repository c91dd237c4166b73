//! Conversions from raw DOM numbers to core input types.
//!
//! Kept free of `web-sys` so the mapping can be tested natively.

use kurbo::{Point, Rect};
use memeforge_core::{Layers, PointerEvent, PointerInput, TouchEvent, TouchPhase, TouchPoint};
use std::cell::RefCell;
use std::rc::Rc;

/// Element bounds from a `DOMRect`'s left/top/width/height.
pub fn element_rect(left: f64, top: f64, width: f64, height: f64) -> Rect {
    Rect::new(left, top, left + width, top + height)
}

/// Kind of a DOM mouse event the host forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Down,
    Move,
    Up,
    Leave,
}

/// Build a pointer input from a mouse event's client coordinates.
pub fn mouse_input(kind: MouseKind, client_x: f64, client_y: f64) -> PointerInput {
    let position = Point::new(client_x, client_y);
    let event = match kind {
        MouseKind::Down => PointerEvent::Down { position },
        MouseKind::Move => PointerEvent::Move { position },
        MouseKind::Up => PointerEvent::Up,
        MouseKind::Leave => PointerEvent::Leave,
    };
    PointerInput::mouse(event)
}

/// Build a pointer input from the active touches `(identifier, clientX, clientY)`.
pub fn touch_input(phase: TouchPhase, touches: &[(i32, f64, f64)]) -> Option<PointerInput> {
    let touches = touches
        .iter()
        .map(|&(id, x, y)| TouchPoint {
            id,
            position: Point::new(x, y),
        })
        .collect();
    TouchEvent::new(phase, touches).to_pointer()
}

/// Drag snapshots waiting to be handed to the host's listener.
///
/// The compositor pushes into the queue while it is borrowed; the host
/// flushes once the borrow is released. Neither the queue nor the listener
/// slot is borrowed while a listener runs, so it may call back into the host.
pub struct SnapshotQueue<L> {
    pending: Rc<RefCell<Vec<Layers>>>,
    listener: RefCell<Option<L>>,
}

impl<L: Clone> SnapshotQueue<L> {
    pub fn new() -> Self {
        Self {
            pending: Rc::new(RefCell::new(Vec::new())),
            listener: RefCell::new(None),
        }
    }

    /// A callback that queues every snapshot it receives.
    pub fn sink(&self) -> impl FnMut(&Layers) + 'static {
        let pending = Rc::clone(&self.pending);
        move |layers: &Layers| pending.borrow_mut().push(layers.clone())
    }

    pub fn set_listener(&self, listener: L) {
        *self.listener.borrow_mut() = Some(listener);
    }

    /// Number of snapshots not yet delivered.
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand queued snapshots to the listener in order. Without a listener
    /// they are dropped.
    pub fn flush(&self, mut deliver: impl FnMut(&L, &Layers)) {
        let snapshots: Vec<Layers> = self.pending.borrow_mut().drain(..).collect();
        let listener = self.listener.borrow().clone();
        let Some(listener) = listener else {
            return;
        };
        for layers in &snapshots {
            deliver(&listener, layers);
        }
    }
}

impl<L: Clone> Default for SnapshotQueue<L> {
    fn default() -> Self {
        Self::new()
    }
}
