//! MemeForge Web
//!
//! Browser host for the compositor: binds it to a `<canvas>`, forwards mouse
//! and touch events, fetches backgrounds and blits repainted frames on
//! animation frames.

mod bridge;

pub use bridge::{MouseKind, SnapshotQueue, element_rect, mouse_input, touch_input};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{MemeCanvas, start};
