//! MemeForge Core Library
//!
//! Platform-agnostic data model and interaction logic for the MemeForge
//! caption editor: text layers, coordinate mapping, hit-testing and dragging.

pub mod color;
pub mod config;
pub mod drag;
pub mod hit;
pub mod input;
pub mod layer;
pub mod schedule;
pub mod source;
pub mod store;
pub mod templates;
pub mod viewport;

pub use config::{CompositorConfig, ConfigError, ConfigResult, HighlightConfig, PlaceholderConfig};
pub use drag::{DragState, Interaction, InteractionOutcome};
pub use hit::{HitMetrics, hit_test, layer_bounds};
pub use input::{CursorStyle, PointerEvent, PointerInput, PointerSource, TouchEvent, TouchPhase, TouchPoint};
pub use layer::{LayerId, Layers, TextLayer};
pub use schedule::FrameScheduler;
pub use source::{ImageSource, LoadTicket, LoadToken, SourceError, TokenCounter};
pub use store::{FONT_SIZE_STEP, LayerPatch, LayerStore, MAX_FONT_SIZE, MIN_FONT_SIZE, POPULAR_FONTS};
pub use templates::{ImageSelection, Template, builtin_templates};
pub use viewport::Viewport;
