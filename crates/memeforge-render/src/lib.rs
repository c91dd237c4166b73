//! MemeForge Render Library
//!
//! CPU compositing for the MemeForge caption editor: decoded backgrounds,
//! glyph rasterization, the per-frame display list, the pixmap surface and
//! PNG export. [`Compositor`] ties these to the interaction state in
//! `memeforge-core`.

mod compositor;
mod export;
mod fonts;
mod frame;
mod loader;
mod mask;
mod raster;
mod surface;

pub use compositor::{Compositor, LayersCallback, PointerResponse};
pub use export::{ExportError, demultiplied_rgba, encode_png};
pub use fonts::{FontBook, LineRaster};
pub use frame::{DrawOp, Frame, TextOp, TextPass, build_frame, surface_size_for};
pub use loader::{BoxFuture, FsFetcher, ImageFetcher, LoadError, LoadOutcome, load_image};
pub use mask::Mask;
pub use raster::RasterImage;
pub use surface::{PixmapSurface, RenderError, RenderResult, RenderStats};
