//! The canvas compositor: owns the surface, the background, the current layer
//! snapshot and the drag/hover state, and turns pointer input into layer
//! updates and repaints.

use crate::export::{ExportError, encode_png};
use crate::fonts::FontBook;
use crate::frame::{build_frame, surface_size_for};
use crate::loader::LoadOutcome;
use crate::raster::RasterImage;
use crate::surface::{PixmapSurface, RenderResult, RenderStats};
use kurbo::{Rect, Size};
use memeforge_core::{
    CompositorConfig, CursorStyle, DragState, FrameScheduler, HitMetrics, Interaction, InteractionOutcome, LayerId,
    Layers, LoadTicket, PointerEvent, PointerInput, TokenCounter, Viewport,
};

/// Callback receiving every layer snapshot produced by a drag.
pub type LayersCallback = Box<dyn FnMut(&Layers)>;

/// What the host should do after a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerResponse {
    /// Call `preventDefault` on the native event (touch scrolling).
    pub suppress_default: bool,
    pub cursor: CursorStyle,
    /// Request an animation frame.
    pub request_frame: bool,
}

/// Composites a background and text layers onto a pixel surface.
pub struct Compositor {
    config: CompositorConfig,
    fonts: FontBook,
    surface: PixmapSurface,
    background: Option<RasterImage>,
    /// Surface size for the current background.
    target: (u32, u32),
    layers: Layers,
    interaction: Interaction,
    scheduler: FrameScheduler,
    tokens: TokenCounter,
    current: Option<LoadTicket>,
    ready: bool,
    painted: u64,
    on_layers_change: Option<LayersCallback>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("target", &self.target)
            .field("layers", &self.layers.len())
            .field("drag", &self.interaction.drag())
            .field("ready", &self.ready)
            .field("painted", &self.painted)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Create a compositor with a square surface of the configured width.
    ///
    /// Fonts listed in the config are loaded eagerly; failures are logged.
    pub fn new(config: CompositorConfig) -> RenderResult<Self> {
        let mut fonts = FontBook::new(config.font_fallbacks.clone());
        for path in &config.font_paths {
            match fonts.load_path(path) {
                Ok(count) => log::info!("Loaded {} font(s) from {}", count, path.display()),
                Err(e) => log::warn!("Failed to load fonts from {}: {}", path.display(), e),
            }
        }
        Self::with_fonts(config, fonts)
    }

    /// Create a compositor with a prepared font book.
    pub fn with_fonts(config: CompositorConfig, fonts: FontBook) -> RenderResult<Self> {
        let width = config.surface_width;
        let surface = PixmapSurface::new(width, width)?;
        let metrics = HitMetrics::from(&config);
        Ok(Self {
            config,
            fonts,
            surface,
            background: None,
            target: (width, width),
            layers: Layers::default(),
            interaction: Interaction::new(metrics),
            scheduler: FrameScheduler::new(),
            tokens: TokenCounter::new(),
            current: None,
            ready: false,
            painted: 0,
            on_layers_change: None,
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Register a font and schedule a repaint. Returns whether the host must
    /// request a frame.
    pub fn register_font(&mut self, family: &str, data: &[u8]) -> RenderResult<bool> {
        self.fonts.register(family, data)?;
        Ok(self.request_repaint())
    }

    /// Switch to a new image source.
    ///
    /// Returns the ticket the host must load; results for earlier tickets are
    /// ignored. Until the first frame with the new background is painted the
    /// compositor is not ready and ignores pointer input.
    pub fn set_image_source(&mut self, source: impl Into<String>) -> LoadTicket {
        let ticket = LoadTicket {
            token: self.tokens.issue(),
            source: source.into(),
        };
        log::debug!("Image source changed (token {})", ticket.token.get());
        self.current = Some(ticket.clone());
        self.background = None;
        self.ready = false;
        self.interaction.reset();
        ticket
    }

    /// The most recent image source, if any.
    pub fn image_source(&self) -> Option<&str> {
        self.current.as_ref().map(|ticket| ticket.source.as_str())
    }

    /// Accept a finished load and schedule the first frame for it. Stale
    /// results are dropped and return false.
    ///
    /// A failed load, or an image whose surface would exceed
    /// `max_surface_height`, installs the placeholder and proceeds as if it
    /// had succeeded.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> bool {
        if !self.tokens.is_current(outcome.token) {
            log::debug!(
                "Discarding stale load of {:?} (token {})",
                outcome.source,
                outcome.token.get()
            );
            return false;
        }

        let width = self.config.surface_width;
        let image = match outcome.result {
            Ok(image) => {
                let (_, height) = surface_size_for(image.width(), image.height(), width);
                if height > self.config.max_surface_height {
                    log::warn!(
                        "Background {:?} is {}x{}; a {}px tall surface exceeds the {}px limit",
                        outcome.source,
                        image.width(),
                        image.height(),
                        height,
                        self.config.max_surface_height
                    );
                    self.placeholder()
                } else {
                    log::info!("Loaded background {}x{}", image.width(), image.height());
                    Some(image)
                }
            }
            Err(e) => {
                log::warn!("Failed to load background {:?}: {}", outcome.source, e);
                self.placeholder()
            }
        };

        self.target = match &image {
            Some(image) => surface_size_for(image.width(), image.height(), width),
            None => (width, width),
        };
        self.background = image;
        self.request_repaint();
        true
    }

    fn placeholder(&self) -> Option<RasterImage> {
        match RasterImage::placeholder(&self.config, &self.fonts) {
            Ok(placeholder) => Some(placeholder),
            Err(e) => {
                log::error!("Failed to create placeholder: {}", e);
                None
            }
        }
    }

    /// Replace the layer snapshot. Returns whether the host must request a frame.
    pub fn set_layers(&mut self, layers: Layers) -> bool {
        if layers.ptr_eq(&self.layers) {
            return false;
        }
        self.layers = layers;
        self.request_repaint()
    }

    /// Register the callback receiving snapshots produced by drags.
    pub fn on_layers_change(&mut self, callback: impl FnMut(&Layers) + 'static) {
        self.on_layers_change = Some(Box::new(callback));
    }

    /// Handle a pointer event in client coordinates. `element` is the
    /// displayed bounds of the surface in the same coordinate space.
    pub fn handle_pointer(&mut self, input: PointerInput, element: Rect) -> PointerResponse {
        let bounds = self.surface_size();
        let viewport = Viewport::new(element, bounds);
        let outcome = match input.event {
            PointerEvent::Down { position } | PointerEvent::Move { position } if self.ready => {
                match viewport.client_to_surface(position) {
                    Some(point) if matches!(input.event, PointerEvent::Down { .. }) => {
                        self.interaction.pointer_down(point, &self.layers)
                    }
                    Some(point) => self.interaction.pointer_move(point, &self.layers, bounds),
                    None => InteractionOutcome::Unchanged,
                }
            }
            PointerEvent::Down { .. } | PointerEvent::Move { .. } => InteractionOutcome::Unchanged,
            PointerEvent::Up | PointerEvent::Cancel => self.interaction.release(),
            PointerEvent::Leave => self.interaction.leave(),
        };

        let request_frame = match outcome {
            InteractionOutcome::Unchanged => false,
            InteractionOutcome::Moved(next) => {
                self.layers = next;
                if let Some(callback) = self.on_layers_change.as_mut() {
                    callback(&self.layers);
                }
                self.request_repaint()
            }
            InteractionOutcome::DragStarted(_)
            | InteractionOutcome::HoverChanged(_)
            | InteractionOutcome::Released(_) => self.request_repaint(),
        };

        PointerResponse {
            suppress_default: input.suppress_default(),
            cursor: self.interaction.cursor(),
            request_frame,
        }
    }

    /// Mark the surface dirty. Returns whether the host must request a frame.
    pub fn request_repaint(&mut self) -> bool {
        self.scheduler.request()
    }

    /// Run from the host's animation frame. Repaints at most once however many
    /// changes were requested since the last frame.
    pub fn animation_frame(&mut self) -> RenderResult<Option<RenderStats>> {
        if !self.scheduler.begin_frame() {
            return Ok(None);
        }
        self.repaint()
    }

    /// Repaint now. Does nothing until a background (or placeholder) is in place.
    pub fn repaint(&mut self) -> RenderResult<Option<RenderStats>> {
        let Some(background) = self.background.as_ref() else {
            return Ok(None);
        };
        let frame = build_frame(self.target, &self.layers, self.interaction.hovered(), &self.config);
        let stats = self.surface.render(&frame, background, &self.fonts)?;
        self.painted += 1;
        self.ready = true;
        log::trace!("Repainted frame {} ({} drawn, {} skipped)", self.painted, stats.drawn, stats.skipped);
        Ok(Some(stats))
    }

    /// Whether the current background has been painted and input is accepted.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn surface(&self) -> &PixmapSurface {
        &self.surface
    }

    /// Surface size for the current background.
    pub fn surface_size(&self) -> Size {
        Size::new(self.target.0 as f64, self.target.1 as f64)
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn drag(&self) -> DragState {
        self.interaction.drag()
    }

    pub fn hovered(&self) -> Option<LayerId> {
        self.interaction.hovered()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.interaction.cursor()
    }

    /// Number of repaints performed.
    pub fn frames_painted(&self) -> u64 {
        self.painted
    }

    /// Encode the current surface as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, ExportError> {
        if self.painted == 0 {
            return Err(ExportError::Empty);
        }
        encode_png(self.surface.pixmap())
    }
}
