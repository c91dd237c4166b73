//! WebAssembly entry point and the `<canvas>` binding.

use crate::bridge::{MouseKind, SnapshotQueue, element_rect, mouse_input, touch_input};
use memeforge_core::{CompositorConfig, ImageSource, Layers, PointerInput, TextLayer, TouchPhase};
use memeforge_render::{BoxFuture, Compositor, ImageFetcher, LoadError, demultiplied_rgba, load_image};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData, MouseEvent, Response, TouchEvent};

/// Initialize panic reporting and logging.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("MemeForge compositor loaded");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Fetches images with the browser's `fetch`.
struct WebFetcher;

impl WebFetcher {
    async fn fetch_url(url: &str) -> Result<Vec<u8>, LoadError> {
        let window = web_sys::window().ok_or_else(|| LoadError::Fetch("No window".to_string()))?;
        let response = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| LoadError::Fetch(format!("{e:?}")))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| LoadError::Fetch("Not a Response".to_string()))?;
        if !response.ok() {
            return Err(LoadError::Fetch(format!("HTTP {} for {}", response.status(), url)));
        }
        let promise = response.array_buffer().map_err(|e| LoadError::Fetch(format!("{e:?}")))?;
        let buffer = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(|e| LoadError::Fetch(format!("{e:?}")))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

impl ImageFetcher for WebFetcher {
    fn fetch<'a>(&'a self, source: &'a ImageSource) -> BoxFuture<'a, Result<Vec<u8>, LoadError>> {
        Box::pin(async move {
            match source {
                ImageSource::Data { bytes, .. } => Ok(bytes.clone()),
                ImageSource::Url(url) => Self::fetch_url(url).await,
                ImageSource::Path(path) => Self::fetch_url(&path.to_string_lossy()).await,
            }
        })
    }
}

struct Shared {
    compositor: RefCell<Compositor>,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    /// Snapshots produced by drags, delivered once the compositor is released.
    snapshots: SnapshotQueue<js_sys::Function>,
}

impl Shared {
    fn schedule_frame(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let shared = Rc::clone(self);
        let callback = Closure::once_into_js(move || shared.paint());
        if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {:?}", e);
        }
    }

    fn paint(&self) {
        let mut compositor = self.compositor.borrow_mut();
        match compositor.animation_frame() {
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(e) => {
                log::error!("Repaint failed: {}", e);
                return;
            }
        }

        let surface = compositor.surface();
        let (width, height) = (surface.width(), surface.height());
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        let rgba = demultiplied_rgba(surface.pixmap());
        let blit = ImageData::new_with_u8_clamped_array_and_sh(Clamped(rgba.as_slice()), width, height)
            .and_then(|data| self.context.put_image_data(&data, 0.0, 0.0));
        if let Err(e) = blit {
            log::error!("Blit failed: {:?}", e);
        }
    }

    fn dispatch(self: &Rc<Self>, input: PointerInput) -> bool {
        let bounds = self.canvas.get_bounding_client_rect();
        let element = element_rect(bounds.left(), bounds.top(), bounds.width(), bounds.height());
        let response = self.compositor.borrow_mut().handle_pointer(input, element);

        if let Err(e) = self.canvas.style().set_property("cursor", response.cursor.css_name()) {
            log::debug!("Cannot set cursor: {:?}", e);
        }
        if response.request_frame {
            self.schedule_frame();
        }
        self.flush_snapshots();
        response.suppress_default
    }

    fn flush_snapshots(&self) {
        self.snapshots.flush(|listener, layers| match serde_wasm_bindgen::to_value(layers) {
            Ok(value) => {
                if let Err(e) = listener.call1(&JsValue::NULL, &value) {
                    log::error!("Layer listener threw: {:?}", e);
                }
            }
            Err(e) => log::error!("Cannot serialize layers: {}", e),
        });
    }
}

/// A compositor bound to a `<canvas>` element.
#[wasm_bindgen]
pub struct MemeCanvas {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl MemeCanvas {
    /// Bind to `canvas`. `config` is an optional compositor config object.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: JsValue) -> Result<MemeCanvas, JsValue> {
        let config: CompositorConfig = if config.is_undefined() || config.is_null() {
            CompositorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        config.validate().map_err(js_error)?;

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;

        let mut compositor = Compositor::new(config).map_err(js_error)?;
        let snapshots = SnapshotQueue::new();
        compositor.on_layers_change(snapshots.sink());

        Ok(MemeCanvas {
            shared: Rc::new(Shared {
                compositor: RefCell::new(compositor),
                canvas,
                context,
                snapshots,
            }),
        })
    }

    /// Load a new background (URL, asset path or data URI).
    #[wasm_bindgen(js_name = setImageSource)]
    pub fn set_image_source(&self, source: String) {
        let ticket = self.shared.compositor.borrow_mut().set_image_source(source);
        let shared = Rc::clone(&self.shared);
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = load_image(&WebFetcher, ticket).await;
            if shared.compositor.borrow_mut().finish_load(outcome) {
                shared.schedule_frame();
            }
        });
    }

    /// Replace the layers with an array of layer objects.
    #[wasm_bindgen(js_name = setLayers)]
    pub fn set_layers(&self, layers: JsValue) -> Result<(), JsValue> {
        let layers: Vec<TextLayer> = serde_wasm_bindgen::from_value(layers)?;
        if self.shared.compositor.borrow_mut().set_layers(Layers::new(layers)) {
            self.shared.schedule_frame();
        }
        Ok(())
    }

    /// Receive the layer array after every drag move.
    #[wasm_bindgen(js_name = onLayersChange)]
    pub fn on_layers_change(&self, listener: js_sys::Function) {
        self.shared.snapshots.set_listener(listener);
    }

    /// Register font bytes (TTF/OTF) under a family name.
    #[wasm_bindgen(js_name = registerFont)]
    pub fn register_font(&self, family: &str, data: &[u8]) -> Result<(), JsValue> {
        let request = self
            .shared
            .compositor
            .borrow_mut()
            .register_font(family, data)
            .map_err(js_error)?;
        if request {
            self.shared.schedule_frame();
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = mouseDown)]
    pub fn mouse_down(&self, event: &MouseEvent) {
        self.mouse(MouseKind::Down, event);
    }

    #[wasm_bindgen(js_name = mouseMove)]
    pub fn mouse_move(&self, event: &MouseEvent) {
        self.mouse(MouseKind::Move, event);
    }

    #[wasm_bindgen(js_name = mouseUp)]
    pub fn mouse_up(&self, event: &MouseEvent) {
        self.mouse(MouseKind::Up, event);
    }

    #[wasm_bindgen(js_name = mouseLeave)]
    pub fn mouse_leave(&self, event: &MouseEvent) {
        self.mouse(MouseKind::Leave, event);
    }

    #[wasm_bindgen(js_name = touchStart)]
    pub fn touch_start(&self, event: &TouchEvent) {
        self.touch(TouchPhase::Start, event);
    }

    #[wasm_bindgen(js_name = touchMove)]
    pub fn touch_move(&self, event: &TouchEvent) {
        self.touch(TouchPhase::Move, event);
    }

    #[wasm_bindgen(js_name = touchEnd)]
    pub fn touch_end(&self, event: &TouchEvent) {
        self.touch(TouchPhase::End, event);
    }

    #[wasm_bindgen(js_name = touchCancel)]
    pub fn touch_cancel(&self, event: &TouchEvent) {
        self.touch(TouchPhase::Cancel, event);
    }

    /// Whether a background is loaded.
    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.shared.compositor.borrow().is_ready()
    }

    /// CSS cursor for the current hover/drag state.
    pub fn cursor(&self) -> String {
        self.shared.compositor.borrow().cursor().css_name().to_string()
    }

    /// Encode the current surface as PNG bytes.
    #[wasm_bindgen(js_name = toPng)]
    pub fn to_png(&self) -> Result<Vec<u8>, JsValue> {
        self.shared.compositor.borrow().export_png().map_err(js_error)
    }
}

impl MemeCanvas {
    fn mouse(&self, kind: MouseKind, event: &MouseEvent) {
        let input = mouse_input(kind, event.client_x() as f64, event.client_y() as f64);
        self.shared.dispatch(input);
    }

    fn touch(&self, phase: TouchPhase, event: &TouchEvent) {
        let list = event.touches();
        let touches: Vec<_> = (0..list.length())
            .filter_map(|i| list.item(i))
            .map(|touch| (touch.identifier(), touch.client_x() as f64, touch.client_y() as f64))
            .collect();
        let Some(input) = touch_input(phase, &touches) else {
            return;
        };
        if self.shared.dispatch(input) {
            event.prevent_default();
        }
    }
}
