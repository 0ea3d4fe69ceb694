//! Browser host for the scene

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::{FrameRequest, FrameScheduler};
use crate::error::{CurveError, Result};
use crate::profile::DeviceSignals;
use crate::surface::SurfaceHost;

/// Milliseconds on the `performance.now()` clock (same clock as rAF timestamps)
pub fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or_else(js_sys::Date::now, |p| p.now())
}

/// Read core count, memory estimate and viewport width.
///
/// `navigator.deviceMemory` is not in every engine's IDL, so it is read
/// reflectively; anything missing is left `None`.
pub fn read_device_signals() -> DeviceSignals {
    let Some(window) = web_sys::window() else {
        return DeviceSignals::default();
    };
    let navigator = window.navigator();

    let cores = navigator.hardware_concurrency();
    let hardware_concurrency = (cores.is_finite() && cores > 0.0).then_some(cores as u32);

    let device_memory_gb = js_sys::Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
        .ok()
        .and_then(|v| v.as_f64())
        .map(|gb| gb as f32);

    let viewport_width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .map(|w| w as f32);

    let signals = DeviceSignals {
        hardware_concurrency,
        device_memory_gb,
        viewport_width,
    };
    log::info!("Device signals: {:?}", signals);
    signals
}

/// `<canvas>` element plus its 2d context
pub struct CanvasHost {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasHost {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(CurveError::MissingHost("2d context"))?;
        Ok(Self { canvas, ctx })
    }

    /// Look up a canvas by element id
    pub fn from_element_id(id: &str) -> Result<Self> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(CurveError::MissingHost("document"))?
            .get_element_by_id(id)
            .ok_or(CurveError::MissingHost("canvas element"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| CurveError::MissingHost("canvas element"))?;
        Self::new(canvas)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl SurfaceHost for CanvasHost {
    type Context = CanvasRenderingContext2d;

    /// The canvas fills its container, so the container's box is the layout
    fn layout_size(&self) -> Option<Vec2> {
        if !self.canvas.is_connected() {
            return None;
        }
        let rect = match self.canvas.parent_element() {
            Some(parent) => parent.get_bounding_client_rect(),
            None => self.canvas.get_bounding_client_rect(),
        };
        Some(Vec2::new(rect.width() as f32, rect.height() as f32))
    }

    fn device_pixel_ratio(&self) -> f32 {
        web_sys::window().map_or(1.0, |w| w.device_pixel_ratio() as f32)
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn context(&mut self) -> Option<&mut Self::Context> {
        if self.canvas.is_connected() {
            Some(&mut self.ctx)
        } else {
            None
        }
    }
}

type RafClosure = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` scheduler.
///
/// Every request registers the same JS closure, installed once with
/// [`set_callback`](Self::set_callback) after the scene that it drives exists.
#[derive(Clone, Default)]
pub struct RafScheduler {
    callback: Rc<RefCell<Option<RafClosure>>>,
}

impl RafScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_callback(&self, callback: impl FnMut(f64) + 'static) {
        *self.callback.borrow_mut() = Some(Closure::new(callback));
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        let window = web_sys::window()?;
        let callback = self.callback.borrow();
        let id = window
            .request_animation_frame(callback.as_ref()?.as_ref().unchecked_ref())
            .ok()?;
        Some(FrameRequest(id))
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(request.0);
        }
    }
}

impl std::fmt::Debug for RafScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RafScheduler")
            .field("installed", &self.callback.borrow().is_some())
            .finish()
    }
}
