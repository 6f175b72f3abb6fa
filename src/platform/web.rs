//! Browser host: canvas 2D surface, requestAnimationFrame scheduling and
//! `performance.now()` time

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use super::{Clock, Scheduler, TickHandle};
use crate::renderer::{DrawSurface, Rgba, css_rgba};

/// Look up `#id` and get its 2D context
pub fn canvas_context(id: &str) -> Result<CanvasRenderingContext2d, JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element #{id}")))?
        .dyn_into()?;
    canvas
        .get_context("2d")?
        .ok_or("2d context unavailable")?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

/// Canvas calls only fail on non-finite input; a failed call draws nothing
fn ignore(result: Result<(), JsValue>) {
    if let Err(err) = result {
        log::debug!("Canvas call failed: {err:?}");
    }
}

impl DrawSurface for CanvasRenderingContext2d {
    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn translate(&mut self, x: f32, y: f32) {
        ignore(CanvasRenderingContext2d::translate(self, x as f64, y as f64));
    }

    fn rotate(&mut self, angle: f32) {
        ignore(CanvasRenderingContext2d::rotate(self, angle as f64));
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        CanvasRenderingContext2d::move_to(self, x as f64, y as f64);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        CanvasRenderingContext2d::line_to(self, x as f64, y as f64);
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32) {
        ignore(CanvasRenderingContext2d::arc(
            self,
            x as f64,
            y as f64,
            radius.max(0.0) as f64,
            start_angle as f64,
            end_angle as f64,
        ));
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.set_fill_style_str(&css_rgba(color));
    }

    fn set_stroke_color(&mut self, color: Rgba) {
        self.set_stroke_style_str(&css_rgba(color));
    }

    fn set_line_width(&mut self, width: f32) {
        CanvasRenderingContext2d::set_line_width(self, width as f64);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        CanvasRenderingContext2d::fill_rect(self, x as f64, y as f64, w as f64, h as f64);
    }
}

/// Called with the handle of the frame that fired
pub type FrameCallback = Rc<dyn Fn(TickHandle)>;

/// Schedules frames with `requestAnimationFrame`
pub struct RafScheduler {
    window: Window,
    on_frame: FrameCallback,
}

impl RafScheduler {
    pub fn new(window: Window, on_frame: FrameCallback) -> Self {
        Self { window, on_frame }
    }
}

impl Scheduler for RafScheduler {
    fn request_tick(&mut self) -> TickHandle {
        let on_frame = self.on_frame.clone();
        let handle = Rc::new(std::cell::Cell::new(TickHandle(0)));
        let fired = handle.clone();
        let closure = Closure::once(move |_time: f64| on_frame(fired.get()));
        let id = match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(id) => id,
            Err(err) => {
                log::error!("requestAnimationFrame failed: {err:?}");
                0
            }
        };
        // The browser drops the callback after it runs
        closure.forget();
        handle.set(TickHandle(id as u64));
        handle.get()
    }

    fn cancel(&mut self, handle: TickHandle) {
        ignore(self.window.cancel_animation_frame(handle.0 as i32));
    }
}

/// `performance.now()`
pub struct PerformanceClock {
    performance: Option<web_sys::Performance>,
}

impl PerformanceClock {
    pub fn new(window: &Window) -> Self {
        Self {
            performance: window.performance(),
        }
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        self.performance.as_ref().map_or(0.0, |p| p.now())
    }
}
