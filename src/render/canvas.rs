//! `CanvasRenderingContext2d` backend
//!
//! Canvas calls that can throw (arc with a negative radius, text before fonts
//! load) are dropped; a missing primitive for one frame is acceptable.

use glam::Vec2;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::context::{Color, DrawContext};

impl DrawContext for CanvasRenderingContext2d {
    fn set_transform(&mut self, scale_x: f32, scale_y: f32, translate: Vec2) {
        let _ = CanvasRenderingContext2d::set_transform(
            self,
            scale_x as f64,
            0.0,
            0.0,
            scale_y as f64,
            translate.x as f64,
            translate.y as f64,
        );
    }

    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn clear_rect(&mut self, origin: Vec2, size: Vec2) {
        CanvasRenderingContext2d::clear_rect(
            self,
            origin.x as f64,
            origin.y as f64,
            size.x as f64,
            size.y as f64,
        );
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        CanvasRenderingContext2d::fill_rect(
            self,
            origin.x as f64,
            origin.y as f64,
            size.x as f64,
            size.y as f64,
        );
    }

    fn fill_vertical_gradient(&mut self, origin: Vec2, size: Vec2, top: &Color, bottom: &Color) {
        let gradient = self.create_linear_gradient(
            origin.x as f64,
            origin.y as f64,
            origin.x as f64,
            (origin.y + size.y) as f64,
        );
        let _ = gradient.add_color_stop(0.0, top.as_str());
        let _ = gradient.add_color_stop(1.0, bottom.as_str());
        self.set_fill_style_canvas_gradient(&gradient);
        DrawContext::fill_rect(self, origin, size);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, p: Vec2) {
        CanvasRenderingContext2d::move_to(self, p.x as f64, p.y as f64);
    }

    fn line_to(&mut self, p: Vec2) {
        CanvasRenderingContext2d::line_to(self, p.x as f64, p.y as f64);
    }

    fn quadratic_curve_to(&mut self, control: Vec2, to: Vec2) {
        CanvasRenderingContext2d::quadratic_curve_to(
            self,
            control.x as f64,
            control.y as f64,
            to.x as f64,
            to.y as f64,
        );
    }

    fn arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32) {
        let _ = CanvasRenderingContext2d::arc(
            self,
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            start_angle as f64,
            end_angle as f64,
        );
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn set_stroke_color(&mut self, color: &Color) {
        self.set_stroke_style_str(color.as_str());
    }

    fn set_fill_color(&mut self, color: &Color) {
        self.set_fill_style_str(color.as_str());
    }

    fn set_line_width(&mut self, width: f32) {
        CanvasRenderingContext2d::set_line_width(self, width as f64);
    }

    fn set_line_dash(&mut self, segments: &[f32]) {
        let array = js_sys::Array::new();
        for s in segments {
            array.push(&JsValue::from_f64(*s as f64));
        }
        let _ = CanvasRenderingContext2d::set_line_dash(self, &array);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        CanvasRenderingContext2d::set_global_alpha(self, alpha.clamp(0.0, 1.0) as f64);
    }

    fn set_shadow(&mut self, blur: f32, color: &Color) {
        self.set_shadow_blur(blur as f64);
        self.set_shadow_color(color.as_str());
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn fill_text(&mut self, text: &str, at: Vec2) {
        let _ = CanvasRenderingContext2d::fill_text(self, text, at.x as f64, at.y as f64);
    }
}
