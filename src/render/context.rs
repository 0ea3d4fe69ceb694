//! Drawing context trait and colour type

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// A CSS colour string (`#rrggbb`, `rgba(...)`, named colours)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(css: impl Into<String>) -> Self {
        Self(css.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn white() -> Self {
        Self::new("#ffffff")
    }

    pub fn transparent() -> Self {
        Self::new("rgba(0, 0, 0, 0)")
    }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The subset of a 2D canvas API used by the renderer.
///
/// Coordinates are logical (CSS) pixels once [`set_transform`](Self::set_transform)
/// has applied the device pixel ratio. Implementations must treat every call as
/// infallible; a backend that cannot draw simply drops the call.
pub trait DrawContext {
    fn set_transform(&mut self, scale_x: f32, scale_y: f32, translate: Vec2);

    fn save(&mut self);
    fn restore(&mut self);

    fn clear_rect(&mut self, origin: Vec2, size: Vec2);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2);
    /// Fill a rectangle with a top-to-bottom two-stop linear gradient
    fn fill_vertical_gradient(&mut self, origin: Vec2, size: Vec2, top: &Color, bottom: &Color);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Vec2);
    fn line_to(&mut self, p: Vec2);
    fn quadratic_curve_to(&mut self, control: Vec2, to: Vec2);
    fn arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32);
    fn stroke(&mut self);
    fn fill(&mut self);

    fn set_stroke_color(&mut self, color: &Color);
    fn set_fill_color(&mut self, color: &Color);
    fn set_line_width(&mut self, width: f32);
    /// Empty slice = solid line
    fn set_line_dash(&mut self, segments: &[f32]);
    fn set_global_alpha(&mut self, alpha: f32);
    /// Blur 0 disables the glow
    fn set_shadow(&mut self, blur: f32, color: &Color);

    fn set_font(&mut self, font: &str);
    fn fill_text(&mut self, text: &str, at: Vec2);

    /// Filled circle; leaves `color` as the current fill
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &Color) {
        self.set_fill_color(color);
        self.begin_path();
        self.arc(center, radius, 0.0, TAU);
        self.fill();
    }
}
