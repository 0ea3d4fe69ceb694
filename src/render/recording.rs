//! Headless drawing context that records every call
//!
//! Used by tests and the native binary. It also tracks the ambient state a
//! real canvas would carry (alpha, glow, dash) across `save`/`restore`, so
//! callers can assert that nothing leaks out of a draw call.

use glam::Vec2;

use super::context::{Color, DrawContext};

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetTransform { scale_x: f32, scale_y: f32, translate: Vec2 },
    Save,
    Restore,
    ClearRect { origin: Vec2, size: Vec2 },
    FillRect { origin: Vec2, size: Vec2 },
    FillVerticalGradient { origin: Vec2, size: Vec2, top: Color, bottom: Color },
    BeginPath,
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadraticCurveTo { control: Vec2, to: Vec2 },
    Arc { center: Vec2, radius: f32 },
    Stroke,
    /// Fill with the alpha that was current at the time of the call
    Fill { alpha: f32 },
    SetStrokeColor(Color),
    SetFillColor(Color),
    SetLineWidth(f32),
    SetLineDash(Vec<f32>),
    SetGlobalAlpha(f32),
    SetShadow { blur: f32, color: Color },
    SetFont(String),
    FillText { text: String, at: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
struct AmbientState {
    alpha: f32,
    shadow_blur: f32,
    line_dash: Vec<f32>,
}

impl Default for AmbientState {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            shadow_blur: 0.0,
            line_dash: Vec::new(),
        }
    }
}

/// A [`DrawContext`] that stores commands instead of drawing
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    state: AmbientState,
    stack: Vec<AmbientState>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands (ambient state is kept, like a real canvas between frames)
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn shadow_blur(&self) -> f32 {
        self.state.shadow_blur
    }

    pub fn line_dash(&self) -> &[f32] {
        &self.state.line_dash
    }

    /// Unbalanced `save` calls still on the stack
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Labels passed to `fill_text`, in draw order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawContext for RecordingContext {
    fn set_transform(&mut self, scale_x: f32, scale_y: f32, translate: Vec2) {
        self.commands.push(DrawCommand::SetTransform {
            scale_x,
            scale_y,
            translate,
        });
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn clear_rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::ClearRect { origin, size });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::FillRect { origin, size });
    }

    fn fill_vertical_gradient(&mut self, origin: Vec2, size: Vec2, top: &Color, bottom: &Color) {
        self.commands.push(DrawCommand::FillVerticalGradient {
            origin,
            size,
            top: top.clone(),
            bottom: bottom.clone(),
        });
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, p: Vec2) {
        self.commands.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: Vec2) {
        self.commands.push(DrawCommand::LineTo(p));
    }

    fn quadratic_curve_to(&mut self, control: Vec2, to: Vec2) {
        self.commands
            .push(DrawCommand::QuadraticCurveTo { control, to });
    }

    fn arc(&mut self, center: Vec2, radius: f32, _start_angle: f32, _end_angle: f32) {
        self.commands.push(DrawCommand::Arc { center, radius });
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill {
            alpha: self.state.alpha,
        });
    }

    fn set_stroke_color(&mut self, color: &Color) {
        self.commands.push(DrawCommand::SetStrokeColor(color.clone()));
    }

    fn set_fill_color(&mut self, color: &Color) {
        self.commands.push(DrawCommand::SetFillColor(color.clone()));
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::SetLineWidth(width));
    }

    fn set_line_dash(&mut self, segments: &[f32]) {
        self.state.line_dash = segments.to_vec();
        self.commands.push(DrawCommand::SetLineDash(segments.to_vec()));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha;
        self.commands.push(DrawCommand::SetGlobalAlpha(alpha));
    }

    fn set_shadow(&mut self, blur: f32, color: &Color) {
        self.state.shadow_blur = blur;
        self.commands.push(DrawCommand::SetShadow {
            blur,
            color: color.clone(),
        });
    }

    fn set_font(&mut self, font: &str) {
        self.commands.push(DrawCommand::SetFont(font.to_string()));
    }

    fn fill_text(&mut self, text: &str, at: Vec2) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_rolls_back_ambient_state() {
        let mut ctx = RecordingContext::new();
        ctx.save();
        ctx.set_global_alpha(0.25);
        ctx.set_shadow(12.0, &Color::white());
        ctx.set_line_dash(&[4.0, 4.0]);
        ctx.restore();

        assert_eq!(ctx.global_alpha(), 1.0);
        assert_eq!(ctx.shadow_blur(), 0.0);
        assert!(ctx.line_dash().is_empty());
        assert_eq!(ctx.save_depth(), 0);
    }

    #[test]
    fn test_fill_records_current_alpha() {
        let mut ctx = RecordingContext::new();
        ctx.set_global_alpha(0.5);
        ctx.fill_circle(Vec2::new(1.0, 2.0), 3.0, &Color::white());

        assert!(ctx.commands().contains(&DrawCommand::Fill { alpha: 0.5 }));
        assert!(ctx.commands().contains(&DrawCommand::Arc {
            center: Vec2::new(1.0, 2.0),
            radius: 3.0
        }));
    }
}
