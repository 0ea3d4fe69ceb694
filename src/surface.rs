//! Drawing surface
//!
//! Owns the host drawing target, keeps logical (CSS px) dimensions in sync with
//! the host layout, scales the backing store by the device pixel ratio, and
//! draws the static layers (backdrop and grid) under the trajectory.

use glam::Vec2;

use crate::consts::*;
use crate::profile::{DeviceSignals, PerformanceProfile};
use crate::render::DrawContext;
use crate::settings::{QualityPreset, Settings};

/// Where a [`Surface`] draws. Implemented by the canvas host on the web and by
/// test fixtures natively.
pub trait SurfaceHost {
    type Context: DrawContext;

    /// Current layout box in CSS pixels, `None` if the target is detached
    fn layout_size(&self) -> Option<Vec2>;
    fn device_pixel_ratio(&self) -> f32;
    /// Resize the physical backing store
    fn set_backing_size(&mut self, width: u32, height: u32);
    /// Drawing context, `None` while unavailable
    fn context(&mut self) -> Option<&mut Self::Context>;
}

/// Logical surface size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Map a (seconds, multiplier) sample to surface coordinates.
    ///
    /// Time spans [0, TIME_HORIZON_SECS] across the width, multiplier spans
    /// [MIN_MULTIPLIER, MAX_MULTIPLIER] bottom to top (y grows downward).
    /// Out-of-range and non-finite inputs clamp to the nearest edge.
    pub fn map(&self, time: f32, multiplier: f32) -> Vec2 {
        let tx = normalized(time, 0.0, TIME_HORIZON_SECS);
        let ty = normalized(multiplier, MIN_MULTIPLIER, MAX_MULTIPLIER);
        Vec2::new(tx * self.width, self.height - ty * self.height)
    }

    /// Physical backing store size for a pixel ratio
    pub fn backing_size(&self, dpr: f32) -> (u32, u32) {
        (
            (self.width * dpr).round().max(0.0) as u32,
            (self.height * dpr).round().max(0.0) as u32,
        )
    }
}

/// Position of `v` within [lo, hi], clamped to [0, 1]; NaN maps to 0
fn normalized(v: f32, lo: f32, hi: f32) -> f32 {
    let t = (v - lo) / (hi - lo);
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Trailing-edge debounce: only the last request fires, once `window_ms` has
/// passed without another request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debouncer {
    window_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            deadline: None,
        }
    }

    /// Record a request; pushes the deadline out
    pub fn request(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.window_ms);
    }

    /// True exactly once per quiet period, when the deadline has passed
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// The drawing surface shared (read-only) by the track and bursts
pub struct Surface<H: SurfaceHost> {
    host: H,
    viewport: Viewport,
    dpr: f32,
    /// `None` until the first successful resize
    backing: Option<(u32, u32)>,
    profile: PerformanceProfile,
    settings: Settings,
    resize_debounce: Debouncer,
}

impl<H: SurfaceHost> Surface<H> {
    /// Create the surface, detect the performance profile once and size the
    /// backing store to the current layout.
    pub fn new(host: H, signals: &DeviceSignals, settings: Settings) -> Self {
        let profile = settings.quality.profile(signals);
        log::info!(
            "Performance profile: {:?} (quality {})",
            profile,
            settings.quality.as_str()
        );

        let mut surface = Self {
            host,
            viewport: Viewport::ZERO,
            dpr: 1.0,
            backing: None,
            profile,
            settings,
            resize_debounce: Debouncer::new(RESIZE_DEBOUNCE_MS),
        };
        surface.resize();
        surface
    }

    /// Re-read the host layout and rescale. Returns whether anything changed;
    /// calling it again without a layout change is a no-op.
    pub fn resize(&mut self) -> bool {
        let Some(size) = self.host.layout_size() else {
            log::warn!(
                "Surface detached, keeping {}x{}",
                self.viewport.width,
                self.viewport.height
            );
            return false;
        };

        let dpr = self.host.device_pixel_ratio();
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let viewport = Viewport::new(finite_or_zero(size.x), finite_or_zero(size.y));
        let backing = viewport.backing_size(dpr);

        if self.backing == Some(backing) && self.viewport == viewport && self.dpr == dpr {
            return false;
        }

        self.host.set_backing_size(backing.0, backing.1);
        // Resizing the backing store resets the context transform
        if let Some(ctx) = self.host.context() {
            ctx.set_transform(dpr, dpr, Vec2::ZERO);
        }

        self.viewport = viewport;
        self.dpr = dpr;
        self.backing = Some(backing);
        log::info!(
            "Surface resized to {}x{} @{}x ({}x{} backing)",
            viewport.width,
            viewport.height,
            dpr,
            backing.0,
            backing.1
        );
        true
    }

    /// Note a layout change; the resize runs once things stay quiet
    pub fn request_resize(&mut self, now_ms: f64) {
        self.resize_debounce.request(now_ms);
    }

    /// Apply a pending resize if its quiescence window has elapsed. Returns
    /// whether the dimensions changed.
    pub fn poll_resize(&mut self, now_ms: f64) -> bool {
        self.resize_debounce.poll(now_ms) && self.resize()
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_debounce.is_pending()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    pub fn backing_size(&self) -> Option<(u32, u32)> {
        self.backing
    }

    pub fn profile(&self) -> &PerformanceProfile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Switch the quality override and re-resolve the profile
    pub fn set_quality(
        &mut self,
        preset: QualityPreset,
        signals: &DeviceSignals,
    ) -> PerformanceProfile {
        self.settings.quality = preset;
        self.profile = preset.profile(signals);
        log::info!(
            "Performance profile: {:?} (quality {})",
            self.profile,
            preset.as_str()
        );
        self.profile
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Drawing context, if the host has one
    pub fn context(&mut self) -> Option<&mut H::Context> {
        self.host.context()
    }

    /// Split borrow for components that draw with the surface's settings
    pub fn context_with_settings(&mut self) -> Option<(&mut H::Context, &Settings)> {
        let settings = &self.settings;
        self.host.context().map(|ctx| (ctx, settings))
    }

    /// Erase the full logical area
    pub fn clear(&mut self) {
        let size = self.viewport.size();
        if let Some(ctx) = self.host.context() {
            ctx.clear_rect(Vec2::ZERO, size);
        }
    }

    /// Vertical two-stop gradient backdrop
    pub fn draw_background(&mut self) {
        let size = self.viewport.size();
        let settings = &self.settings;
        if let Some(ctx) = self.host.context() {
            ctx.fill_vertical_gradient(
                Vec2::ZERO,
                size,
                &settings.background_top,
                &settings.background_bottom,
            );
        }
    }

    /// Dashed multiplier (2x..11x) and time (5s..30s) gridlines with labels
    pub fn draw_grid(&mut self) {
        let viewport = self.viewport;
        let settings = &self.settings;
        let Some(ctx) = self.host.context() else {
            return;
        };

        ctx.save();
        ctx.set_global_alpha(GRID_ALPHA);
        ctx.set_line_dash(&[5.0, 5.0]);
        ctx.set_line_width(1.0);
        ctx.set_stroke_color(&settings.grid_color);
        ctx.set_fill_color(&settings.label_color);
        ctx.set_font(&settings.label_font);

        // Horizontal: one line per whole multiplier step above the floor
        let step = (MAX_MULTIPLIER - MIN_MULTIPLIER) / GRID_MULTIPLIER_LINES as f32;
        for i in 1..=GRID_MULTIPLIER_LINES {
            let multiplier = MIN_MULTIPLIER + step * i as f32;
            let y = viewport.map(0.0, multiplier).y;
            ctx.begin_path();
            ctx.move_to(Vec2::new(0.0, y));
            ctx.line_to(Vec2::new(viewport.width, y));
            ctx.stroke();
            ctx.fill_text(&format!("{}x", multiplier.round()), Vec2::new(4.0, (y - 4.0).max(12.0)));
        }

        // Vertical: every GRID_TIME_STEP_SECS up to the horizon
        for i in 1..=GRID_TIME_LINES {
            let secs = GRID_TIME_STEP_SECS * i;
            let x = viewport.map(secs as f32, MIN_MULTIPLIER).x;
            ctx.begin_path();
            ctx.move_to(Vec2::new(x, 0.0));
            ctx.line_to(Vec2::new(x, viewport.height));
            ctx.stroke();
            ctx.fill_text(
                &format!("{}s", secs),
                Vec2::new((x - 24.0).max(0.0), viewport.height - 6.0),
            );
        }

        ctx.restore();
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

impl<H: SurfaceHost> std::fmt::Debug for Surface<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("viewport", &self.viewport)
            .field("dpr", &self.dpr)
            .field("backing", &self.backing)
            .field("profile", &self.profile)
            .finish()
    }
}

/// In-memory host: a fixed layout box and a [`RecordingContext`](crate::render::RecordingContext).
///
/// Used by tests and the native binary.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    pub layout: Option<Vec2>,
    pub dpr: f32,
    pub backing: (u32, u32),
    pub backing_writes: u32,
    pub ctx: Option<crate::render::RecordingContext>,
}

impl HeadlessHost {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self {
            layout: Some(Vec2::new(width, height)),
            dpr,
            backing: (0, 0),
            backing_writes: 0,
            ctx: Some(crate::render::RecordingContext::new()),
        }
    }
}

impl SurfaceHost for HeadlessHost {
    type Context = crate::render::RecordingContext;

    fn layout_size(&self) -> Option<Vec2> {
        self.layout
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
        self.backing_writes += 1;
    }

    fn context(&mut self) -> Option<&mut Self::Context> {
        self.ctx.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingContext};

    fn surface(width: f32, height: f32, dpr: f32) -> Surface<HeadlessHost> {
        Surface::new(
            HeadlessHost::new(width, height, dpr),
            &DeviceSignals::default(),
            Settings::default(),
        )
    }

    fn ctx(surface: &mut Surface<HeadlessHost>) -> &mut RecordingContext {
        surface.context().unwrap()
    }

    #[test]
    fn test_new_sizes_backing_store_by_dpr() {
        let mut s = surface(800.0, 400.0, 2.0);
        assert_eq!(s.viewport(), Viewport::new(800.0, 400.0));
        assert_eq!(s.backing_size(), Some((1600, 800)));
        assert_eq!(s.host().backing, (1600, 800));
        assert!(ctx(&mut s).commands().contains(&DrawCommand::SetTransform {
            scale_x: 2.0,
            scale_y: 2.0,
            translate: Vec2::ZERO
        }));
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut s = surface(640.0, 360.0, 1.5);
        let first = s.viewport();
        assert!(!s.resize());
        assert_eq!(s.viewport(), first);
        assert_eq!(s.host().backing_writes, 1);
    }

    #[test]
    fn test_resize_follows_layout() {
        let mut s = surface(640.0, 360.0, 1.0);
        s.host_mut().layout = Some(Vec2::new(320.0, 200.0));
        assert!(s.resize());
        assert_eq!(s.viewport(), Viewport::new(320.0, 200.0));
        assert_eq!(s.backing_size(), Some((320, 200)));
    }

    #[test]
    fn test_detached_surface_keeps_dimensions() {
        let mut s = surface(640.0, 360.0, 1.0);
        s.host_mut().layout = None;
        assert!(!s.resize());
        assert_eq!(s.viewport(), Viewport::new(640.0, 360.0));
    }

    #[test]
    fn test_bad_dpr_falls_back_to_one() {
        let s = surface(100.0, 50.0, f32::NAN);
        assert_eq!(s.device_pixel_ratio(), 1.0);
        assert_eq!(s.backing_size(), Some((100, 50)));
    }

    #[test]
    fn test_debounce_coalesces_requests() {
        let mut s = surface(640.0, 360.0, 1.0);
        s.host_mut().layout = Some(Vec2::new(500.0, 300.0));

        s.request_resize(0.0);
        s.request_resize(100.0);
        s.request_resize(200.0);
        // 150ms after the first request, but the window restarted
        assert!(!s.poll_resize(160.0));
        assert!(!s.poll_resize(349.0));
        assert_eq!(s.viewport(), Viewport::new(640.0, 360.0));

        assert!(s.poll_resize(350.0));
        assert_eq!(s.viewport(), Viewport::new(500.0, 300.0));
        assert_eq!(s.host().backing_writes, 2);
        assert!(!s.poll_resize(1000.0));

        // Window settles on the same layout: fires, but nothing changed
        s.request_resize(2000.0);
        assert!(!s.poll_resize(2150.0));
        assert!(!s.resize_pending());
        assert_eq!(s.host().backing_writes, 2);
    }

    #[test]
    fn test_debouncer_idle_never_fires() {
        let mut d = Debouncer::new(150.0);
        assert!(!d.poll(1e9));
        d.request(10.0);
        assert!(d.is_pending());
        assert!(d.poll(160.0));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_map_corners_and_clamp() {
        let v = Viewport::new(600.0, 300.0);
        assert_eq!(v.map(0.0, 1.0), Vec2::new(0.0, 300.0));
        assert_eq!(v.map(30.0, 11.0), Vec2::new(600.0, 0.0));
        assert_eq!(v.map(45.0, 11.0).x, v.map(30.0, 11.0).x);
        assert_eq!(v.map(-3.0, 0.5), Vec2::new(0.0, 300.0));
        assert_eq!(v.map(15.0, 6.0), Vec2::new(300.0, 150.0));
        assert_eq!(v.map(f32::NAN, f32::INFINITY), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_grid_lines_and_labels() {
        let mut s = surface(600.0, 300.0, 1.0);
        ctx(&mut s).clear_commands();
        s.draw_grid();

        let c = ctx(&mut s);
        assert_eq!(c.count(|cmd| matches!(cmd, DrawCommand::Stroke)), 16);
        let labels = c.texts();
        assert_eq!(labels[0], "2x");
        assert_eq!(labels[9], "11x");
        assert_eq!(labels[10], "5s");
        assert_eq!(labels[15], "30s");
        // Top gridline sits on the top edge
        assert!(c.commands().contains(&DrawCommand::MoveTo(Vec2::new(0.0, 0.0))));
        assert_eq!(c.global_alpha(), 1.0);
        assert!(c.line_dash().is_empty());
        assert_eq!(c.save_depth(), 0);
    }

    #[test]
    fn test_clear_and_background_cover_viewport() {
        let mut s = surface(320.0, 240.0, 3.0);
        s.clear();
        s.draw_background();
        let c = ctx(&mut s);
        let size = Vec2::new(320.0, 240.0);
        assert!(c.commands().contains(&DrawCommand::ClearRect {
            origin: Vec2::ZERO,
            size
        }));
        assert!(c.commands().iter().any(
            |cmd| matches!(cmd, DrawCommand::FillVerticalGradient { size: sz, .. } if *sz == size)
        ));
    }

    #[test]
    fn test_draws_are_noops_without_context() {
        let mut s = surface(320.0, 240.0, 1.0);
        s.host_mut().ctx = None;
        s.clear();
        s.draw_background();
        s.draw_grid();
        assert!(s.context().is_none());
    }

    #[test]
    fn test_profile_detected_once_from_signals() {
        let signals = DeviceSignals {
            hardware_concurrency: Some(8),
            device_memory_gb: Some(8.0),
            viewport_width: Some(1280.0),
        };
        let mut s = Surface::new(HeadlessHost::new(1280.0, 720.0, 1.0), &signals, Settings::default());
        assert_eq!(*s.profile(), PerformanceProfile::HIGH_END);
        s.host_mut().layout = Some(Vec2::new(300.0, 200.0));
        s.resize();
        assert_eq!(*s.profile(), PerformanceProfile::HIGH_END);
    }
}
