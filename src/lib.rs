//! Crash Curve - live multiplier trajectory renderer
//!
//! Core modules:
//! - `render`: 2D drawing context abstraction (canvas on web, recorder for tests)
//! - `profile`: Device-capability performance profile
//! - `surface`: Drawing surface with DPR scaling, debounced resize, backdrop and grid
//! - `track`: Multiplier trajectory buffer, coordinate mapping and curve drawing
//! - `burst`: Crash particle burst simulation
//! - `animation`: Run/stop frame loop over an injectable scheduler
//! - `round`: Round-lifecycle events and the scene that owns everything above
//! - `platform`: Browser bindings (wasm32 only)

pub mod animation;
pub mod burst;
pub mod error;
pub mod platform;
pub mod profile;
pub mod render;
pub mod round;
pub mod settings;
pub mod surface;
pub mod track;

pub use animation::{AnimationLoop, FrameScheduler, FrameTick, LoopState, ManualScheduler};
pub use burst::{BurstSimulator, Particle};
pub use error::CurveError;
pub use profile::{DeviceSignals, PerformanceProfile, detect_performance};
pub use render::{Color, DrawCommand, DrawContext, RecordingContext};
pub use round::{CrashScene, RoundEvent, RoundPhase};
pub use settings::{QualityPreset, Settings};
pub use surface::{Surface, SurfaceHost, Viewport};
pub use track::{CurvePoint, HeadPose, TrajectoryTrack};

use glam::Vec2;

/// Rendering configuration constants
pub mod consts {
    /// Time axis horizon (seconds mapped across the full surface width)
    pub const TIME_HORIZON_SECS: f32 = 30.0;
    /// Multiplier axis floor (bottom edge)
    pub const MIN_MULTIPLIER: f32 = 1.0;
    /// Multiplier axis ceiling (top edge); larger values clamp here
    pub const MAX_MULTIPLIER: f32 = 11.0;

    /// Trajectory ring buffer capacity
    pub const TRACK_CAPACITY: usize = 300;

    /// Resize quiescence window
    pub const RESIZE_DEBOUNCE_MS: f64 = 150.0;

    /// Grid layout
    pub const GRID_MULTIPLIER_LINES: u32 = 10;
    pub const GRID_TIME_LINES: u32 = 6;
    pub const GRID_TIME_STEP_SECS: u32 = 5;
    pub const GRID_ALPHA: f32 = 0.3;

    /// Burst kinematics (per tick, CSS pixels)
    pub const BURST_SPEED: f32 = 4.0;
    pub const BURST_GRAVITY: f32 = 0.15;
    pub const BURST_DRAG: f32 = 0.98;
    pub const BURST_DECAY_MIN: f32 = 0.015;
    pub const BURST_DECAY_MAX: f32 = 0.035;
    pub const BURST_RADIUS_MIN: f32 = 2.0;
    pub const BURST_RADIUS_MAX: f32 = 5.0;

    /// Head marker pulse: radius scale = PULSE_MID + PULSE_AMPLITUDE * sin(t / PULSE_RATE_SECS)
    pub const PULSE_RATE_SECS: f64 = 0.5;
    pub const PULSE_MID: f32 = 0.85;
    pub const PULSE_AMPLITUDE: f32 = 0.15;

    /// Crash multipliers kept for the recent-rounds strip
    pub const HISTORY_LENGTH: usize = 20;
}

/// Midpoint between two points
#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    (a + b) * 0.5
}

/// Heading of the vector from `from` to `to` (radians, y-down screen space)
#[inline]
pub fn heading(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
