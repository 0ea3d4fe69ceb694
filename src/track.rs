//! Multiplier trajectory
//!
//! Buffers the current round's samples as surface points and draws them as a
//! smoothed line with a pulsing marker at the head.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::profile::PerformanceProfile;
use crate::render::{Color, DrawContext};
use crate::settings::Settings;
use crate::surface::Viewport;
use crate::{heading, midpoint};

/// A sample mapped onto the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub position: Vec2,
    /// Always >= 1.0
    pub multiplier: f32,
    /// Seconds since round start, non-decreasing along the buffer
    pub elapsed: f32,
}

/// Head of the curve, for placing a sprite on it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub position: Vec2,
    pub multiplier: f32,
    /// Heading of the last segment in radians (y-down); 0 with a single point
    pub angle: f32,
}

/// Bounded buffer of the most recent curve points
#[derive(Debug, Clone)]
pub struct TrajectoryTrack {
    points: VecDeque<CurvePoint>,
    capacity: usize,
    /// Receiving samples for a live round
    active: bool,
    /// Frozen after a crash until the next reset
    halted: bool,
}

impl Default for TrajectoryTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryTrack {
    pub fn new() -> Self {
        Self::with_capacity(TRACK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            active: false,
            halted: false,
        }
    }

    /// Discard the buffer for a new round
    pub fn reset(&mut self) {
        self.points = VecDeque::with_capacity(self.capacity);
        self.active = false;
        self.halted = false;
    }

    /// Stop growth after a crash; the points stay for display
    pub fn halt(&mut self) {
        self.active = false;
        self.halted = true;
    }

    /// Append a sample, evicting the oldest point beyond capacity.
    ///
    /// Out-of-range values are clamped for display rather than rejected. A
    /// sample older than the head is pinned to the head's time so elapsed
    /// stays non-decreasing. Returns false if the track is halted.
    pub fn add_point(&mut self, time: f32, multiplier: f32, viewport: Viewport) -> bool {
        if self.halted {
            log::debug!("Ignoring sample ({}, {}) after crash", time, multiplier);
            return false;
        }

        let floor = self.points.back().map_or(0.0, |p| p.elapsed);
        let elapsed = if time.is_nan() { floor } else { time.max(floor) };
        let multiplier = if multiplier.is_nan() {
            MIN_MULTIPLIER
        } else {
            multiplier.max(MIN_MULTIPLIER)
        };

        self.points.push_back(CurvePoint {
            position: viewport.map(elapsed, multiplier),
            multiplier,
            elapsed,
        });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        self.active = true;
        true
    }

    /// Re-project every buffered point onto a resized surface
    pub fn remap(&mut self, viewport: Viewport) {
        for point in self.points.iter_mut() {
            point.position = viewport.map(point.elapsed, point.multiplier);
        }
    }

    pub fn head_pose(&self) -> Option<HeadPose> {
        let last = self.points.back()?;
        let angle = match self.points.len() {
            n if n >= 2 => heading(self.points[n - 2].position, last.position),
            _ => 0.0,
        };
        Some(HeadPose {
            position: last.position,
            multiplier: last.multiplier,
            angle,
        })
    }

    pub fn points(&self) -> &VecDeque<CurvePoint> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stroke the smoothed curve and the head marker. No-op with < 2 points.
    ///
    /// Each interior point is a quadratic control point whose segment ends at
    /// the midpoint to its successor; the path then closes on the last point.
    pub fn draw<C: DrawContext>(
        &self,
        ctx: &mut C,
        profile: &PerformanceProfile,
        settings: &Settings,
        now_secs: f64,
    ) {
        let n = self.points.len();
        if n < 2 {
            return;
        }

        ctx.begin_path();
        ctx.move_to(self.points[0].position);
        for i in 1..n - 1 {
            let p = self.points[i].position;
            let next = self.points[i + 1].position;
            ctx.quadratic_curve_to(p, midpoint(p, next));
        }
        let head = self.points[n - 1].position;
        ctx.line_to(head);

        ctx.set_stroke_color(&settings.accent_color);
        ctx.set_line_width(settings.line_width);
        ctx.set_line_dash(&[]);
        if profile.shadows {
            ctx.set_shadow(settings.glow_blur, &settings.accent_color);
            ctx.stroke();
            ctx.set_shadow(0.0, &Color::transparent());
        } else {
            ctx.stroke();
        }

        let scale = if settings.reduced_motion {
            1.0
        } else {
            pulse_scale(now_secs)
        };
        let radius = settings.head_radius * scale;
        ctx.fill_circle(head, radius, &Color::white());
        ctx.fill_circle(head, radius * 0.5, &settings.accent_color);
    }
}

/// Head marker radius scale in [PULSE_MID - PULSE_AMPLITUDE, PULSE_MID + PULSE_AMPLITUDE]
pub fn pulse_scale(now_secs: f64) -> f32 {
    PULSE_MID + PULSE_AMPLITUDE * (now_secs / PULSE_RATE_SECS).sin() as f32
}
