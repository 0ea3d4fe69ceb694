//! Round lifecycle and scene composition
//!
//! [`CrashScene`] is the composition root: it owns the surface, the trajectory,
//! the live bursts and the frame loop, and turns typed [`RoundEvent`]s from the
//! network layer into calls on them.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::animation::{AnimationLoop, FrameScheduler};
use crate::burst::BurstSimulator;
use crate::consts::HISTORY_LENGTH;
use crate::error::{CurveError, Result};
use crate::profile::{DeviceSignals, PerformanceProfile};
use crate::render::Color;
use crate::settings::QualityPreset;
use crate::surface::{Surface, SurfaceHost};
use crate::track::{HeadPose, TrajectoryTrack};

/// Round-lifecycle signal delivered by the network layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundStarted,
    /// Seconds since round start and the current multiplier
    Sample { time: f32, multiplier: f32 },
    /// Round over; burst at `position` (surface coordinates)
    RoundCrashed { final_multiplier: f32, position: Vec2 },
}

impl RoundEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CurveError::InvalidEvent)
    }
}

/// Where the scene is in the round cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round seen yet
    #[default]
    Waiting,
    /// Curve growing
    Running,
    /// Curve frozen, burst playing
    Crashed,
}

/// Everything drawn for the crash game, owned in one place
pub struct CrashScene<H: SurfaceHost, S: FrameScheduler> {
    surface: Surface<H>,
    track: TrajectoryTrack,
    bursts: Vec<BurstSimulator>,
    animation: AnimationLoop<S>,
    rng: Pcg32,
    palette: Vec<Color>,
    phase: RoundPhase,
    /// Most recent crash multipliers, newest last
    history: VecDeque<f32>,
}

impl<H: SurfaceHost, S: FrameScheduler> CrashScene<H, S> {
    pub fn new(surface: Surface<H>, scheduler: S, seed: u64) -> Self {
        let animation = AnimationLoop::new(scheduler, surface.profile().target_fps);
        let palette = surface.settings().palette();
        Self {
            surface,
            track: TrajectoryTrack::new(),
            bursts: Vec::new(),
            animation,
            rng: Pcg32::seed_from_u64(seed),
            palette,
            phase: RoundPhase::Waiting,
            history: VecDeque::with_capacity(HISTORY_LENGTH),
        }
    }

    /// Apply one lifecycle event
    pub fn handle(&mut self, event: RoundEvent) {
        match event {
            RoundEvent::RoundStarted => self.start_round(),
            RoundEvent::Sample { time, multiplier } => match self.phase {
                RoundPhase::Running => {
                    self.track
                        .add_point(time, multiplier, self.surface.viewport());
                }
                RoundPhase::Waiting => {
                    log::info!("Joined round in progress at {:.2}x", multiplier);
                    self.start_round();
                    self.track
                        .add_point(time, multiplier, self.surface.viewport());
                }
                RoundPhase::Crashed => {
                    log::debug!("Sample after crash ignored ({}, {})", time, multiplier);
                }
            },
            RoundEvent::RoundCrashed {
                final_multiplier,
                position,
            } => {
                if self.phase == RoundPhase::Crashed {
                    log::debug!("Duplicate crash at {:.2}x ignored", final_multiplier);
                } else {
                    self.crash(final_multiplier, position);
                }
            }
        }
    }

    /// Decode and apply a JSON event (`{"type":"sample","time":1.5,"multiplier":1.2}`)
    pub fn handle_json(&mut self, json: &str) -> Result<()> {
        let event = RoundEvent::from_json(json)?;
        self.handle(event);
        Ok(())
    }

    fn start_round(&mut self) {
        self.track.reset();
        self.bursts.clear();
        self.phase = RoundPhase::Running;
        self.animation.start();
        log::info!("Round started");
    }

    fn crash(&mut self, final_multiplier: f32, position: Vec2) {
        self.track.halt();
        let burst = BurstSimulator::new(
            position,
            self.surface.profile(),
            &self.palette,
            &mut self.rng,
        );
        log::info!(
            "Crashed at {:.2}x, burst of {} particles",
            final_multiplier,
            burst.len()
        );
        self.bursts.push(burst);

        if self.history.len() == HISTORY_LENGTH {
            self.history.pop_front();
        }
        self.history.push_back(final_multiplier);

        self.phase = RoundPhase::Crashed;
        // Keep animating so the burst plays even if no round was running
        self.animation.start();
    }

    /// Handle a frame callback: apply a settled resize, advance bursts and
    /// draw clear -> background -> grid -> track -> bursts. Returns whether
    /// the frame was drawn.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        self.poll_resize(timestamp_ms);

        let Some(tick) = self.animation.on_frame(timestamp_ms) else {
            return false;
        };

        for burst in self.bursts.iter_mut() {
            burst.update();
        }
        self.bursts.retain(BurstSimulator::is_active);

        self.surface.clear();
        self.surface.draw_background();
        self.surface.draw_grid();

        let profile = *self.surface.profile();
        if let Some((ctx, settings)) = self.surface.context_with_settings() {
            self.track
                .draw(ctx, &profile, settings, tick.timestamp_ms / 1000.0);
            for burst in &self.bursts {
                burst.draw(ctx);
            }
        }
        true
    }

    /// Forward a layout change to the surface (debounced)
    pub fn request_resize(&mut self, now_ms: f64) {
        self.surface.request_resize(now_ms);
    }

    /// Apply a settled resize and re-project the curve onto the new size
    pub fn poll_resize(&mut self, now_ms: f64) -> bool {
        if !self.surface.poll_resize(now_ms) {
            return false;
        }
        self.track.remap(self.surface.viewport());
        true
    }

    /// Override the quality preset. Pacing changes at once; bursts already
    /// in flight keep their particle count.
    pub fn set_quality(&mut self, preset: QualityPreset, signals: &DeviceSignals) {
        let profile = self.surface.set_quality(preset, signals);
        self.animation.set_target_fps(profile.target_fps);
    }

    /// Stop drawing; points and bursts are kept
    pub fn stop(&mut self) {
        self.animation.stop();
    }

    /// Resume drawing after [`stop`](Self::stop)
    pub fn resume(&mut self) {
        self.animation.start();
    }

    pub fn head_pose(&self) -> Option<HeadPose> {
        self.track.head_pose()
    }

    pub fn profile(&self) -> &PerformanceProfile {
        self.surface.profile()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn track(&self) -> &TrajectoryTrack {
        &self.track
    }

    pub fn bursts(&self) -> &[BurstSimulator] {
        &self.bursts
    }

    pub fn surface(&self) -> &Surface<H> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface<H> {
        &mut self.surface
    }

    pub fn animation(&self) -> &AnimationLoop<S> {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationLoop<S> {
        &mut self.animation
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    pub fn fps(&self) -> u32 {
        self.animation.fps()
    }

    /// Recent crash multipliers, oldest first
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn last_crash(&self) -> Option<f32> {
        self.history.back().copied()
    }
}
