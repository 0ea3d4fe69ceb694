//! Frame loop state machine
//!
//! `Idle -> Running -> Idle`. While running, every frame callback re-requests
//! the next one from an injected [`FrameScheduler`] (`requestAnimationFrame` on
//! the web, [`ManualScheduler`] in tests). The loop only decides *whether* a
//! frame runs; the caller does the update/draw work with the returned
//! [`FrameTick`].

use serde::{Deserialize, Serialize};

/// Frames whose interval undershoots the pacing target by less than this still run
pub const PACER_TOLERANCE_MS: f64 = 1.0;
/// Frames averaged for the FPS readout
pub const FPS_WINDOW: usize = 60;

/// Handle for a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRequest(pub i32);

/// Source of vsync-aligned frame callbacks
pub trait FrameScheduler {
    /// Ask for one callback on the next frame; `None` if the host refused
    fn request_frame(&mut self) -> Option<FrameRequest>;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

/// A frame the caller should update and draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTick {
    /// Host timestamp (ms, `performance.now()` clock)
    pub timestamp_ms: f64,
    /// Time since the previous rendered frame; 0 on the first frame after start
    pub delta_ms: f64,
    /// Rendered frames since the loop was created
    pub frame_index: u64,
}

/// Drops vsync callbacks that arrive ahead of the target frame rate.
///
/// Renders are scheduled against a deadline that advances by a fixed
/// interval, so slack from a display whose refresh is not a multiple of the
/// target carries over instead of being lost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePacer {
    interval_ms: f64,
    next: Option<f64>,
}

impl FramePacer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval_ms: 1000.0 / target_fps.max(1) as f64,
            next: None,
        }
    }

    /// True if a frame at `timestamp_ms` should render
    pub fn ready(&mut self, timestamp_ms: f64) -> bool {
        let next = match self.next {
            None => timestamp_ms + self.interval_ms,
            Some(deadline) if timestamp_ms + PACER_TOLERANCE_MS < deadline => return false,
            Some(deadline) => {
                let next = deadline + self.interval_ms;
                // More than one interval behind (stall or slow display): resync
                if next <= timestamp_ms {
                    timestamp_ms + self.interval_ms
                } else {
                    next
                }
            }
        };
        self.next = Some(next);
        true
    }

    pub fn reset(&mut self) {
        self.next = None;
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }
}

/// Rolling FPS estimate over the last [`FPS_WINDOW`] rendered frames
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    recorded: usize,
    fps: u32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            recorded: 0,
            fps: 0,
        }
    }
}

impl FrameStats {
    pub fn record(&mut self, timestamp_ms: f64) {
        self.frame_times[self.frame_index] = timestamp_ms;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        self.recorded = (self.recorded + 1).min(FPS_WINDOW);

        // Oldest sample is the one about to be overwritten once the window is full
        if self.recorded < 2 {
            return;
        }
        let oldest = if self.recorded == FPS_WINDOW {
            self.frame_times[self.frame_index]
        } else {
            self.frame_times[0]
        };
        let elapsed = timestamp_ms - oldest;
        if elapsed > 0.0 {
            self.fps = ((self.recorded - 1) as f64 * 1000.0 / elapsed).round() as u32;
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run/stop frame loop over an injected scheduler
#[derive(Debug)]
pub struct AnimationLoop<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    pending: Option<FrameRequest>,
    pacer: FramePacer,
    last_timestamp: Option<f64>,
    frame_index: u64,
    stats: FrameStats,
}

impl<S: FrameScheduler> AnimationLoop<S> {
    pub fn new(scheduler: S, target_fps: u32) -> Self {
        Self {
            scheduler,
            state: LoopState::Idle,
            pending: None,
            pacer: FramePacer::new(target_fps),
            last_timestamp: None,
            frame_index: 0,
            stats: FrameStats::default(),
        }
    }

    /// Begin requesting frames. No-op if already running.
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        self.last_timestamp = None;
        self.pacer.reset();
        self.stats.reset();
        self.schedule();
        log::debug!("Animation loop started");
    }

    /// Go idle and cancel the pending frame. Buffered scene state is untouched.
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        self.state = LoopState::Idle;
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
        log::debug!("Animation loop stopped");
    }

    /// Handle a scheduler callback.
    ///
    /// Returns a tick when the caller should update and draw. While running
    /// the next frame is always re-requested, even when pacing skips this one.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Option<FrameTick> {
        self.pending = None;
        if self.state != LoopState::Running {
            return None;
        }
        self.schedule();

        if !self.pacer.ready(timestamp_ms) {
            return None;
        }

        let delta_ms = self
            .last_timestamp
            .map_or(0.0, |last| (timestamp_ms - last).max(0.0));
        self.last_timestamp = Some(timestamp_ms);
        self.stats.record(timestamp_ms);

        let tick = FrameTick {
            timestamp_ms,
            delta_ms,
            frame_index: self.frame_index,
        };
        self.frame_index += 1;
        Some(tick)
    }

    fn schedule(&mut self) {
        self.pending = self.scheduler.request_frame();
        if self.pending.is_none() {
            log::warn!("Frame request refused by host");
        }
    }

    /// Re-pace to a new frame rate; takes effect from the next frame
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.pacer = FramePacer::new(target_fps);
        log::info!(
            "Frame pacing at {} fps ({:.1} ms)",
            target_fps,
            self.pacer.interval_ms()
        );
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn fps(&self) -> u32 {
        self.stats.fps()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

/// Scheduler stepped by hand: records requests and cancellations
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next_id: i32,
    outstanding: Vec<FrameRequest>,
    requested: u32,
    cancelled: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests not yet fired or cancelled
    pub fn outstanding(&self) -> &[FrameRequest] {
        &self.outstanding
    }

    /// Fire the oldest outstanding request, as the display would on vsync
    pub fn fire(&mut self) -> Option<FrameRequest> {
        if self.outstanding.is_empty() {
            None
        } else {
            Some(self.outstanding.remove(0))
        }
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    pub fn cancelled(&self) -> u32 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        self.next_id += 1;
        self.requested += 1;
        let request = FrameRequest(self.next_id);
        self.outstanding.push(request);
        Some(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.cancelled += 1;
        self.outstanding.retain(|r| *r != request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VSYNC_60: f64 = 1000.0 / 60.0;

    fn running(target_fps: u32) -> AnimationLoop<ManualScheduler> {
        let mut anim = AnimationLoop::new(ManualScheduler::new(), target_fps);
        anim.start();
        anim
    }

    #[test]
    fn test_start_requests_one_frame() {
        let anim = running(60);
        assert!(anim.is_running());
        assert_eq!(anim.scheduler().requested(), 1);
        assert_eq!(anim.scheduler().outstanding().len(), 1);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut anim = running(60);
        anim.start();
        assert_eq!(anim.scheduler().requested(), 1);
    }

    #[test]
    fn test_each_frame_rerequests() {
        let mut anim = running(60);
        for i in 0..5 {
            anim.scheduler_mut().fire();
            let tick = anim.on_frame(i as f64 * VSYNC_60).unwrap();
            assert_eq!(tick.frame_index, i as u64);
            assert_eq!(anim.scheduler().outstanding().len(), 1);
        }
        assert_eq!(anim.scheduler().requested(), 6);
    }

    #[test]
    fn test_stop_cancels_pending_and_ignores_late_frames() {
        let mut anim = running(60);
        anim.stop();
        assert_eq!(anim.state(), LoopState::Idle);
        assert_eq!(anim.scheduler().cancelled(), 1);
        assert!(anim.scheduler().outstanding().is_empty());
        assert!(anim.pending().is_none());

        // A callback already in flight renders nothing and does not re-arm
        assert!(anim.on_frame(100.0).is_none());
        assert_eq!(anim.scheduler().requested(), 1);

        anim.stop();
        assert_eq!(anim.scheduler().cancelled(), 1);
    }

    #[test]
    fn test_restart_resets_delta() {
        let mut anim = running(60);
        anim.on_frame(0.0);
        anim.on_frame(VSYNC_60);
        anim.stop();
        anim.start();
        let tick = anim.on_frame(5000.0).unwrap();
        assert_eq!(tick.delta_ms, 0.0);
    }

    #[test]
    fn test_thirty_fps_profile_renders_every_other_vsync() {
        let mut anim = running(30);
        let rendered = (0..60)
            .filter(|i| anim.on_frame(*i as f64 * VSYNC_60).is_some())
            .count();
        assert_eq!(rendered, 30);
        // Skipped frames still keep the loop alive
        assert_eq!(anim.scheduler().requested(), 61);
    }

    /// Frames rendered over one second of vsync callbacks at `refresh_hz`
    fn rendered_in_one_second(target_fps: u32, refresh_hz: u32) -> usize {
        let mut anim = running(target_fps);
        let vsync = 1000.0 / refresh_hz as f64;
        (0..refresh_hz)
            .filter(|i| anim.on_frame(*i as f64 * vsync).is_some())
            .count()
    }

    #[test]
    fn test_pacing_holds_target_on_high_refresh_displays() {
        for hz in [60, 75, 90, 100, 120, 144] {
            let rendered = rendered_in_one_second(60, hz);
            assert!(
                (59..=60).contains(&rendered),
                "target 60 on {} Hz rendered {}",
                hz,
                rendered
            );
        }
        for hz in [60, 75, 144] {
            let rendered = rendered_in_one_second(30, hz);
            assert!(
                (29..=30).contains(&rendered),
                "target 30 on {} Hz rendered {}",
                hz,
                rendered
            );
        }
    }

    #[test]
    fn test_slow_display_renders_every_frame() {
        // 30 Hz display under a 60 fps target: never skip, never fall behind
        assert_eq!(rendered_in_one_second(60, 30), 30);
    }

    #[test]
    fn test_pacer_resyncs_after_stall() {
        let mut pacer = FramePacer::new(60);
        assert!(pacer.ready(0.0));
        assert!(pacer.ready(500.0));
        // No burst of catch-up frames after the stall
        assert!(!pacer.ready(501.0));
        assert!(pacer.ready(500.0 + pacer.interval_ms()));
    }

    #[test]
    fn test_set_target_fps_repaces() {
        let mut anim = running(60);
        anim.set_target_fps(30);
        let rendered = (0..60)
            .filter(|i| anim.on_frame(*i as f64 * VSYNC_60).is_some())
            .count();
        assert_eq!(rendered, 30);
    }

    #[test]
    fn test_delta_between_rendered_frames() {
        let mut anim = running(60);
        assert_eq!(anim.on_frame(1000.0).unwrap().delta_ms, 0.0);
        let tick = anim.on_frame(1000.0 + VSYNC_60).unwrap();
        assert!((tick.delta_ms - VSYNC_60).abs() < 1e-9);
    }

    #[test]
    fn test_fps_estimate() {
        let mut anim = running(60);
        for i in 0..120 {
            anim.on_frame(i as f64 * VSYNC_60);
        }
        assert_eq!(anim.fps(), 60);
    }

    #[test]
    fn test_refused_request_keeps_running() {
        struct Refusing;
        impl FrameScheduler for Refusing {
            fn request_frame(&mut self) -> Option<FrameRequest> {
                None
            }
            fn cancel_frame(&mut self, _request: FrameRequest) {}
        }

        let mut anim = AnimationLoop::new(Refusing, 60);
        anim.start();
        assert!(anim.is_running());
        assert!(anim.pending().is_none());
        anim.stop();
        assert!(!anim.is_running());
    }
}
