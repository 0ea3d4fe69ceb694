//! Full round through the public API against a recording host

use crash_curve::surface::HeadlessHost;
use crash_curve::{
    CrashScene, DeviceSignals, DrawCommand, ManualScheduler, PerformanceProfile, RoundEvent,
    RoundPhase, Settings, Surface,
};
use glam::Vec2;

const VSYNC_MS: f64 = 1000.0 / 60.0;

fn high_end() -> DeviceSignals {
    DeviceSignals {
        hardware_concurrency: Some(8),
        device_memory_gb: Some(8.0),
        viewport_width: Some(1440.0),
    }
}

fn scene(signals: &DeviceSignals) -> CrashScene<HeadlessHost, ManualScheduler> {
    let surface = Surface::new(
        HeadlessHost::new(600.0, 300.0, 1.0),
        signals,
        Settings::default(),
    );
    CrashScene::new(surface, ManualScheduler::new(), 2024)
}

fn sample(time: f32, multiplier: f32) -> RoundEvent {
    RoundEvent::Sample { time, multiplier }
}

#[test]
fn test_round_grows_then_crashes_into_burst() {
    let mut s = scene(&high_end());
    assert_eq!(s.profile(), &PerformanceProfile::HIGH_END);

    s.handle(RoundEvent::RoundStarted);
    for (t, m) in [(0.0, 1.0), (5.0, 2.0), (10.0, 4.0), (15.0, 6.0)] {
        s.handle(sample(t, m));
    }

    assert_eq!(s.track().len(), 4);
    let head = s.head_pose().unwrap();
    assert_eq!(head.multiplier, 6.0);
    // 15s of 30 across 600px, 6x is half way up 1x..11x
    assert!((head.position - Vec2::new(300.0, 150.0)).length() < 1e-3);
    let expected_angle = (-60.0f32).atan2(100.0);
    assert!((head.angle - expected_angle).abs() < 1e-4);

    s.handle(RoundEvent::RoundCrashed {
        final_multiplier: 6.0,
        position: head.position,
    });
    assert_eq!(s.phase(), RoundPhase::Crashed);
    assert_eq!(s.bursts().len(), 1);
    let burst = &s.bursts()[0];
    assert_eq!(burst.origin(), head.position);
    assert_eq!(burst.len(), PerformanceProfile::HIGH_END.particle_budget);

    // The frozen curve keeps drawing while the burst plays out
    let mut now = 0.0;
    let mut drawn = 0;
    while !s.bursts().is_empty() {
        now += VSYNC_MS;
        if s.frame(now) {
            drawn += 1;
        }
        assert!(drawn < 1000, "burst never finished");
    }
    assert_eq!(s.track().len(), 4);
    assert_eq!(s.head_pose().unwrap().multiplier, 6.0);
    assert_eq!(s.last_crash(), Some(6.0));
}

#[test]
fn test_low_end_device_gets_small_burst_and_no_glow() {
    let signals = DeviceSignals {
        hardware_concurrency: Some(2),
        device_memory_gb: Some(1.0),
        viewport_width: Some(390.0),
    };
    let mut s = scene(&signals);
    assert_eq!(s.profile(), &PerformanceProfile::LOW_END);

    s.handle(RoundEvent::RoundStarted);
    s.handle(sample(0.0, 1.0));
    s.handle(sample(2.0, 1.3));
    s.handle(sample(4.0, 1.7));
    s.surface_mut().context().unwrap().clear_commands();

    assert!(s.frame(0.0));
    let ctx = s.surface_mut().context().unwrap();
    assert_eq!(
        ctx.count(|c| matches!(c, DrawCommand::SetShadow { blur, .. } if *blur > 0.0)),
        0
    );

    let head = s.head_pose().unwrap().position;
    s.handle(RoundEvent::RoundCrashed {
        final_multiplier: 1.7,
        position: head,
    });
    assert_eq!(s.bursts()[0].len(), PerformanceProfile::LOW_END.particle_budget);
}

#[test]
fn test_next_round_starts_clean() {
    let mut s = scene(&high_end());
    s.handle(RoundEvent::RoundStarted);
    s.handle(sample(1.0, 1.5));
    s.handle(sample(2.0, 2.5));
    s.handle(RoundEvent::RoundCrashed {
        final_multiplier: 2.5,
        position: Vec2::new(40.0, 255.0),
    });

    s.handle(RoundEvent::RoundStarted);
    assert!(s.head_pose().is_none());
    assert!(s.track().is_empty());
    assert!(s.bursts().is_empty());
    assert_eq!(s.phase(), RoundPhase::Running);
    assert_eq!(s.history().collect::<Vec<_>>(), vec![2.5]);
}

#[test]
fn test_json_events_drive_the_scene() {
    let mut s = scene(&high_end());
    s.handle_json(r#"{"type":"round_started"}"#).unwrap();
    s.handle_json(r#"{"type":"sample","time":3.0,"multiplier":1.5}"#)
        .unwrap();
    s.handle_json(r#"{"type":"sample","time":6.0,"multiplier":2.0}"#)
        .unwrap();
    assert!(s.handle_json("not json").is_err());
    assert_eq!(s.track().len(), 2);
    assert_eq!(s.head_pose().unwrap().multiplier, 2.0);
}

#[test]
fn test_stop_pauses_frames_without_losing_points() {
    let mut s = scene(&high_end());
    s.handle(RoundEvent::RoundStarted);
    s.handle(sample(1.0, 1.2));
    s.handle(sample(2.0, 1.4));
    assert!(s.frame(VSYNC_MS));

    s.stop();
    assert!(!s.is_running());
    assert!(s.animation().scheduler().outstanding().is_empty());
    assert!(!s.frame(2.0 * VSYNC_MS));
    assert_eq!(s.track().len(), 2);

    s.resume();
    assert!(s.frame(3.0 * VSYNC_MS));
}

#[test]
fn test_resize_burst_applies_once() {
    let mut s = scene(&high_end());
    s.handle(RoundEvent::RoundStarted);
    let writes = s.surface().host().backing_writes;

    // Drag the window: a flurry of layout changes 10ms apart
    for i in 0..10 {
        let width = 600.0 + 20.0 * i as f32;
        s.surface_mut().host_mut().layout = Some(Vec2::new(width, 300.0));
        s.request_resize(i as f64 * 10.0);
        s.frame(i as f64 * 10.0);
    }
    assert_eq!(s.surface().host().backing_writes, writes);

    // Quiet for the debounce window: one resize to the final size
    s.frame(90.0 + 150.0);
    assert_eq!(s.surface().host().backing_writes, writes + 1);
    assert_eq!(s.surface().viewport().width, 780.0);

    // Nothing changed since: further resizes are no-ops
    assert!(!s.surface_mut().resize());
    assert_eq!(s.surface().host().backing_writes, writes + 1);
}
