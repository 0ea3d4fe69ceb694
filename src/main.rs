//! Crash Curve entry point
//!
//! On the web this exposes a `CrashCurve` handle to the page script, which
//! feeds it round events from the game socket. Natively it replays a scripted
//! round headlessly and logs what would have been drawn.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use crash_curve::consts::RESIZE_DEBOUNCE_MS;
    use crash_curve::platform::{CanvasHost, RafScheduler, performance_now, read_device_signals};
    use crash_curve::{CrashScene, QualityPreset, RoundEvent, Settings, Surface};
    use glam::Vec2;

    type WebScene = CrashScene<CanvasHost, RafScheduler>;

    /// Handle owned by the page script
    #[wasm_bindgen]
    pub struct CrashCurve {
        scene: Rc<RefCell<WebScene>>,
    }

    #[wasm_bindgen]
    impl CrashCurve {
        /// Attach to the `<canvas>` with the given id
        pub fn mount(canvas_id: &str) -> Result<CrashCurve, JsValue> {
            let host = CanvasHost::from_element_id(canvas_id)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            let settings = Settings::load();
            let surface = Surface::new(host, &read_device_signals(), settings);

            let scheduler = RafScheduler::new();
            let seed = js_sys::Date::now() as u64;
            let scene = Rc::new(RefCell::new(CrashScene::new(
                surface,
                scheduler.clone(),
                seed,
            )));

            // Frame callback
            {
                let scene = scene.clone();
                scheduler.set_callback(move |timestamp: f64| {
                    if let Ok(mut s) = scene.try_borrow_mut() {
                        s.frame(timestamp);
                    }
                });
            }

            setup_resize_listener(scene.clone());

            log::info!("Crash curve mounted on #{}", canvas_id);
            Ok(CrashCurve { scene })
        }

        /// Apply a JSON round event (`{"type":"sample","time":1.2,"multiplier":1.07}`)
        pub fn push_event(&self, json: &str) -> Result<(), JsValue> {
            self.scene
                .borrow_mut()
                .handle_json(json)
                .map_err(|e| {
                    log::warn!("{}", e);
                    JsValue::from_str(&e.to_string())
                })
        }

        pub fn round_started(&self) {
            self.scene.borrow_mut().handle(RoundEvent::RoundStarted);
        }

        pub fn sample(&self, time: f32, multiplier: f32) {
            self.scene
                .borrow_mut()
                .handle(RoundEvent::Sample { time, multiplier });
        }

        pub fn round_crashed(&self, final_multiplier: f32, x: f32, y: f32) {
            self.scene.borrow_mut().handle(RoundEvent::RoundCrashed {
                final_multiplier,
                position: Vec2::new(x, y),
            });
        }

        /// `[x, y, multiplier, angle]` of the curve head, or undefined
        pub fn head_pose(&self) -> Option<Vec<f32>> {
            self.scene
                .borrow()
                .head_pose()
                .map(|p| vec![p.position.x, p.position.y, p.multiplier, p.angle])
        }

        pub fn particle_budget(&self) -> usize {
            self.scene.borrow().profile().particle_budget
        }

        pub fn target_fps(&self) -> u32 {
            self.scene.borrow().profile().target_fps
        }

        pub fn shadows_enabled(&self) -> bool {
            self.scene.borrow().profile().shadows
        }

        pub fn fps(&self) -> u32 {
            self.scene.borrow().fps()
        }

        /// Recent crash multipliers, oldest first
        pub fn history(&self) -> Vec<f32> {
            self.scene.borrow().history().collect()
        }

        /// Override quality ("auto", "low" or "high") and remember it
        pub fn set_quality(&self, name: &str) -> Result<(), JsValue> {
            let preset = QualityPreset::from_str(name)
                .ok_or_else(|| JsValue::from_str(&format!("unknown quality: {}", name)))?;
            let mut scene = self.scene.borrow_mut();
            scene.set_quality(preset, &read_device_signals());
            scene.surface().settings().save();
            Ok(())
        }

        pub fn stop(&self) {
            self.scene.borrow_mut().stop();
        }

        pub fn resume(&self) {
            self.scene.borrow_mut().resume();
        }
    }

    /// Window resizes are debounced: each event pushes the deadline out and
    /// arms a timer that applies the resize once the window has been quiet.
    fn setup_resize_listener(scene: Rc<RefCell<WebScene>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            match scene.try_borrow_mut() {
                Ok(mut s) => s.request_resize(performance_now()),
                Err(_) => return,
            }

            let scene = scene.clone();
            let settle = Closure::once_into_js(move || {
                if let Ok(mut s) = scene.try_borrow_mut() {
                    s.poll_resize(performance_now());
                }
            });
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    settle.unchecked_ref(),
                    RESIZE_DEBOUNCE_MS as i32 + 1,
                );
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Crash curve module loaded");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let crash_at: f32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .filter(|m: &f32| *m >= 1.0)
        .unwrap_or(4.2);

    log::info!("Crash curve (native) - headless replay, crash at {:.2}x", crash_at);
    log::info!("The renderer runs in the browser - build with `trunk serve` for the web version");

    replay::run(crash_at);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    use crash_curve::animation::ManualScheduler;
    use crash_curve::surface::HeadlessHost;
    use crash_curve::{CrashScene, DeviceSignals, RoundEvent, Settings, Surface};

    /// Server tick interval for samples
    const SAMPLE_INTERVAL_SECS: f32 = 0.1;
    /// Multiplier growth rate: m(t) = e^(GROWTH * t)
    const GROWTH: f32 = 0.06;
    const VSYNC_MS: f64 = 1000.0 / 60.0;

    /// Play one round through the scene against a recording context
    pub fn run(crash_at: f32) {
        let signals = DeviceSignals {
            hardware_concurrency: Some(8),
            device_memory_gb: Some(8.0),
            viewport_width: Some(1280.0),
        };
        let surface = Surface::new(HeadlessHost::new(1280.0, 720.0, 2.0), &signals, Settings::load());
        let mut scene = CrashScene::new(surface, ManualScheduler::new(), 7);

        let mut now_ms = 0.0;
        let mut frames = 0u32;
        let mut step = |scene: &mut CrashScene<HeadlessHost, ManualScheduler>, now_ms: &mut f64| {
            *now_ms += VSYNC_MS;
            if scene.frame(*now_ms) {
                frames += 1;
            }
        };

        scene.handle(RoundEvent::RoundStarted);
        let mut t = 0.0f32;
        loop {
            let multiplier = (GROWTH * t).exp();
            if multiplier >= crash_at {
                break;
            }
            scene.handle(RoundEvent::Sample { time: t, multiplier });
            // ~6 frames per 100ms sample
            for _ in 0..6 {
                step(&mut scene, &mut now_ms);
            }
            t += SAMPLE_INTERVAL_SECS;
        }

        let Some(head) = scene.head_pose() else {
            log::warn!("Round crashed before the first sample");
            return;
        };
        scene.handle(RoundEvent::RoundCrashed {
            final_multiplier: crash_at,
            position: head.position,
        });
        let burst_size = scene.bursts().first().map_or(0, |b| b.len());

        while !scene.bursts().is_empty() {
            step(&mut scene, &mut now_ms);
        }
        scene.stop();

        let commands = scene
            .surface_mut()
            .context()
            .map_or(0, |ctx| ctx.commands().len());

        log::info!(
            "Profile {:?}, {} points, head at ({:.1}, {:.1}) {:.2}x heading {:.3} rad",
            scene.profile(),
            scene.track().len(),
            head.position.x,
            head.position.y,
            head.multiplier,
            head.angle
        );
        log::info!(
            "Burst of {} particles, {} frames drawn, {} draw commands, {} fps",
            burst_size,
            frames,
            commands,
            scene.fps()
        );
        println!(
            "crashed at {:.2}x after {:.1}s: {} points, {} frames",
            crash_at,
            t,
            scene.track().len(),
            frames
        );
    }
}
