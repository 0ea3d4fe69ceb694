//! Platform abstraction layer
//!
//! Browser bindings for:
//! - The canvas surface host (layout box, DPR, backing store, 2d context)
//! - Device capability signals
//! - `requestAnimationFrame` scheduling and the `performance.now()` clock

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{CanvasHost, RafScheduler, performance_now, read_device_signals};
