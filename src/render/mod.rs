//! 2D drawing module
//!
//! Everything the core draws goes through [`DrawContext`], a small slice of the
//! canvas 2D API. The browser build implements it for
//! `CanvasRenderingContext2d`; tests and the native binary use
//! [`RecordingContext`].

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod context;
pub mod recording;

pub use context::{Color, DrawContext};
pub use recording::{DrawCommand, RecordingContext};
