//! Device-adaptive performance profile
//!
//! Derived once from hardware signals when the surface is created; never
//! changes afterwards.

use serde::{Deserialize, Serialize};

/// Minimum logical cores for the high-end profile
pub const MIN_CORES: u32 = 4;
/// Minimum device memory (GB) for the high-end profile
pub const MIN_MEMORY_GB: f32 = 2.0;
/// Minimum viewport width (CSS px) for the high-end profile
pub const MIN_VIEWPORT_WIDTH: f32 = 768.0;

/// Raw capability signals reported by the host.
///
/// `None` means the host did not expose the signal (e.g. `navigator.deviceMemory`
/// is Chromium-only).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceSignals {
    pub hardware_concurrency: Option<u32>,
    pub device_memory_gb: Option<f32>,
    pub viewport_width: Option<f32>,
}

/// Tuning knobs trading visual fidelity for frame budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    /// Particles spawned per crash burst
    pub particle_budget: usize,
    pub target_fps: u32,
    /// Glow around the trajectory stroke
    pub shadows: bool,
    pub blur: bool,
}

impl PerformanceProfile {
    pub const LOW_END: Self = Self {
        particle_budget: 10,
        target_fps: 30,
        shadows: false,
        blur: false,
    };

    pub const HIGH_END: Self = Self {
        particle_budget: 20,
        target_fps: 60,
        shadows: true,
        blur: true,
    };

    /// Time available per frame at the target rate
    pub fn frame_budget_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1) as f64
    }

    pub fn is_low_end(&self) -> bool {
        *self == Self::LOW_END
    }
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self::LOW_END
    }
}

/// Classify a device. Any missing signal counts as low-end.
pub fn detect_performance(signals: &DeviceSignals) -> PerformanceProfile {
    let (Some(cores), Some(memory), Some(width)) = (
        signals.hardware_concurrency,
        signals.device_memory_gb,
        signals.viewport_width,
    ) else {
        log::warn!("Device signal missing ({:?}), using low-end profile", signals);
        return PerformanceProfile::LOW_END;
    };

    // NaN fails every comparison, so guard it explicitly
    let low_end = cores < MIN_CORES
        || !(memory >= MIN_MEMORY_GB)
        || !(width >= MIN_VIEWPORT_WIDTH);

    if low_end {
        PerformanceProfile::LOW_END
    } else {
        PerformanceProfile::HIGH_END
    }
}
