//! Visual settings and quality override
//!
//! Persisted in LocalStorage as JSON; every field has a default so partial
//! documents load.

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, Result};
use crate::profile::{DeviceSignals, PerformanceProfile, detect_performance};
use crate::render::Color;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    /// Detect from device signals
    #[default]
    Auto,
    Low,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Auto => "Auto",
            QualityPreset::Low => "Low",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(QualityPreset::Auto),
            "low" => Some(QualityPreset::Low),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Resolve to a concrete profile
    pub fn profile(&self, signals: &DeviceSignals) -> PerformanceProfile {
        match self {
            QualityPreset::Auto => detect_performance(signals),
            QualityPreset::Low => PerformanceProfile::LOW_END,
            QualityPreset::High => PerformanceProfile::HIGH_END,
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality override
    pub quality: QualityPreset,

    // === Colours ===
    /// Trajectory stroke, glow and head marker core
    pub accent_color: Color,
    pub background_top: Color,
    pub background_bottom: Color,
    pub grid_color: Color,
    pub label_color: Color,
    pub label_font: String,
    /// Crash burst colours, picked uniformly per particle
    pub burst_palette: Vec<Color>,

    // === Geometry ===
    pub line_width: f32,
    /// Glow radius when the profile enables shadows
    pub glow_blur: f32,
    /// Outer head marker radius at full pulse
    pub head_radius: f32,

    // === Accessibility ===
    /// Hold the head marker at full size instead of pulsing
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Auto,

            accent_color: Color::new("#00e701"),
            background_top: Color::new("#0f212e"),
            background_bottom: Color::new("#071824"),
            grid_color: Color::new("#2f4553"),
            label_color: Color::new("#b1bad3"),
            label_font: "12px sans-serif".to_string(),
            burst_palette: vec![
                Color::new("#ff4d4d"),
                Color::new("#ff9f1a"),
                Color::new("#ffd32a"),
                Color::new("#ffffff"),
            ],

            line_width: 3.0,
            glow_blur: 15.0,
            head_radius: 8.0,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (other fields default)
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CurveError::InvalidSettings)
    }

    pub fn to_json(&self) -> String {
        // Plain struct of strings and numbers; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Burst palette, falling back to the accent colour when empty
    pub fn palette(&self) -> Vec<Color> {
        if self.burst_palette.is_empty() {
            vec![self.accent_color.clone()]
        } else {
            self.burst_palette.clone()
        }
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "crash_curve_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            let _ = storage.set_item(Self::STORAGE_KEY, &self.to_json());
            log::info!("Settings saved");
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!(QualityPreset::from_str("LOW"), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::from_str("high"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("Auto"), Some(QualityPreset::Auto));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_preset_overrides_detection() {
        let weak = DeviceSignals::default();
        assert_eq!(QualityPreset::High.profile(&weak), PerformanceProfile::HIGH_END);
        assert_eq!(QualityPreset::Auto.profile(&weak), PerformanceProfile::LOW_END);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r##"{"quality":"Low","line_width":5.0}"##).unwrap();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert_eq!(settings.line_width, 5.0);
        assert_eq!(settings.accent_color, Settings::default().accent_color);
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.reduced_motion = true;
        let back = Settings::from_json(&settings.to_json()).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(CurveError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_empty_palette_falls_back_to_accent() {
        let settings = Settings {
            burst_palette: Vec::new(),
            ..Settings::default()
        };
        assert_eq!(settings.palette(), vec![settings.accent_color.clone()]);
    }
}
