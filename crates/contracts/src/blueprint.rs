//! CaptureBlueprint - Config Loader output
//!
//! Describes a complete capture setup: cached camera settings, acquisition
//! cadence, recording options, and the emulated device used when no hardware
//! is attached.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete capture configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Cached camera settings, re-applied on every (re)connection
    #[serde(default)]
    pub camera: CameraConfig,

    /// Acquisition loop cadence
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Recording options
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Emulated device parameters
    #[serde(default)]
    pub emulator: EmulatorConfig,
}

/// Cached camera settings
///
/// These survive reconnections: the connection manager re-applies them on
/// every successful initialize. They round-trip through the blueprint, which
/// is the persistence contract for the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Operating mode to activate, e.g. "MODE_9_15FPS_700" (None = device default)
    #[serde(default)]
    pub selected_usecase: Option<String>,

    /// Auto exposure toggle
    #[serde(default)]
    pub auto_exposure: bool,

    /// Remembered manual exposure in microseconds (0 = leave device value)
    #[serde(default = "default_exposure")]
    pub current_exposure: u32,

    /// Requested frame rate in Hz (snapped to the device's supported range)
    #[serde(default)]
    pub frame_rate: Option<u32>,
}

fn default_exposure() -> u32 {
    2000
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            selected_usecase: None,
            auto_exposure: false,
            current_exposure: default_exposure(),
            frame_rate: None,
        }
    }
}

/// Acquisition loop cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Host tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    10
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Recording options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Include the raw 3D pointcloud stream in recordings
    #[serde(default)]
    pub record_pointcloud: bool,

    /// Recording directory to open at startup (None = wait for host events)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Emulated device parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Frame production rate (Hz)
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// Frame width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Constant skew of the emulated device clock against the host clock (seconds)
    #[serde(default)]
    pub clock_skew_secs: f64,

    /// Drop the connection after this many frames (None = never)
    #[serde(default)]
    pub outage_after_frames: Option<u64>,

    /// Number of failed initialize attempts before an outage heals
    #[serde(default = "default_outage_init_failures")]
    pub outage_init_failures: u32,
}

fn default_frequency_hz() -> f64 {
    15.0
}

fn default_width() -> u32 {
    224
}

fn default_height() -> u32 {
    171
}

fn default_outage_init_failures() -> u32 {
    1
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency_hz(),
            width: default_width(),
            height: default_height(),
            clock_skew_secs: 0.0,
            outage_after_frames: None,
            outage_init_failures: default_outage_init_failures(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_blueprint_uses_defaults() {
        let blueprint: CaptureBlueprint = toml::from_str("").unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.camera.current_exposure, 2000);
        assert!(!blueprint.camera.auto_exposure);
        assert_eq!(blueprint.acquisition.tick_interval_ms, 10);
        assert!(!blueprint.recording.record_pointcloud);
        assert_eq!(blueprint.emulator.width, 224);
        assert_eq!(blueprint.emulator.height, 171);
    }

    #[test]
    fn test_blueprint_roundtrip() {
        let mut blueprint = CaptureBlueprint::default();
        blueprint.camera.selected_usecase = Some("MODE_9_15FPS_700".to_string());
        blueprint.recording.record_pointcloud = true;

        let toml = toml::to_string(&blueprint).unwrap();
        let parsed: CaptureBlueprint = toml::from_str(&toml).unwrap();
        assert_eq!(
            parsed.camera.selected_usecase.as_deref(),
            Some("MODE_9_15FPS_700")
        );
        assert!(parsed.recording.record_pointcloud);
    }
}
