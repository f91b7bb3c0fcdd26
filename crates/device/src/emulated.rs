//! Emulated depth camera
//!
//! Stands in for the hardware SDK: produces paired IR/depth frames at the
//! active usecase's rate, stamps them with a skewed device clock, and can
//! drop its connection after a configured number of frames so reconnection
//! handling is exercisable without real hardware.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use contracts::{ContractError, DepthCamera, EmulatorConfig, FramePair, LensParameters};
use tracing::{debug, trace};

use crate::frames::build_frame_pair;

/// Operating mode preset: name, frame rate, exposure ceiling (µs)
struct UsecasePreset {
    name: &'static str,
    fps: u32,
    max_exposure: u32,
}

/// Royale-style usecase table of the Pico Flexx device family
const USECASES: &[UsecasePreset] = &[
    UsecasePreset { name: "MODE_9_5FPS_2000", fps: 5, max_exposure: 2000 },
    UsecasePreset { name: "MODE_9_10FPS_1000", fps: 10, max_exposure: 1000 },
    UsecasePreset { name: "MODE_9_15FPS_700", fps: 15, max_exposure: 700 },
    UsecasePreset { name: "MODE_9_25FPS_450", fps: 25, max_exposure: 450 },
    UsecasePreset { name: "MODE_5_35FPS_600", fps: 35, max_exposure: 600 },
    UsecasePreset { name: "MODE_5_45FPS_500", fps: 45, max_exposure: 500 },
    UsecasePreset { name: "MODE_MIXED_30_5", fps: 30, max_exposure: 600 },
    UsecasePreset { name: "MODE_MIXED_50_5", fps: 50, max_exposure: 500 },
];

const MIN_EXPOSURE: u32 = 8;
const IR_EXPOSURE: u32 = 200;

fn preset(name: &str) -> Option<&'static UsecasePreset> {
    USECASES.iter().find(|p| p.name == name)
}

/// Emulated depth camera
pub struct EmulatedCamera {
    config: EmulatorConfig,
    connected: bool,
    capturing: bool,
    closed: bool,
    usecase: &'static UsecasePreset,
    auto_exposure: bool,
    exposure: u32,
    frame_rate: u32,
    frame_index: u64,
    next_frame_at: Option<Instant>,
    recording_path: Option<PathBuf>,
    in_outage: bool,
    outage_init_failures_left: u32,
    next_outage_at: Option<u64>,
}

impl EmulatedCamera {
    pub fn new(config: EmulatorConfig) -> Self {
        let usecase = preset("MODE_9_15FPS_700").unwrap_or(&USECASES[0]);
        let next_outage_at = config.outage_after_frames;
        Self {
            config,
            connected: false,
            capturing: false,
            closed: false,
            usecase,
            auto_exposure: false,
            exposure: usecase.max_exposure,
            frame_rate: usecase.fps,
            frame_index: 0,
            next_frame_at: None,
            recording_path: None,
            in_outage: false,
            outage_init_failures_left: 0,
            next_outage_at,
        }
    }

    fn ensure_online(&self, operation: &str) -> Result<(), ContractError> {
        if self.connected && self.capturing {
            Ok(())
        } else {
            Err(ContractError::precondition(operation, "device not online"))
        }
    }

    /// Device clock: host unix time plus the configured constant skew
    fn device_now(&self) -> f64 {
        let unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        unix + self.config.clock_skew_secs
    }

    fn frame_interval(&self) -> Duration {
        let hz = self.config.frequency_hz.max(0.1);
        Duration::from_secs_f64(1.0 / hz)
    }

    /// Exposure the device reports having used for a frame
    fn effective_exposure(&self) -> u32 {
        if self.auto_exposure {
            // Emulated auto exposure wanders inside the usecase limits
            let span = self.usecase.max_exposure.saturating_sub(MIN_EXPOSURE);
            MIN_EXPOSURE + ((self.frame_index as u32 * 97) % span.max(1))
        } else {
            self.exposure
        }
    }

    fn begin_outage(&mut self) {
        debug!(frame_index = self.frame_index, "emulated camera entering outage");
        self.in_outage = true;
        self.connected = false;
        self.capturing = false;
        self.outage_init_failures_left = self.config.outage_init_failures;
    }
}

impl DepthCamera for EmulatedCamera {
    fn initialize(&mut self) -> bool {
        if self.closed {
            return false;
        }

        if self.in_outage {
            if self.outage_init_failures_left > 0 {
                self.outage_init_failures_left -= 1;
                trace!(
                    remaining = self.outage_init_failures_left,
                    "emulated camera still in outage"
                );
                return false;
            }
            debug!("emulated camera outage healed");
            self.in_outage = false;
            self.next_outage_at = self
                .config
                .outage_after_frames
                .map(|n| self.frame_index + n);
        }

        self.connected = true;
        self.capturing = true;
        self.next_frame_at = Some(Instant::now() + self.frame_interval());
        true
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn close(&mut self) {
        self.closed = true;
        self.connected = false;
        self.capturing = false;
    }

    fn get_frame(&mut self, timeout: Duration) -> Option<FramePair> {
        if !self.capturing {
            std::thread::sleep(timeout);
            return None;
        }

        if let Some(at) = self.next_outage_at {
            if self.frame_index >= at {
                self.begin_outage();
                std::thread::sleep(timeout);
                return None;
            }
        }

        let due = self.next_frame_at.unwrap_or_else(Instant::now);
        let now = Instant::now();
        if due > now {
            let remaining = due - now;
            if remaining > timeout {
                std::thread::sleep(timeout);
                return None;
            }
            std::thread::sleep(remaining);
        }
        self.next_frame_at = Some(due + self.frame_interval());

        self.frame_index += 1;
        let pair = build_frame_pair(
            self.config.width,
            self.config.height,
            self.device_now(),
            self.frame_index,
            [IR_EXPOSURE, self.effective_exposure()],
        );
        Some(pair)
    }

    fn usecases(&self) -> Result<Vec<String>, ContractError> {
        self.ensure_online("usecases")?;
        Ok(USECASES.iter().map(|p| p.name.to_string()).collect())
    }

    fn current_usecase(&self) -> Result<String, ContractError> {
        self.ensure_online("current_usecase")?;
        Ok(self.usecase.name.to_string())
    }

    fn set_usecase(&mut self, usecase: &str) -> Result<(), ContractError> {
        self.ensure_online("set_usecase")?;
        let preset = preset(usecase).ok_or_else(|| {
            ContractError::device_control("usecase", format!("unknown usecase '{usecase}'"))
        })?;
        self.usecase = preset;
        self.frame_rate = preset.fps;
        // The device clamps exposure implicitly when the new ceiling is lower
        if self.exposure > preset.max_exposure {
            self.exposure = preset.max_exposure;
        }
        Ok(())
    }

    fn exposure_mode(&self) -> Result<bool, ContractError> {
        self.ensure_online("exposure_mode")?;
        Ok(self.auto_exposure)
    }

    fn set_exposure_mode(&mut self, auto: bool) -> Result<bool, ContractError> {
        self.ensure_online("set_exposure_mode")?;
        self.auto_exposure = auto;
        Ok(self.auto_exposure)
    }

    fn exposure_limits(&self) -> Result<(u32, u32), ContractError> {
        self.ensure_online("exposure_limits")?;
        Ok((MIN_EXPOSURE, self.usecase.max_exposure))
    }

    fn set_exposure(&mut self, exposure: u32) -> Result<(), ContractError> {
        self.ensure_online("set_exposure")?;
        if self.auto_exposure {
            return Err(ContractError::device_control(
                "exposure",
                "manual exposure rejected while auto exposure is active",
            ));
        }
        self.exposure = exposure.clamp(MIN_EXPOSURE, self.usecase.max_exposure);
        Ok(())
    }

    fn frame_rate(&self) -> Result<u32, ContractError> {
        self.ensure_online("frame_rate")?;
        Ok(self.frame_rate)
    }

    fn set_frame_rate(&mut self, rate: u32) -> Result<(), ContractError> {
        self.ensure_online("set_frame_rate")?;
        if rate == 0 || rate > self.usecase.fps {
            return Err(ContractError::device_control(
                "frame_rate",
                format!("rate {rate} outside 1..={}", self.usecase.fps),
            ));
        }
        self.frame_rate = rate;
        Ok(())
    }

    fn max_frame_rate(&self) -> Result<u32, ContractError> {
        self.ensure_online("max_frame_rate")?;
        Ok(self.usecase.fps)
    }

    fn lens_parameters(&self) -> Result<LensParameters, ContractError> {
        self.ensure_online("lens_parameters")?;
        Ok(LensParameters {
            principal_point: (self.config.width as f64 / 2.0, self.config.height as f64 / 2.0),
            focal_length: (210.0, 210.0),
            distortion_tangential: (0.0, 0.0),
            distortion_radial: [0.21, -0.52, 0.31],
        })
    }

    fn start_recording(&mut self, path: &Path) -> Result<(), ContractError> {
        self.ensure_online("start_recording")?;
        if self.recording_path.is_some() {
            return Err(ContractError::recording_io(
                path.display().to_string(),
                "a recording stream is already open",
            ));
        }
        std::fs::write(path, b"ROYALE-EMULATED\n").map_err(|e| {
            ContractError::recording_io(path.display().to_string(), e.to_string())
        })?;
        debug!(path = %path.display(), "emulated recording stream opened");
        self.recording_path = Some(path.to_path_buf());
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), ContractError> {
        match self.recording_path.take() {
            Some(path) => {
                debug!(path = %path.display(), "emulated recording stream closed");
                Ok(())
            }
            None => Err(ContractError::recording_io(
                "<none>",
                "no recording stream is open",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> EmulatorConfig {
        EmulatorConfig {
            frequency_hz: 1000.0,
            clock_skew_secs: -3600.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_initialize_then_frames_flow() {
        let mut camera = EmulatedCamera::new(fast_config());
        assert!(camera.initialize());
        assert!(camera.is_connected());

        let pair = camera.get_frame(Duration::from_millis(20));
        assert!(pair.is_some());
    }

    #[test]
    fn test_queries_require_online() {
        let camera = EmulatedCamera::new(fast_config());
        assert!(matches!(
            camera.current_usecase(),
            Err(ContractError::Precondition { .. })
        ));
    }

    #[test]
    fn test_usecase_switch_clamps_exposure() {
        let mut camera = EmulatedCamera::new(fast_config());
        camera.initialize();
        camera.set_usecase("MODE_9_5FPS_2000").unwrap();
        camera.set_exposure(2000).unwrap();
        camera.set_usecase("MODE_5_45FPS_500").unwrap();
        assert_eq!(camera.exposure_limits().unwrap().1, 500);
        // Implicit clamp on the device side
        camera.set_usecase("MODE_9_5FPS_2000").unwrap();
        assert!(camera.exposure <= 2000);
    }

    #[test]
    fn test_outage_blocks_frames_until_healed() {
        let mut camera = EmulatedCamera::new(EmulatorConfig {
            frequency_hz: 1000.0,
            outage_after_frames: Some(1),
            outage_init_failures: 2,
            ..Default::default()
        });
        camera.initialize();
        assert!(camera.get_frame(Duration::from_millis(20)).is_some());
        // Outage begins: no more frames, not connected
        assert!(camera.get_frame(Duration::from_millis(1)).is_none());
        assert!(!camera.is_connected());
        // Two failed attempts, then the outage heals
        assert!(!camera.initialize());
        assert!(!camera.initialize());
        assert!(camera.initialize());
        assert!(camera.get_frame(Duration::from_millis(20)).is_some());
    }

    #[test]
    fn test_closed_camera_never_initializes() {
        let mut camera = EmulatedCamera::new(fast_config());
        camera.close();
        assert!(!camera.initialize());
    }
}
