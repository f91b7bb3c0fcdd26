//! Scripted camera test double
//!
//! Queued poll and initialize outcomes plus a call journal, so tests can
//! drive the acquisition state machine through exact failure sequences and
//! assert on the hardware calls it produced.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ContractError, DepthCamera, FramePair, LensParameters};

use crate::frames::build_frame_pair;

const WIDTH: u32 = 224;
const HEIGHT: u32 = 171;

/// One scripted poll result
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Deliver a frame pair with this device-clock timestamp
    Frame { device_ts: f64, depth_exposure: u32 },
    /// Poll times out
    Timeout,
}

/// Journaled hardware call
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCall {
    Initialize { succeeded: bool },
    StartRecording(PathBuf),
    StopRecording,
    SetUsecase(String),
    SetExposure(u32),
    SetExposureMode(bool),
    Close,
}

#[derive(Debug)]
struct ScriptState {
    poll_outcomes: VecDeque<PollOutcome>,
    init_results: VecDeque<bool>,
    connected: bool,
    capturing: bool,
    closed: bool,
    usecases: Vec<String>,
    usecase: String,
    auto_exposure: bool,
    exposure: u32,
    exposure_limits: (u32, u32),
    frame_rate: u32,
    max_frame_rate: u32,
    frame_index: u64,
    recording_open: bool,
    journal: Vec<CameraCall>,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            poll_outcomes: VecDeque::new(),
            init_results: VecDeque::new(),
            connected: false,
            capturing: false,
            closed: false,
            usecases: vec![
                "MODE_9_5FPS_2000".to_string(),
                "MODE_9_15FPS_700".to_string(),
                "MODE_MIXED_30_5".to_string(),
            ],
            usecase: "MODE_9_15FPS_700".to_string(),
            auto_exposure: false,
            exposure: 2000,
            exposure_limits: (8, 2000),
            frame_rate: 15,
            max_frame_rate: 15,
            frame_index: 0,
            recording_open: false,
            journal: Vec::new(),
        }
    }
}

/// Test-side handle controlling a [`ScriptedCamera`]
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptHandle {
    /// Queue a successful poll delivering a pair stamped `device_ts`
    pub fn push_frame(&self, device_ts: f64) {
        self.push_frame_with_exposure(device_ts, 1000);
    }

    /// Queue a successful poll with explicit depth exposure metadata
    pub fn push_frame_with_exposure(&self, device_ts: f64, depth_exposure: u32) {
        self.state
            .lock()
            .unwrap()
            .poll_outcomes
            .push_back(PollOutcome::Frame {
                device_ts,
                depth_exposure,
            });
    }

    /// Queue `count` poll timeouts
    pub fn push_timeouts(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..count {
            state.poll_outcomes.push_back(PollOutcome::Timeout);
        }
    }

    /// Make the next `count` initialize calls fail
    pub fn fail_initializations(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..count {
            state.init_results.push_back(false);
        }
    }

    /// Drop the connection as the hardware would (no more frames)
    pub fn sever_connection(&self) {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.capturing = false;
    }

    /// Change the exposure limits the device reports after the next connect
    pub fn set_exposure_limits(&self, low: u32, high: u32) {
        self.state.lock().unwrap().exposure_limits = (low, high);
    }

    /// Exposure value most recently written to the device
    pub fn device_exposure(&self) -> u32 {
        self.state.lock().unwrap().exposure
    }

    /// Paths of all recording streams opened, in order
    pub fn recording_paths(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .journal
            .iter()
            .filter_map(|call| match call {
                CameraCall::StartRecording(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of initialize calls observed
    pub fn initialize_calls(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .journal
            .iter()
            .filter(|call| matches!(call, CameraCall::Initialize { .. }))
            .count()
    }

    /// Full call journal
    pub fn calls(&self) -> Vec<CameraCall> {
        self.state.lock().unwrap().journal.clone()
    }
}

/// Scripted camera
pub struct ScriptedCamera {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedCamera {
    /// Build a camera and its controlling handle
    pub fn new() -> (Self, ScriptHandle) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (
            Self {
                state: state.clone(),
            },
            ScriptHandle { state },
        )
    }

    fn ensure_online(state: &ScriptState, operation: &str) -> Result<(), ContractError> {
        if state.connected && state.capturing {
            Ok(())
        } else {
            Err(ContractError::precondition(operation, "device not online"))
        }
    }
}

impl DepthCamera for ScriptedCamera {
    fn initialize(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        let succeeded = !state.closed && state.init_results.pop_front().unwrap_or(true);
        state.journal.push(CameraCall::Initialize { succeeded });
        if succeeded {
            state.connected = true;
            state.capturing = true;
        }
        succeeded
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn is_capturing(&self) -> bool {
        self.state.lock().unwrap().capturing
    }

    fn close(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.connected = false;
        state.capturing = false;
        state.journal.push(CameraCall::Close);
    }

    fn get_frame(&mut self, _timeout: Duration) -> Option<FramePair> {
        let mut state = self.state.lock().unwrap();
        if !state.capturing {
            return None;
        }
        match state.poll_outcomes.pop_front() {
            Some(PollOutcome::Frame {
                device_ts,
                depth_exposure,
            }) => {
                state.frame_index += 1;
                Some(build_frame_pair(
                    WIDTH,
                    HEIGHT,
                    device_ts,
                    state.frame_index,
                    [200, depth_exposure],
                ))
            }
            Some(PollOutcome::Timeout) | None => None,
        }
    }

    fn usecases(&self) -> Result<Vec<String>, ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "usecases")?;
        Ok(state.usecases.clone())
    }

    fn current_usecase(&self) -> Result<String, ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "current_usecase")?;
        Ok(state.usecase.clone())
    }

    fn set_usecase(&mut self, usecase: &str) -> Result<(), ContractError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state, "set_usecase")?;
        if !state.usecases.iter().any(|u| u == usecase) {
            return Err(ContractError::device_control(
                "usecase",
                format!("unknown usecase '{usecase}'"),
            ));
        }
        state.usecase = usecase.to_string();
        state.journal.push(CameraCall::SetUsecase(usecase.to_string()));
        Ok(())
    }

    fn exposure_mode(&self) -> Result<bool, ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "exposure_mode")?;
        Ok(state.auto_exposure)
    }

    fn set_exposure_mode(&mut self, auto: bool) -> Result<bool, ContractError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state, "set_exposure_mode")?;
        state.auto_exposure = auto;
        state.journal.push(CameraCall::SetExposureMode(auto));
        Ok(auto)
    }

    fn exposure_limits(&self) -> Result<(u32, u32), ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "exposure_limits")?;
        Ok(state.exposure_limits)
    }

    fn set_exposure(&mut self, exposure: u32) -> Result<(), ContractError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state, "set_exposure")?;
        state.exposure = exposure;
        state.journal.push(CameraCall::SetExposure(exposure));
        Ok(())
    }

    fn frame_rate(&self) -> Result<u32, ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "frame_rate")?;
        Ok(state.frame_rate)
    }

    fn set_frame_rate(&mut self, rate: u32) -> Result<(), ContractError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state, "set_frame_rate")?;
        state.frame_rate = rate;
        Ok(())
    }

    fn max_frame_rate(&self) -> Result<u32, ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "max_frame_rate")?;
        Ok(state.max_frame_rate)
    }

    fn lens_parameters(&self) -> Result<LensParameters, ContractError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state, "lens_parameters")?;
        Ok(LensParameters {
            principal_point: (WIDTH as f64 / 2.0, HEIGHT as f64 / 2.0),
            focal_length: (210.0, 210.0),
            distortion_tangential: (0.0, 0.0),
            distortion_radial: [0.2, -0.5, 0.3],
        })
    }

    fn start_recording(&mut self, path: &Path) -> Result<(), ContractError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state, "start_recording")?;
        state.recording_open = true;
        state
            .journal
            .push(CameraCall::StartRecording(path.to_path_buf()));
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), ContractError> {
        let mut state = self.state.lock().unwrap();
        state.recording_open = false;
        state.journal.push(CameraCall::StopRecording);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_outcomes_in_order() {
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        handle.push_frame(100.0);
        handle.push_timeouts(1);
        handle.push_frame(101.0);

        let timeout = Duration::from_millis(20);
        assert_eq!(
            camera.get_frame(timeout).unwrap().device_timestamp(),
            100.0
        );
        assert!(camera.get_frame(timeout).is_none());
        assert_eq!(
            camera.get_frame(timeout).unwrap().device_timestamp(),
            101.0
        );
    }

    #[test]
    fn test_failed_initialize_consumed_in_order() {
        let (mut camera, handle) = ScriptedCamera::new();
        handle.fail_initializations(2);
        assert!(!camera.initialize());
        assert!(!camera.initialize());
        assert!(camera.initialize());
        assert_eq!(handle.initialize_calls(), 3);
    }

    #[test]
    fn test_severed_connection_yields_timeouts() {
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        handle.push_frame(1.0);
        handle.sever_connection();
        assert!(camera.get_frame(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_journal_records_recording_calls() {
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        camera.start_recording(Path::new("/rec/pointcloud.rrf")).unwrap();
        camera.stop_recording().unwrap();
        assert_eq!(
            handle.recording_paths(),
            vec![PathBuf::from("/rec/pointcloud.rrf")]
        );
    }
}
