//! Connection lifecycle and the reconnection protocol
//!
//! The manager exclusively owns the device handle and the epoch offset for
//! its lifetime. It never polls for frames; state transitions are driven by
//! the acquisition loop's classification of poll outcomes.

use std::sync::Arc;

use contracts::{
    CameraConfig, ConnectionState, ContractError, DepthCamera, HostClock, Notification,
    NotificationBus, RecordingHooks,
};
use observability::{record_offset_locked, record_reconnect_attempt, record_reconnect_success};
use tracing::{debug, error, info, warn};

use crate::epoch::EpochOffset;

/// Delay before a posted exposure change is applied, in host seconds.
/// The device misbehaves when exposure is re-written too often.
pub const EXPOSURE_APPLY_DELAY_SECS: f64 = 0.3;

/// Cached camera settings, re-applied on every successful initialize
///
/// Round-trips through [`CameraConfig`], which is the persistence contract
/// for the source.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub selected_usecase: Option<String>,
    pub auto_exposure: bool,
    pub current_exposure: u32,
    pub requested_frame_rate: Option<u32>,
}

impl From<&CameraConfig> for CameraSettings {
    fn from(config: &CameraConfig) -> Self {
        Self {
            selected_usecase: config.selected_usecase.clone(),
            auto_exposure: config.auto_exposure,
            current_exposure: config.current_exposure,
            requested_frame_rate: config.frame_rate,
        }
    }
}

impl CameraSettings {
    /// Export the live settings back into their persisted form.
    pub fn to_config(&self) -> CameraConfig {
        CameraConfig {
            selected_usecase: self.selected_usecase.clone(),
            auto_exposure: self.auto_exposure,
            current_exposure: self.current_exposure,
            frame_rate: self.requested_frame_rate,
        }
    }
}

/// Snap a requested frame rate onto the rates the device offers (1 or max).
fn snap_frame_rate(requested: u32, max: u32) -> u32 {
    let candidates = [1u32, max];
    *candidates
        .iter()
        .min_by_key(|r| r.abs_diff(requested))
        .unwrap_or(&max)
}

/// Device lifecycle owner
pub struct ConnectionManager {
    camera: Box<dyn DepthCamera>,
    clock: Arc<dyn HostClock>,
    bus: NotificationBus,
    state: ConnectionState,
    settings: CameraSettings,
    offset: EpochOffset,
    reconnection_attempts: u32,
}

impl ConnectionManager {
    pub fn new(
        camera: Box<dyn DepthCamera>,
        settings: CameraSettings,
        clock: Arc<dyn HostClock>,
        bus: NotificationBus,
    ) -> Self {
        Self {
            camera,
            clock,
            bus,
            state: ConnectionState::Uninitialized,
            settings,
            offset: EpochOffset::new(),
            reconnection_attempts: 0,
        }
    }

    /// Open the device and bring it Online.
    ///
    /// On success: re-applies the cached usecase and exposure settings
    /// (clamping the remembered exposure down to the device's new maximum),
    /// invalidates the epoch offset, invokes the connection-restored hook,
    /// and posts `picoflexx.reconnected`. On failure returns false and
    /// leaves the state Offline.
    pub fn initialize(&mut self, hooks: &mut dyn RecordingHooks) -> bool {
        // The handle exists from here on; Uninitialized is behind us
        self.state = ConnectionState::Offline;

        if !self.camera.initialize() {
            return false;
        }

        if !self.camera.is_connected() {
            debug!("camera not connected");
            return false;
        }

        // Cache the wanted exposure mode: certain usecases override it
        // when activated (e.g. low-noise extended modes)
        let wanted_exposure_mode = self.settings.auto_exposure;

        if let Some(usecase) = self.settings.selected_usecase.clone() {
            if let Err(e) = self.camera.set_usecase(&usecase) {
                warn!(usecase = %usecase, error = %e, "could not restore usecase");
            }
        }

        match self.camera.set_exposure_mode(wanted_exposure_mode) {
            Ok(applied) => self.settings.auto_exposure = applied,
            Err(e) => warn!(error = %e, "could not restore exposure mode"),
        }

        if !self.settings.auto_exposure && self.settings.current_exposure != 0 {
            if let Err(e) = self.camera.set_exposure(self.settings.current_exposure) {
                warn!(error = %e, "could not restore exposure");
            }
            self.bus.post_delayed(
                Notification::SetExposure {
                    exposure: self.settings.current_exposure,
                },
                self.clock.now() + EXPOSURE_APPLY_DELAY_SECS,
            );
        }

        if let Some(requested) = self.settings.requested_frame_rate {
            self.apply_frame_rate(requested);
        }

        self.state = ConnectionState::Online;
        self.load_camera_state();

        // New Online epoch: calibration becomes pending again
        self.offset.invalidate();

        hooks.on_connection_restored(self.camera.as_mut());
        self.bus.post(Notification::Reconnected);

        true
    }

    /// Reconnection protocol entry, called by the acquisition loop when the
    /// stall heuristic trips.
    ///
    /// Attempts are unbounded; the counter is logged and reset only on
    /// success. A ceiling, if wanted, belongs to an outer layer.
    pub fn attempt_reconnect(&mut self, hooks: &mut dyn RecordingHooks) {
        debug!("attempt_reconnect");

        if self.state == ConnectionState::Uninitialized {
            warn!("camera was never connected at all");
            return;
        }

        if self.reconnection_attempts == 0 {
            // First failed cycle since the last success
            hooks.on_connection_lost(self.camera.as_mut());
            self.bus.post(Notification::Disconnected);
        }

        self.reconnection_attempts += 1;
        record_reconnect_attempt(self.reconnection_attempts);
        self.state = ConnectionState::Reconnecting;

        if self.initialize(hooks) {
            info!(
                attempts = self.reconnection_attempts,
                "reconnected after {} attempts", self.reconnection_attempts
            );
            record_reconnect_success(self.reconnection_attempts);
            self.reconnection_attempts = 0;
        } else {
            self.state = ConnectionState::Offline;
        }
    }

    /// Obtain the current usecase, exposure mode and exposure limits from
    /// the camera, clamping the remembered exposure to the new maximum.
    ///
    /// Does nothing when not online.
    fn load_camera_state(&mut self) {
        if !self.online() {
            error!("can't get camera state, not online");
            return;
        }

        match self.camera.current_usecase() {
            Ok(usecase) => self.settings.selected_usecase = Some(usecase),
            Err(e) => warn!(error = %e, "could not query usecase"),
        }
        match self.camera.exposure_mode() {
            Ok(auto) => self.settings.auto_exposure = auto,
            Err(e) => warn!(error = %e, "could not query exposure mode"),
        }
        match self.camera.exposure_limits() {
            Ok((_low, high)) => {
                if self.settings.current_exposure > high {
                    // Exposure is implicitly clamped to the new max
                    self.settings.current_exposure = high;
                }
            }
            Err(e) => warn!(error = %e, "could not query exposure limits"),
        }
    }

    fn apply_frame_rate(&mut self, requested: u32) {
        let max = match self.camera.max_frame_rate() {
            Ok(max) => max,
            Err(e) => {
                warn!(error = %e, "could not query max frame rate");
                return;
            }
        };
        let rate = snap_frame_rate(requested, max);
        if rate != requested {
            warn!(
                requested,
                selected = rate,
                "requested frame rate not available, snapped to nearest"
            );
        }
        if let Err(e) = self.camera.set_frame_rate(rate) {
            warn!(error = %e, rate, "could not apply frame rate");
        }
    }

    /// Lock the epoch offset on first use, then return the frozen value.
    pub fn calibrate(&mut self, host_now: f64, device_ts: f64) -> f64 {
        let was_pending = self.offset.is_pending();
        let offset = self.offset.lock(host_now, device_ts);
        if was_pending {
            info!(offset, "timestamp offset calibrated for this epoch");
            record_offset_locked(offset);
        }
        offset
    }

    /// Frozen offset of the current epoch, if calibrated
    pub fn offset_value(&self) -> Option<f64> {
        self.offset.value()
    }

    /// Usecases offered for selection. MIXED modes stream interleaved
    /// exposures the acquisition path does not handle, so they are hidden.
    pub fn selectable_usecases(&self) -> Result<Vec<String>, ContractError> {
        Ok(self
            .camera
            .usecases()?
            .into_iter()
            .filter(|usecase| !usecase.contains("MIXED"))
            .collect())
    }

    pub fn online(&self) -> bool {
        self.state.is_online() && self.camera.is_connected() && self.camera.is_capturing()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnection_attempts(&self) -> u32 {
        self.reconnection_attempts
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Remember a new exposure value (auto-exposure feedback or slider echo)
    pub fn set_current_exposure(&mut self, exposure: u32) {
        self.settings.current_exposure = exposure;
    }

    /// Write an exposure value to the device and remember it.
    pub fn apply_exposure(&mut self, exposure: u32) {
        self.settings.current_exposure = exposure;
        if let Err(e) = self.camera.set_exposure(exposure) {
            warn!(error = %e, exposure, "could not apply exposure");
        }
    }

    pub fn camera_mut(&mut self) -> &mut dyn DepthCamera {
        self.camera.as_mut()
    }

    /// Release the device handle.
    pub fn close(&mut self) {
        self.camera.close();
        self.state = ConnectionState::Uninitialized;
    }
}
