//! DepthCamera trait - Device capability abstraction
//!
//! Opaque handle over the camera SDK, decoupling the acquisition core from
//! the concrete device. Supports unified handling of real hardware and
//! emulated/scripted cameras.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ContractError, FramePair};

/// Lens parameters as reported by the device
///
/// Queried and surfaced only; intrinsics computation is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensParameters {
    /// Principal point (c_x, c_y)
    pub principal_point: (f64, f64),

    /// Focal length (f_x, f_y)
    pub focal_length: (f64, f64),

    /// Tangential distortion (p_1, p_2)
    pub distortion_tangential: (f64, f64),

    /// Radial distortion coefficients (k_1, k_2, ...)
    pub distortion_radial: Vec3Radial,
}

/// Radial distortion coefficients, fixed at three terms on this device family
pub type Vec3Radial = [f64; 3];

/// Depth camera capability interface
///
/// The connection manager exclusively owns the handle for its lifetime.
/// All state-dependent queries return [`ContractError::Precondition`] when
/// the device is not online, distinct from I/O failures.
///
/// # Design Principles
///
/// 1. **Opaque SDK**: no SDK types leak through this trait
/// 2. **Bounded blocking**: `get_frame` is the only blocking call and honors
///    its timeout, which bounds worst-case tick latency
/// 3. **Applied state**: setters return the state the device actually
///    applied, never the requested value
pub trait DepthCamera: Send {
    /// Open the device handle. Returns false when no device can be opened.
    fn initialize(&mut self) -> bool;

    /// Whether a physical device is connected
    fn is_connected(&self) -> bool;

    /// Whether the device is delivering frames
    fn is_capturing(&self) -> bool;

    /// Release the device handle
    fn close(&mut self);

    /// Blocking read of the next frame pair, bounded by `timeout`.
    ///
    /// Returns `None` when no pair arrived within the timeout. A timeout is
    /// not an error; it feeds the caller's failure heuristic.
    fn get_frame(&mut self, timeout: Duration) -> Option<FramePair>;

    /// Ordered list of operating modes supported by the device
    fn usecases(&self) -> Result<Vec<String>, ContractError>;

    /// Currently active operating mode
    fn current_usecase(&self) -> Result<String, ContractError>;

    /// Switch the operating mode. May reset exposure mode on some modes.
    fn set_usecase(&mut self, usecase: &str) -> Result<(), ContractError>;

    /// Whether auto exposure is active
    fn exposure_mode(&self) -> Result<bool, ContractError>;

    /// Request auto (true) or manual (false) exposure.
    ///
    /// Returns the mode the device applied.
    fn set_exposure_mode(&mut self, auto: bool) -> Result<bool, ContractError>;

    /// (low, high) exposure bounds in microseconds for the active usecase
    fn exposure_limits(&self) -> Result<(u32, u32), ContractError>;

    /// Set manual exposure in microseconds
    fn set_exposure(&mut self, exposure: u32) -> Result<(), ContractError>;

    /// Current frame rate in Hz
    fn frame_rate(&self) -> Result<u32, ContractError>;

    /// Set the frame rate in Hz
    fn set_frame_rate(&mut self, rate: u32) -> Result<(), ContractError>;

    /// Maximum frame rate of the active usecase
    fn max_frame_rate(&self) -> Result<u32, ContractError>;

    /// Lens parameters of the connected device
    fn lens_parameters(&self) -> Result<LensParameters, ContractError>;

    /// Start a raw stream recording into `path`
    fn start_recording(&mut self, path: &Path) -> Result<(), ContractError>;

    /// Stop the active raw stream recording
    fn stop_recording(&mut self) -> Result<(), ContractError>;
}
