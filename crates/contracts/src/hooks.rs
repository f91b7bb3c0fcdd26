//! Recording side-effect hooks
//!
//! Seam between the connection manager and the recording coordinator. The
//! connection manager owns the device handle, so hook methods borrow the
//! camera for the duration of the call instead of sharing ownership.

use std::path::Path;

use crate::{ContractError, DepthCamera};

/// Recording coordinator interface, invoked by the acquisition core
pub trait RecordingHooks: Send {
    /// A recording session opened at `directory`.
    ///
    /// `offset` is the frozen timestamp offset of the current epoch, if one
    /// has been calibrated.
    fn on_recording_started(
        &mut self,
        camera: &mut dyn DepthCamera,
        offset: Option<f64>,
        directory: &Path,
    ) -> Result<(), ContractError>;

    /// The recording session closed. Idempotent when no session is active.
    fn on_recording_stopped(
        &mut self,
        camera: &mut dyn DepthCamera,
    ) -> Result<(), ContractError>;

    /// The connection dropped while (possibly) recording.
    fn on_connection_lost(&mut self, camera: &mut dyn DepthCamera);

    /// The connection came back. Opens the next numbered segment when a
    /// session is active.
    fn on_connection_restored(&mut self, camera: &mut dyn DepthCamera);
}
