//! Recording session coordination
//!
//! Owns the `RecordingSession` and is the only writer of recording file
//! names. Segment names are strictly determined by the session's
//! reconnection count at the moment a segment opens: `pointcloud.rrf`
//! first, then `pointcloud_<N>.rrf` with N the 1-based reconnection
//! ordinal. Numbering is contiguous from 0 with no gaps or repeats.

use std::path::{Path, PathBuf};

use contracts::{ContractError, DepthCamera, RecordingHooks};
use observability::record_segment_opened;
use tracing::{debug, error, info};

use crate::metadata::{write_key_value_file, METADATA_FILE_NAME, TIMESTAMP_OFFSET_KEY};

/// Active recording session
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSession {
    directory: PathBuf,
    reconnection_count: u32,
}

impl RecordingSession {
    fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            reconnection_count: 0,
        }
    }

    /// Segment file for the current reconnection count
    fn segment_path(&self) -> PathBuf {
        let name = if self.reconnection_count == 0 {
            "pointcloud.rrf".to_string()
        } else {
            format!("pointcloud_{}.rrf", self.reconnection_count)
        };
        self.directory.join(name)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn reconnection_count(&self) -> u32 {
        self.reconnection_count
    }
}

/// Raw-stream recording coordinator
///
/// Recording faults are local: they are reported but never affect
/// connection state or halt frame acquisition.
pub struct RecordingCoordinator {
    record_pointcloud: bool,
    session: Option<RecordingSession>,
}

impl RecordingCoordinator {
    pub fn new(record_pointcloud: bool) -> Self {
        Self {
            record_pointcloud,
            session: None,
        }
    }

    /// Whether a session is currently active
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Open the device recording stream for the session's current segment.
    fn start_segment(
        &mut self,
        camera: &mut dyn DepthCamera,
    ) -> Result<(), ContractError> {
        if !self.record_pointcloud {
            return Ok(());
        }
        let Some(session) = &self.session else {
            return Ok(());
        };
        let path = session.segment_path();
        camera.start_recording(&path)?;
        record_segment_opened(session.reconnection_count);
        info!(path = %path.display(), "recording segment opened");
        Ok(())
    }

    /// Stop the device recording stream, if the option is enabled.
    fn stop_segment(&mut self, camera: &mut dyn DepthCamera) -> Result<(), ContractError> {
        if !self.record_pointcloud {
            return Ok(());
        }
        camera.stop_recording()
    }

    fn persist_metadata(
        directory: &Path,
        offset: Option<f64>,
    ) -> Result<(), ContractError> {
        let value = match offset {
            Some(offset) => offset.to_string(),
            None => "unset".to_string(),
        };
        write_key_value_file(
            &directory.join(METADATA_FILE_NAME),
            &[(TIMESTAMP_OFFSET_KEY, value)],
        )
    }
}

impl RecordingHooks for RecordingCoordinator {
    fn on_recording_started(
        &mut self,
        camera: &mut dyn DepthCamera,
        offset: Option<f64>,
        directory: &Path,
    ) -> Result<(), ContractError> {
        self.session = Some(RecordingSession::new(directory.to_path_buf()));
        debug!(directory = %directory.display(), "recording session opened");

        Self::persist_metadata(directory, offset)?;
        self.start_segment(camera)
    }

    fn on_recording_stopped(
        &mut self,
        camera: &mut dyn DepthCamera,
    ) -> Result<(), ContractError> {
        // Idempotent: without an active session there is nothing to stop
        // and no hardware call is made
        if self.session.take().is_none() {
            return Ok(());
        }
        debug!("recording session closed");
        self.stop_segment(camera)
    }

    fn on_connection_lost(&mut self, camera: &mut dyn DepthCamera) {
        if self.session.is_none() {
            return;
        }
        // Device-level teardown only; the session survives the outage
        if let Err(e) = self.stop_segment(camera) {
            error!(error = %e, "could not stop recording segment on disconnect");
        }
    }

    fn on_connection_restored(&mut self, camera: &mut dyn DepthCamera) {
        if let Some(session) = &mut self.session {
            session.reconnection_count += 1;
        } else {
            return;
        }
        if let Err(e) = self.start_segment(camera) {
            error!(error = %e, "could not open recording segment after reconnect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device::ScriptedCamera;

    #[test]
    fn test_first_segment_and_metadata_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        let mut coordinator = RecordingCoordinator::new(true);

        coordinator
            .on_recording_started(&mut camera, Some(900.0), dir.path())
            .unwrap();

        assert_eq!(
            handle.recording_paths(),
            vec![dir.path().join("pointcloud.rrf")]
        );
        let meta = std::fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert_eq!(meta, "Royale Timestamp Offset,900\n");
    }

    #[test]
    fn test_segment_numbering_over_reconnects() {
        let dir = tempfile::tempdir().unwrap();
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        let mut coordinator = RecordingCoordinator::new(true);

        coordinator
            .on_recording_started(&mut camera, Some(0.5), dir.path())
            .unwrap();
        for _ in 0..3 {
            coordinator.on_connection_lost(&mut camera);
            coordinator.on_connection_restored(&mut camera);
        }

        assert_eq!(
            handle.recording_paths(),
            vec![
                dir.path().join("pointcloud.rrf"),
                dir.path().join("pointcloud_1.rrf"),
                dir.path().join("pointcloud_2.rrf"),
                dir.path().join("pointcloud_3.rrf"),
            ]
        );
        assert_eq!(coordinator.session().unwrap().reconnection_count(), 3);
    }

    #[test]
    fn test_stop_without_session_is_a_noop() {
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        let mut coordinator = RecordingCoordinator::new(true);

        coordinator.on_recording_stopped(&mut camera).unwrap();
        // No hardware calls beyond the initialize
        assert_eq!(handle.calls().len(), 1);
    }

    #[test]
    fn test_option_disabled_never_touches_hardware() {
        let dir = tempfile::tempdir().unwrap();
        let (mut camera, handle) = ScriptedCamera::new();
        camera.initialize();
        let mut coordinator = RecordingCoordinator::new(false);

        coordinator
            .on_recording_started(&mut camera, None, dir.path())
            .unwrap();
        coordinator.on_connection_lost(&mut camera);
        coordinator.on_connection_restored(&mut camera);
        coordinator.on_recording_stopped(&mut camera).unwrap();

        assert!(handle.recording_paths().is_empty());
        // Metadata is still written: it does not depend on the option
        assert!(dir.path().join(METADATA_FILE_NAME).exists());
    }

    #[test]
    fn test_reconnect_without_session_does_not_count() {
        let (mut camera, _handle) = ScriptedCamera::new();
        camera.initialize();
        let mut coordinator = RecordingCoordinator::new(true);

        coordinator.on_connection_restored(&mut camera);
        assert!(!coordinator.is_active());
    }

    #[test]
    fn test_pending_offset_is_persisted_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let (mut camera, _handle) = ScriptedCamera::new();
        camera.initialize();
        let mut coordinator = RecordingCoordinator::new(false);

        coordinator
            .on_recording_started(&mut camera, None, dir.path())
            .unwrap();
        let meta = std::fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert_eq!(meta, "Royale Timestamp Offset,unset\n");
    }
}
