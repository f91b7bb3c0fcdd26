//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Contract smoke tests
//! - Full acquisition scenarios against the scripted camera (no hardware)
//! - Recording segment rollover across reconnects

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        let _ = contracts::ConnectionState::default();
    }

    #[tokio::test]
    async fn test_notification_bus_async_delivery() {
        let bus = contracts::NotificationBus::new();
        let rx = bus.subscribe();
        bus.post(contracts::Notification::Reconnected);
        assert_eq!(
            rx.recv().await.unwrap(),
            contracts::Notification::Reconnected
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::Arc;

    use acquisition::{CameraSettings, ConnectionManager, FrameSource};
    use contracts::{CameraConfig, ManualClock, Notification, NotificationBus};
    use device::{CameraCall, ScriptHandle, ScriptedCamera};
    use recording::{RecordingCoordinator, METADATA_FILE_NAME};

    /// Scripted camera wired through the connection manager, the
    /// acquisition loop and the recording coordinator, exactly as the
    /// orchestrator assembles them.
    fn capture_rig(clock: ManualClock) -> (FrameSource, ScriptHandle, NotificationBus) {
        let (camera, handle) = ScriptedCamera::new();
        let bus = NotificationBus::new();
        let connection = ConnectionManager::new(
            Box::new(camera),
            CameraSettings::from(&CameraConfig::default()),
            Arc::new(clock.clone()),
            bus.clone(),
        );
        let coordinator = RecordingCoordinator::new(true);
        let source = FrameSource::new(connection, Box::new(coordinator), Arc::new(clock), &bus);
        (source, handle, bus)
    }

    /// Force a full outage-and-reconnect cycle through the stall heuristic.
    fn force_outage(source: &mut FrameSource, handle: &ScriptHandle, clock: &ManualClock) {
        handle.sever_connection();
        clock.advance(6.0);
        assert!(source.poll_once().is_none());
    }

    #[test]
    fn test_recording_survives_an_outage_with_a_new_segment() {
        let clock = ManualClock::new(1000.0);
        let (mut source, handle, bus) = capture_rig(clock.clone());
        let dir = tempfile::tempdir().unwrap();
        assert!(source.connect());

        bus.post(Notification::RecordingStarted {
            rec_path: dir.path().to_path_buf(),
        });
        handle.push_frame(100.0);
        assert!(source.poll_once().is_some());
        assert_eq!(
            handle.recording_paths(),
            vec![dir.path().join("pointcloud.rrf")]
        );

        force_outage(&mut source, &handle, &clock);

        // The reconnect closed the old stream and opened the next segment
        assert_eq!(
            handle.recording_paths(),
            vec![
                dir.path().join("pointcloud.rrf"),
                dir.path().join("pointcloud_1.rrf"),
            ]
        );
        let stops = handle
            .calls()
            .iter()
            .filter(|c| **c == CameraCall::StopRecording)
            .count();
        assert_eq!(stops, 1);

        // Frames keep flowing into the new segment
        handle.push_frame(50.0);
        assert!(source.poll_once().is_some());
    }

    #[test]
    fn test_k_outages_produce_k_plus_one_segments() {
        let clock = ManualClock::new(0.0);
        let (mut source, handle, bus) = capture_rig(clock.clone());
        let dir = tempfile::tempdir().unwrap();
        assert!(source.connect());

        bus.post(Notification::RecordingStarted {
            rec_path: dir.path().to_path_buf(),
        });
        handle.push_frame(1.0);
        assert!(source.poll_once().is_some());

        for _ in 0..3 {
            force_outage(&mut source, &handle, &clock);
            handle.push_frame(1.0);
            assert!(source.poll_once().is_some());
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
    }

    #[test]
    fn test_calibrated_offset_lands_in_the_metadata_file() {
        let clock = ManualClock::new(1000.0);
        let (mut source, handle, bus) = capture_rig(clock.clone());
        let dir = tempfile::tempdir().unwrap();
        assert!(source.connect());

        // Calibrate first: host 1000.0 against device 100.0
        handle.push_frame(100.0);
        assert!(source.poll_once().is_some());

        bus.post(Notification::RecordingStarted {
            rec_path: dir.path().to_path_buf(),
        });
        source.poll_once();

        let meta = std::fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert_eq!(meta, "Royale Timestamp Offset,900\n");
    }

    #[test]
    fn test_recording_start_before_calibration_writes_unset() {
        let clock = ManualClock::new(1000.0);
        let (mut source, _handle, bus) = capture_rig(clock);
        let dir = tempfile::tempdir().unwrap();
        assert!(source.connect());

        // No frame yet: the epoch offset is still pending
        bus.post(Notification::RecordingStarted {
            rec_path: dir.path().to_path_buf(),
        });
        source.poll_once();

        let meta = std::fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert_eq!(meta, "Royale Timestamp Offset,unset\n");
    }

    #[test]
    fn test_stop_notification_is_idempotent() {
        let clock = ManualClock::new(0.0);
        let (mut source, handle, bus) = capture_rig(clock);
        let dir = tempfile::tempdir().unwrap();
        assert!(source.connect());

        bus.post(Notification::RecordingStarted {
            rec_path: dir.path().to_path_buf(),
        });
        source.poll_once();

        bus.post(Notification::RecordingStopped);
        source.poll_once();
        bus.post(Notification::RecordingStopped);
        source.poll_once();

        let stops = handle
            .calls()
            .iter()
            .filter(|c| **c == CameraCall::StopRecording)
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_offsets_reanchor_per_connection_epoch() {
        let clock = ManualClock::new(1000.0);
        let (mut source, handle, _bus) = capture_rig(clock.clone());
        assert!(source.connect());

        handle.push_frame(100.0);
        let pair = source.poll_once().unwrap();
        assert_eq!(pair.ir.timestamp, 1000.0);

        force_outage(&mut source, &handle, &clock);

        // Device clock rebased after reconnect; offset must follow
        clock.set(2000.0);
        handle.push_frame(5.0);
        let pair = source.poll_once().unwrap();
        assert_eq!(pair.ir.timestamp, 2000.0);
        assert_eq!(pair.depth.timestamp, 2000.0);
    }
}

#[cfg(test)]
mod config_tests {
    use acquisition::CameraSettings;
    use config_loader::{ConfigFormat, ConfigLoader};

    const CONFIG: &str = r#"
[camera]
selected_usecase = "MODE_9_15FPS_700"
auto_exposure = false
current_exposure = 1500

[recording]
record_pointcloud = true
directory = "/tmp/rec"
"#;

    #[test]
    fn test_camera_settings_round_trip_through_blueprint() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let settings = CameraSettings::from(&blueprint.camera);
        let exported = settings.to_config();

        assert_eq!(exported.selected_usecase, blueprint.camera.selected_usecase);
        assert_eq!(exported.auto_exposure, blueprint.camera.auto_exposure);
        assert_eq!(exported.current_exposure, 1500);
    }

    #[test]
    fn test_blueprint_survives_toml_serialization() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let parsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(
            parsed.camera.selected_usecase,
            blueprint.camera.selected_usecase
        );
        assert!(parsed.recording.record_pointcloud);
    }
}
