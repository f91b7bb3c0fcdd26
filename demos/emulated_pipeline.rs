//! Emulated Pipeline Demo
//!
//! Runs the full acquisition stack against the emulated Pico Flexx: the
//! device drops its connection mid-recording and the pipeline reconnects,
//! rolling the recording over into a numbered segment.
//!
//! Run with: cargo run --bin emulated_pipeline

use std::sync::Arc;
use std::time::{Duration, Instant};

use acquisition::{CameraSettings, ConnectionManager, FrameSource};
use config_loader::ConfigLoader;
use contracts::{
    CaptureBlueprint, HostClock, Notification, NotificationBus, SystemClock,
};
use device::EmulatedCamera;
use recording::RecordingCoordinator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Emulated Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // A blueprint with a scripted outage after 40 frames
        demo_blueprint()
    };

    let rec_dir = blueprint
        .recording
        .directory
        .clone()
        .unwrap_or_else(|| "./demo_recording".into());
    std::fs::create_dir_all(&rec_dir)?;

    // ==== Stage 2: Assemble the pipeline ====
    let clock: Arc<dyn HostClock> = Arc::new(SystemClock::new());
    let bus = NotificationBus::new();
    let events = bus.subscribe();

    let camera = EmulatedCamera::new(blueprint.emulator.clone());
    let connection = ConnectionManager::new(
        Box::new(camera),
        CameraSettings::from(&blueprint.camera),
        clock.clone(),
        bus.clone(),
    );
    let coordinator = RecordingCoordinator::new(blueprint.recording.record_pointcloud);
    let mut source = FrameSource::new(connection, Box::new(coordinator), clock.clone(), &bus);

    // ==== Stage 3: Bring the device online and start recording ====
    tracing::info!("Opening emulated depth camera...");
    if !source.connect() {
        tracing::warn!("Camera not online yet; the loop will reconnect");
    }

    tracing::info!(directory = %rec_dir.display(), "Starting recording");
    bus.post(Notification::RecordingStarted {
        rec_path: rec_dir.clone(),
    });

    // ==== Stage 4: Acquire frames across the outage ====
    let target_frames = 100u64;
    let deadline = Instant::now() + Duration::from_secs(30);
    let tick = Duration::from_millis(blueprint.acquisition.tick_interval_ms);
    let mut frames = 0u64;
    let mut outages = 0u64;

    tracing::info!("Running pipeline, target: {} frames", target_frames);

    while frames < target_frames && Instant::now() < deadline {
        bus.pump(clock.now());

        if let Some(pair) = source.poll_once() {
            frames += 1;
            if frames % 25 == 0 {
                tracing::info!(
                    frames,
                    timestamp = format!("{:.3}", pair.ir.timestamp),
                    "Acquiring"
                );
            }
        }

        while let Ok(event) = events.try_recv() {
            match event {
                Notification::Disconnected => {
                    outages += 1;
                    tracing::warn!("Device dropped, reconnecting...");
                }
                Notification::Reconnected if outages > 0 => {
                    tracing::info!("Device back online");
                }
                _ => {}
            }
        }

        std::thread::sleep(tick);
    }

    // ==== Stage 5: Cleanup ====
    tracing::info!("Shutting down...");
    bus.post(Notification::RecordingStopped);
    source.poll_once();
    source.connection_mut().close();

    tracing::info!(frames, outages, "Pipeline completed");

    // Show the segments the outage produced
    let mut segments: Vec<_> = std::fs::read_dir(&rec_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    segments.sort();
    tracing::info!(?segments, "Recording directory contents");

    Ok(())
}

fn demo_blueprint() -> CaptureBlueprint {
    let mut blueprint = CaptureBlueprint::default();
    blueprint.camera.selected_usecase = Some("MODE_9_15FPS_700".to_string());
    blueprint.recording.record_pointcloud = true;
    blueprint.recording.directory = Some("./demo_recording".into());
    blueprint.emulator.frequency_hz = 200.0;
    blueprint.emulator.outage_after_frames = Some(40);
    blueprint.emulator.outage_init_failures = 1;
    blueprint
}
