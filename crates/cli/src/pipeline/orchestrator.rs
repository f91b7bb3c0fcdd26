//! Pipeline orchestrator - coordinates all components.
//!
//! Wires the emulated device, the connection manager, the acquisition loop
//! and the recording coordinator onto one tick thread. The async side only
//! hosts the shutdown signal and the metrics endpoint; all device work is
//! synchronous and confined to a single blocking task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use acquisition::{CameraSettings, ConnectionManager, FrameSource};
use anyhow::{Context, Result};
use contracts::{
    CaptureBlueprint, HostClock, Notification, NotificationBus, SystemClock,
};
use device::EmulatedCamera;
use recording::RecordingCoordinator;
use tracing::{info, trace, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The capture blueprint configuration
    pub blueprint: CaptureBlueprint,

    /// Maximum number of frames to acquire (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until the frame limit, the timeout, or the shutdown
    /// flag stops it.
    pub async fn run(self, shutdown: Arc<AtomicBool>) -> Result<PipelineStats> {
        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        tokio::task::spawn_blocking(move || self.run_tick_loop(shutdown))
            .await
            .context("Pipeline task panicked")?
    }

    /// The tick loop. Blocking by design: the device read is a bounded
    /// 20 ms wait and everything else is in-memory work.
    fn run_tick_loop(self, shutdown: Arc<AtomicBool>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = self.config.blueprint;

        let clock: Arc<dyn HostClock> = Arc::new(SystemClock::new());
        let bus = NotificationBus::new();
        // Separate subscription for the run summary
        let events = bus.subscribe();

        info!(
            rate_hz = blueprint.emulator.frequency_hz,
            width = blueprint.emulator.width,
            height = blueprint.emulator.height,
            "Using emulated depth camera"
        );
        let camera = EmulatedCamera::new(blueprint.emulator.clone());

        let connection = ConnectionManager::new(
            Box::new(camera),
            CameraSettings::from(&blueprint.camera),
            clock.clone(),
            bus.clone(),
        );
        let coordinator = RecordingCoordinator::new(blueprint.recording.record_pointcloud);
        let mut source = FrameSource::new(connection, Box::new(coordinator), clock.clone(), &bus);

        info!("Opening depth camera...");
        if source.connect() {
            info!("Depth camera online");
            log_device_surface(source.connection_mut());
        } else {
            warn!("Depth camera did not come online; the loop will keep retrying");
        }

        // Auto-start recording when a target directory is configured
        let recording_started = if let Some(dir) = &blueprint.recording.directory {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create recording directory {}", dir.display())
            })?;
            info!(directory = %dir.display(), "Starting recording");
            bus.post(Notification::RecordingStarted {
                rec_path: dir.clone(),
            });
            true
        } else {
            false
        };

        let tick = Duration::from_millis(blueprint.acquisition.tick_interval_ms);
        let deadline = self.config.timeout.map(|t| start_time + t);
        let mut stats = PipelineStats::default();

        info!(max_frames = ?self.config.max_frames, "Pipeline running");

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested");
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(
                        timeout_secs = self.config.timeout.map(|t| t.as_secs()),
                        "Pipeline timed out"
                    );
                    break;
                }
            }

            // Deliver due delayed posts (e.g. the exposure re-apply)
            bus.pump(clock.now());

            if let Some(pair) = source.poll_once() {
                stats.frames_acquired += 1;
                trace!(
                    timestamp = pair.ir.timestamp,
                    index = pair.ir.index,
                    "frame acquired"
                );

                if let Some(max) = self.config.max_frames {
                    if stats.frames_acquired >= max {
                        info!(frames = stats.frames_acquired, "Reached max frames limit");
                        break;
                    }
                }
            }

            while let Ok(event) = events.try_recv() {
                match event {
                    Notification::Disconnected => stats.outages += 1,
                    Notification::Reconnected => stats.online_events += 1,
                    _ => {}
                }
            }

            std::thread::sleep(tick);
        }

        // Shutdown
        info!("Shutting down pipeline...");
        if recording_started {
            bus.post(Notification::RecordingStopped);
            // One more poll delivers the stop event to the recorder
            source.poll_once();
            while let Ok(event) = events.try_recv() {
                if event == Notification::Disconnected {
                    stats.outages += 1;
                }
            }
        }
        source.connection_mut().close();

        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            frames_since_recording_start = source.frame_count(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Log what the connected device reports about itself.
fn log_device_surface(connection: &mut ConnectionManager) {
    match connection.selectable_usecases() {
        Ok(usecases) => info!(?usecases, "Selectable usecases"),
        Err(e) => warn!(error = %e, "Could not query usecases"),
    }
    let camera = connection.camera_mut();
    if let Ok(rate) = camera.frame_rate() {
        info!(rate_hz = rate, "Device frame rate");
    }
    match camera.lens_parameters() {
        Ok(lens) => info!(?lens, "Device lens parameters"),
        Err(e) => warn!(error = %e, "Could not query lens parameters"),
    }
}
