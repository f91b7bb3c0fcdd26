//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref usecase) = args.usecase {
        info!(usecase = %usecase, "Overriding operating mode from CLI");
        blueprint.camera.selected_usecase = Some(usecase.clone());
    }
    if let Some(ref dir) = args.record_dir {
        info!(directory = %dir.display(), "Overriding recording directory from CLI");
        blueprint.recording.directory = Some(dir.clone());
    }

    info!(
        usecase = ?blueprint.camera.selected_usecase,
        auto_exposure = blueprint.camera.auto_exposure,
        record_pointcloud = blueprint.recording.record_pointcloud,
        tick_interval_ms = blueprint.acquisition.tick_interval_ms,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown flag; the tick loop checks it every tick
    let shutdown = Arc::new(AtomicBool::new(false));
    let signal_flag = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping pipeline...");
        signal_flag.store(true, Ordering::SeqCst);
    });

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown)
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames_acquired = stats.frames_acquired,
        outages = stats.outages,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed successfully"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("Flexx Capture finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::CaptureBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Camera:");
    println!(
        "  Usecase: {}",
        blueprint
            .camera
            .selected_usecase
            .as_deref()
            .unwrap_or("(device default)")
    );
    println!(
        "  Exposure: {} ({} us)",
        if blueprint.camera.auto_exposure {
            "auto"
        } else {
            "manual"
        },
        blueprint.camera.current_exposure
    );
    if let Some(rate) = blueprint.camera.frame_rate {
        println!("  Frame rate: {} Hz", rate);
    }

    println!("\nAcquisition:");
    println!("  Tick interval: {} ms", blueprint.acquisition.tick_interval_ms);

    println!("\nRecording:");
    println!("  Pointcloud: {}", blueprint.recording.record_pointcloud);
    match &blueprint.recording.directory {
        Some(dir) => println!("  Directory: {}", dir.display()),
        None => println!("  Directory: (none, wait for host events)"),
    }

    println!("\nEmulator:");
    println!("  Rate: {} Hz", blueprint.emulator.frequency_hz);
    println!(
        "  Frame size: {}x{}",
        blueprint.emulator.width, blueprint.emulator.height
    );
    if let Some(n) = blueprint.emulator.outage_after_frames {
        println!(
            "  Outage: after {} frames, heals after {} failed attempts",
            n, blueprint.emulator.outage_init_failures
        );
    }

    println!();
}
