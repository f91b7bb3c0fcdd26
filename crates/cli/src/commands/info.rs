//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    camera: CameraInfo,
    acquisition: AcquisitionInfo,
    recording: RecordingInfo,
    emulator: EmulatorInfo,
}

#[derive(Serialize)]
struct CameraInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    usecase: Option<String>,
    auto_exposure: bool,
    current_exposure: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_rate: Option<u32>,
}

#[derive(Serialize)]
struct AcquisitionInfo {
    tick_interval_ms: u64,
}

#[derive(Serialize)]
struct RecordingInfo {
    record_pointcloud: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    directory: Option<String>,
}

#[derive(Serialize)]
struct EmulatorInfo {
    frequency_hz: f64,
    width: u32,
    height: u32,
    clock_skew_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    outage_after_frames: Option<u64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::CaptureBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        camera: CameraInfo {
            usecase: blueprint.camera.selected_usecase.clone(),
            auto_exposure: blueprint.camera.auto_exposure,
            current_exposure: blueprint.camera.current_exposure,
            frame_rate: blueprint.camera.frame_rate,
        },
        acquisition: AcquisitionInfo {
            tick_interval_ms: blueprint.acquisition.tick_interval_ms,
        },
        recording: RecordingInfo {
            record_pointcloud: blueprint.recording.record_pointcloud,
            directory: blueprint
                .recording
                .directory
                .as_ref()
                .map(|d| d.display().to_string()),
        },
        emulator: EmulatorInfo {
            frequency_hz: blueprint.emulator.frequency_hz,
            width: blueprint.emulator.width,
            height: blueprint.emulator.height,
            clock_skew_secs: blueprint.emulator.clock_skew_secs,
            outage_after_frames: blueprint.emulator.outage_after_frames,
        },
    }
}

fn print_config_info(blueprint: &contracts::CaptureBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Flexx Capture Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Camera
    println!("📷 Camera");
    println!("   ├─ Version: {:?}", blueprint.version);
    match &blueprint.camera.selected_usecase {
        Some(usecase) => println!("   ├─ Usecase: {}", usecase),
        None => println!("   ├─ Usecase: (device default)"),
    }
    println!(
        "   ├─ Exposure: {}",
        if blueprint.camera.auto_exposure {
            "auto".to_string()
        } else {
            format!("manual, {} us", blueprint.camera.current_exposure)
        }
    );
    match blueprint.camera.frame_rate {
        Some(rate) => println!("   └─ Frame rate: {} Hz", rate),
        None => println!("   └─ Frame rate: (usecase default)"),
    }

    // Acquisition
    println!("\n⚙️  Acquisition");
    println!(
        "   └─ Tick interval: {} ms",
        blueprint.acquisition.tick_interval_ms
    );

    // Recording
    println!("\n💾 Recording");
    println!(
        "   ├─ Pointcloud: {}",
        blueprint.recording.record_pointcloud
    );
    match &blueprint.recording.directory {
        Some(dir) => println!("   └─ Directory: {}", dir.display()),
        None => println!("   └─ Directory: (wait for host events)"),
    }

    // Emulator
    println!("\n🔌 Emulator");
    println!("   ├─ Rate: {} Hz", blueprint.emulator.frequency_hz);
    println!(
        "   ├─ Frame size: {}x{}",
        blueprint.emulator.width, blueprint.emulator.height
    );
    println!(
        "   ├─ Clock skew: {} s",
        blueprint.emulator.clock_skew_secs
    );
    match blueprint.emulator.outage_after_frames {
        Some(n) => println!("   └─ Outage: every {} frames", n),
        None => println!("   └─ Outage: never"),
    }

    println!();
}
