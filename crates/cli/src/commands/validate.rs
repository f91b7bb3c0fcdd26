//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    usecase: Option<String>,
    auto_exposure: bool,
    record_pointcloud: bool,
    tick_interval_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    usecase: blueprint.camera.selected_usecase.clone(),
                    auto_exposure: blueprint.camera.auto_exposure,
                    record_pointcloud: blueprint.recording.record_pointcloud,
                    tick_interval_ms: blueprint.acquisition.tick_interval_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::CaptureBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.camera.selected_usecase.is_none() {
        warnings.push("No usecase selected - the device default will be used".to_string());
    }

    if blueprint.camera.auto_exposure && blueprint.camera.current_exposure != 2000 {
        warnings.push(
            "camera.current_exposure is ignored while auto_exposure is enabled".to_string(),
        );
    }

    if blueprint.camera.frame_rate.is_some() {
        warnings.push(
            "camera.frame_rate will be snapped to the nearest rate the device supports"
                .to_string(),
        );
    }

    if blueprint.emulator.outage_after_frames.is_some() {
        warnings.push(format!(
            "emulator will drop the connection every {} frames",
            blueprint.emulator.outage_after_frames.unwrap()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Usecase: {}",
                summary.usecase.as_deref().unwrap_or("(device default)")
            );
            println!("  Auto exposure: {}", summary.auto_exposure);
            println!("  Record pointcloud: {}", summary.record_pointcloud);
            println!("  Tick interval: {} ms", summary.tick_interval_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
