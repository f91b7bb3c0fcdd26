//! Configuration validation
//!
//! Rules:
//! - selected_usecase non-empty if present
//! - camera.frame_rate > 0 if present
//! - acquisition.tick_interval_ms > 0
//! - recording.directory required when recording auto-starts
//! - emulator.frequency_hz > 0 and frame dimensions non-zero

use contracts::{CaptureBlueprint, ContractError};

/// Validate a CaptureBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    validate_camera(blueprint)?;
    validate_acquisition(blueprint)?;
    validate_recording(blueprint)?;
    validate_emulator(blueprint)?;
    Ok(())
}

fn validate_camera(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let camera = &blueprint.camera;

    if let Some(usecase) = &camera.selected_usecase {
        if usecase.is_empty() {
            return Err(ContractError::config_validation(
                "camera.selected_usecase",
                "selected_usecase cannot be empty; omit the key for the device default",
            ));
        }
    }

    if let Some(frame_rate) = camera.frame_rate {
        if frame_rate == 0 {
            return Err(ContractError::config_validation(
                "camera.frame_rate",
                "frame_rate must be > 0",
            ));
        }
    }

    Ok(())
}

fn validate_acquisition(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    if blueprint.acquisition.tick_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "acquisition.tick_interval_ms",
            "tick_interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// Auto-started recordings need a directory to write into
fn validate_recording(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let recording = &blueprint.recording;
    if recording.record_pointcloud && recording.directory.is_none() {
        return Err(ContractError::config_validation(
            "recording.directory",
            "directory is required when record_pointcloud is enabled at startup",
        ));
    }
    Ok(())
}

fn validate_emulator(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let emulator = &blueprint.emulator;

    if emulator.frequency_hz <= 0.0 {
        return Err(ContractError::config_validation(
            "emulator.frequency_hz",
            format!("frequency_hz must be > 0, got {}", emulator.frequency_hz),
        ));
    }

    if emulator.width == 0 || emulator.height == 0 {
        return Err(ContractError::config_validation(
            "emulator.width / emulator.height",
            format!(
                "frame dimensions must be non-zero, got {}x{}",
                emulator.width, emulator.height
            ),
        ));
    }

    Ok(())
}
