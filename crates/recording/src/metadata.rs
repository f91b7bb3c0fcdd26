//! Session metadata file
//!
//! An append-mode key/value text file inside the recording directory.
//! Appending keeps metadata written by other components of the host
//! recording intact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use contracts::ContractError;

/// File name of the per-session metadata file
pub const METADATA_FILE_NAME: &str = "info_picoflexx.csv";

/// Key under which the frozen epoch offset is persisted
pub const TIMESTAMP_OFFSET_KEY: &str = "Royale Timestamp Offset";

/// Append `pairs` to the key/value file at `path`, one `key,value` per line.
pub fn write_key_value_file(
    path: &Path,
    pairs: &[(&str, String)],
) -> Result<(), ContractError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ContractError::recording_io(path.display().to_string(), e.to_string()))?;

    for (key, value) in pairs {
        writeln!(file, "{key},{value}")
            .map_err(|e| ContractError::recording_io(path.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE_NAME);

        write_key_value_file(&path, &[("Capture Software", "flexx-capture".to_string())])
            .unwrap();
        write_key_value_file(&path, &[(TIMESTAMP_OFFSET_KEY, "900.0".to_string())]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Capture Software,flexx-capture\nRoyale Timestamp Offset,900.0\n"
        );
    }

    #[test]
    fn test_missing_directory_is_a_recording_io_error() {
        let err = write_key_value_file(
            Path::new("/nonexistent/dir/info_picoflexx.csv"),
            &[(TIMESTAMP_OFFSET_KEY, "0".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::RecordingIo { .. }));
    }
}
