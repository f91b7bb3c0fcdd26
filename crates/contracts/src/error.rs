//! Layered error definitions
//!
//! Categorized by source: config / device / recording

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Physical device cannot be opened or is not connected
    #[error("device unavailable: {message}")]
    DeviceUnavailable { message: String },

    /// State-dependent device query issued while offline
    ///
    /// Distinct from I/O failures: callers must check online state before
    /// invoking state-dependent queries.
    #[error("precondition violation in '{operation}': {message}")]
    Precondition { operation: String, message: String },

    /// Device rejected a control write (usecase, exposure, frame rate)
    #[error("device control '{control}' failed: {message}")]
    DeviceControl { control: String, message: String },

    // ===== Recording Errors =====
    /// Failure to open/write a segment file or drive the hardware recording
    /// stream. Local to the recording coordinator, never affects connection
    /// state.
    #[error("recording i/o failure for '{path}': {message}")]
    RecordingIo { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create device unavailable error
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: message.into(),
        }
    }

    /// Create precondition violation error
    pub fn precondition(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Precondition {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create device control error
    pub fn device_control(control: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceControl {
            control: control.into(),
            message: message.into(),
        }
    }

    /// Create recording I/O error
    pub fn recording_io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordingIo {
            path: path.into(),
            message: message.into(),
        }
    }
}
