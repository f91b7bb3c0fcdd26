//! # Recording
//!
//! Raw-stream recording coordination: session lifecycle, segment rollover on
//! reconnect with bit-exact numbering, and the per-session key/value
//! metadata file.

mod coordinator;
mod metadata;

pub use coordinator::{RecordingCoordinator, RecordingSession};
pub use metadata::{write_key_value_file, METADATA_FILE_NAME, TIMESTAMP_OFFSET_KEY};
