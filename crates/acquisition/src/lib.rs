//! # Acquisition
//!
//! The device-connection / frame-acquisition state machine:
//!
//! - [`FailureTracker`]: dual-threshold stall detection (consecutive misses
//!   AND elapsed wall-clock time)
//! - [`EpochOffset`]: one-shot per-epoch timestamp calibration
//! - [`ConnectionManager`]: device lifecycle and the reconnection protocol
//! - [`FrameSource`]: the tick-driven polling loop the host drives
//!
//! Single-threaded by design: every struct here is owned and mutated only by
//! the tick thread (see the concurrency notes on [`FrameSource`]).

mod connection;
mod epoch;
mod failure;
mod source;

pub use connection::{CameraSettings, ConnectionManager, EXPOSURE_APPLY_DELAY_SECS};
pub use epoch::EpochOffset;
pub use failure::{FailureTracker, MAX_MISSED_FRAMES, STALL_TIMEOUT_SECS};
pub use source::{FrameSource, POLL_TIMEOUT};
