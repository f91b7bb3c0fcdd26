//! # Device
//!
//! Camera implementations behind the `DepthCamera` contract.
//!
//! - [`EmulatedCamera`]: deterministic frame generator standing in for the
//!   hardware SDK, with a skewed device clock and scriptable outages
//! - [`ScriptedCamera`]: test double with injectable poll/initialize
//!   outcomes and a call journal

mod emulated;
mod frames;
mod scripted;

pub use emulated::EmulatedCamera;
pub use frames::build_frame_pair;
pub use scripted::{CameraCall, PollOutcome, ScriptHandle, ScriptedCamera};
