//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Host clock: monotonically increasing seconds (f64), provided by [`HostClock`]
//! - Device clock: per-frame timestamps in seconds (f64), arbitrary constant skew
//!   against the host clock at connection time

mod blueprint;
mod camera;
mod clock;
mod error;
mod frame;
mod hooks;
mod notification;
mod state;

pub use blueprint::*;
pub use camera::{DepthCamera, LensParameters};
pub use clock::{HostClock, ManualClock, SystemClock};
pub use error::*;
pub use frame::*;
pub use hooks::RecordingHooks;
pub use notification::{Notification, NotificationBus, NotificationReceiver};
pub use state::ConnectionState;
