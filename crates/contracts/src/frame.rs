//! FramePair - Frame Acquisition output
//!
//! Paired IR + depth frames as delivered by the device.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Infrared frame
///
/// Grayscale image captured alongside the depth frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrFrame {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Device-clock timestamp (seconds, f64)
    pub timestamp: f64,

    /// Per-device frame sequence number
    pub index: u64,

    /// Raw 8-bit grayscale pixels (zero-copy)
    pub data: Bytes,
}

/// Depth frame
///
/// Per-pixel distance image. Carries the exposure times the device used
/// for the capture, which feed the auto-exposure loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthFrame {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Device-clock timestamp (seconds, f64)
    pub timestamp: f64,

    /// Per-device frame sequence number
    pub index: u64,

    /// Exposure times in microseconds; `[1]` is the depth channel exposure
    pub exposure_times: [u32; 2],

    /// Raw depth values, row-major f32 meters (zero-copy)
    pub data: Bytes,
}

/// One IR frame and one depth frame captured at the same device-clock instant.
///
/// Invariant: both frames share the acquisition instant before timestamp
/// adjustment, so a single offset applies to the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePair {
    pub ir: IrFrame,
    pub depth: DepthFrame,
}

impl FramePair {
    /// Shift both timestamps onto the host timeline.
    pub fn apply_offset(&mut self, offset: f64) {
        self.ir.timestamp += offset;
        self.depth.timestamp += offset;
    }

    /// Device-clock acquisition instant of the pair.
    pub fn device_timestamp(&self) -> f64 {
        self.ir.timestamp
    }
}
