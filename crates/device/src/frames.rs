//! Frame construction shared by the camera implementations

use bytes::Bytes;
use contracts::{DepthFrame, FramePair, IrFrame};

/// Build a frame pair at one device-clock instant.
///
/// Both frames carry the same timestamp, preserving the pairing invariant.
pub fn build_frame_pair(
    width: u32,
    height: u32,
    timestamp: f64,
    index: u64,
    exposure_times: [u32; 2],
) -> FramePair {
    let ir_len = (width * height) as usize;
    let depth_len = ir_len * 4;

    FramePair {
        ir: IrFrame {
            width,
            height,
            timestamp,
            index,
            data: Bytes::from(vec![0u8; ir_len]),
        },
        depth: DepthFrame {
            width,
            height,
            timestamp,
            index,
            exposure_times,
            data: Bytes::from(vec![0u8; depth_len]),
        },
    }
}
