//! Metric recording helpers
//!
//! Thin wrappers over the `metrics` facade so call sites stay one-liners
//! and metric names live in a single place.

use metrics::{counter, gauge, histogram};

/// A frame pair was delivered by the device
pub fn record_frame_acquired() {
    counter!("picoflexx_frames_acquired_total").increment(1);
}

/// A poll elapsed without a frame
pub fn record_frame_timeout(missed: u32) {
    counter!("picoflexx_frame_timeouts_total").increment(1);
    gauge!("picoflexx_missed_frames").set(missed as f64);
}

/// A reconnection cycle started
pub fn record_reconnect_attempt(attempt: u32) {
    counter!("picoflexx_reconnect_attempts_total").increment(1);
    gauge!("picoflexx_reconnect_attempt").set(attempt as f64);
}

/// A reconnection cycle brought the device back online
pub fn record_reconnect_success(attempts: u32) {
    counter!("picoflexx_reconnect_successes_total").increment(1);
    histogram!("picoflexx_reconnect_cycles").record(attempts as f64);
}

/// The epoch offset was frozen for the current connection
pub fn record_offset_locked(offset: f64) {
    counter!("picoflexx_offset_locks_total").increment(1);
    gauge!("picoflexx_epoch_offset_seconds").set(offset);
}

/// A recording segment was opened on the device
pub fn record_segment_opened(index: u32) {
    counter!("picoflexx_segments_opened_total").increment(1);
    gauge!("picoflexx_segment_index").set(index as f64);
}
