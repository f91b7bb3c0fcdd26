//! Dual-threshold stall detection
//!
//! A single poll timeout is not a failure; jitter on the sensor bus produces
//! them routinely. Reconnection is warranted only when misses pile up or the
//! last success recedes too far into the past, whichever happens first. The
//! miss count tolerates brief stalls under a fast polling cadence; the
//! wall-clock bound caps detection latency when the host ticks slowly.

/// Consecutive misses tolerated before reconnecting (trigger is `> 45`)
pub const MAX_MISSED_FRAMES: u32 = 45;

/// Seconds without a successful frame tolerated before reconnecting
pub const STALL_TIMEOUT_SECS: f64 = 5.0;

/// Poll-outcome accumulator deciding when to trigger reconnection
///
/// Not persisted; reset to zero/now on every successful acquisition and
/// after every reconnection trigger regardless of its outcome (the damping
/// cadence: a failed reconnect is not retried until another 45 misses or
/// 5 seconds accumulate).
#[derive(Debug, Clone, PartialEq)]
pub struct FailureTracker {
    missed_frames: u32,
    last_success: f64,
}

impl FailureTracker {
    pub fn new(now: f64) -> Self {
        Self {
            missed_frames: 0,
            last_success: now,
        }
    }

    /// Record a poll timeout; returns true when reconnection should trigger.
    pub fn record_timeout(&mut self, now: f64) -> bool {
        self.missed_frames += 1;
        self.missed_frames > MAX_MISSED_FRAMES || now - self.last_success > STALL_TIMEOUT_SECS
    }

    /// Reset both counters to zero/now.
    pub fn reset(&mut self, now: f64) {
        self.missed_frames = 0;
        self.last_success = now;
    }

    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_count_triggers_strictly_above_threshold() {
        let mut tracker = FailureTracker::new(0.0);
        for _ in 0..MAX_MISSED_FRAMES {
            assert!(!tracker.record_timeout(0.1));
        }
        // 46th consecutive miss
        assert!(tracker.record_timeout(0.1));
    }

    #[test]
    fn test_elapsed_time_triggers_before_miss_count() {
        let mut tracker = FailureTracker::new(100.0);
        assert!(!tracker.record_timeout(104.9));
        assert!(tracker.record_timeout(105.1));
        assert_eq!(tracker.missed_frames(), 2);
    }

    #[test]
    fn test_boundary_time_is_exclusive() {
        let mut tracker = FailureTracker::new(100.0);
        // Exactly 5.0s elapsed: not yet a stall
        assert!(!tracker.record_timeout(105.0));
    }

    #[test]
    fn test_reset_clears_both_counters() {
        let mut tracker = FailureTracker::new(0.0);
        for _ in 0..MAX_MISSED_FRAMES {
            tracker.record_timeout(0.1);
        }
        tracker.reset(6.0);
        assert_eq!(tracker.missed_frames(), 0);
        // Timeline restarts from the reset instant
        assert!(!tracker.record_timeout(10.9));
        assert!(tracker.record_timeout(11.1));
    }
}
