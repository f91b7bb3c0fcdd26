//! Per-epoch timestamp calibration
//!
//! Device and host clocks are independently monotonic with an arbitrary
//! constant skew at connection time. The first successful frame of an Online
//! epoch anchors `offset = host_now - device_ts`; every later frame of the
//! epoch reuses the identical scalar. Continuous re-synchronization (drift
//! correction) is deliberately not attempted.

/// Epoch-scoped timestamp offset with an explicit calibration-pending flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOffset {
    pending: bool,
    offset: f64,
}

impl EpochOffset {
    pub fn new() -> Self {
        Self {
            pending: true,
            offset: 0.0,
        }
    }

    /// Mark calibration pending; called exactly when a new Online epoch begins.
    pub fn invalidate(&mut self) {
        self.pending = true;
    }

    /// Anchor the offset on the first frame of the epoch; later calls within
    /// the same epoch return the frozen value untouched.
    pub fn lock(&mut self, host_now: f64, device_ts: f64) -> f64 {
        if self.pending {
            self.offset = host_now - device_ts;
            self.pending = false;
        }
        self.offset
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Frozen offset of the current epoch, if calibrated
    pub fn value(&self) -> Option<f64> {
        if self.pending {
            None
        } else {
            Some(self.offset)
        }
    }
}

impl Default for EpochOffset {
    fn default() -> Self {
        Self::new()
    }
}
