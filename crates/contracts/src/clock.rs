//! Host clock abstraction
//!
//! The acquisition loop and the notification bus both measure elapsed time
//! against the host clock: monotonically increasing seconds as f64.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Host timestamp source
///
/// Implementations must be monotonic; the epoch is arbitrary.
pub trait HostClock: Send + Sync {
    /// Current host time in seconds
    fn now(&self) -> f64;
}

/// Wall host clock backed by `Instant`
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock for tests
///
/// Stores the f64 bits in an atomic so clones observe the same timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    /// Set the current time
    pub fn set(&self, now: f64) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    /// Advance the current time by `delta` seconds
    pub fn advance(&self, delta: f64) {
        self.set(self.now() + delta);
    }
}

impl HostClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
