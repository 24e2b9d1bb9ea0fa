//! Rate limiting for live probe analysis.
//!
//! Driven by simulation time rather than the wall clock, so a replayed
//! session probes at exactly the same ticks.

use signalscape_core::constants::{EPSILON, PROBE_MIN_INTERVAL_SECS};

/// Allows at most one analysis per `interval` seconds of simulation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeThrottle {
    interval: f64,
    last_run: Option<f64>,
}

impl Default for ProbeThrottle {
    fn default() -> Self {
        Self::new(PROBE_MIN_INTERVAL_SECS)
    }
}

impl ProbeThrottle {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval: if interval_secs.is_finite() {
                interval_secs.max(0.0)
            } else {
                PROBE_MIN_INTERVAL_SECS
            },
            last_run: None,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Whether an analysis may run at `now`. Records the run when it may.
    pub fn try_acquire(&mut self, now: f64) -> bool {
        let ready = match self.last_run {
            None => true,
            // Clock went backwards (session reset): start over.
            Some(last) if now < last => true,
            Some(last) => now - last + EPSILON >= self.interval,
        };
        if ready {
            self.last_run = Some(now);
        }
        ready
    }

    /// Forget the last run so the next call is allowed.
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}
