#![forbid(unsafe_code)]

//! Host-driven monotonic time.
//!
//! Nothing in folio reads a wall clock. The host passes its per-frame
//! timestamp (e.g. the `requestAnimationFrame` argument) and everything
//! downstream works from that, which keeps tests deterministic.

use core::time::Duration;

/// Monotonic time source.
pub trait HostClock {
    /// Current monotonic time since page start.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time. Going backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Set current time from a DOMHighResTimeStamp in milliseconds.
    pub fn set_millis(&mut self, millis: f64) {
        self.set(millis_to_duration(millis));
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl HostClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Convert a host millisecond timestamp into a [`Duration`].
///
/// Negative and non-finite inputs map to zero.
#[must_use]
pub fn millis_to_duration(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::from_secs_f64(millis / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// What a scheduled callback sees when it is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Host time of this invocation.
    pub now: Duration,
    /// Time since this callback's previous invocation (zero on the first).
    pub delta: Duration,
    /// Invocation count for this callback, starting at 0.
    pub frame: u64,
}

impl FrameTick {
    #[must_use]
    pub const fn new(now: Duration, delta: Duration, frame: u64) -> Self {
        Self { now, delta, frame }
    }

    #[inline]
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.now.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let mut clock = DeterministicClock::new();
        clock.set(Duration::from_millis(50));
        clock.set(Duration::from_millis(10));
        assert_eq!(clock.now_mono(), Duration::from_millis(50));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now_mono(), Duration::from_millis(55));
    }

    #[test]
    fn millis_conversion() {
        assert_eq!(millis_to_duration(16.0), Duration::from_millis(16));
        assert_eq!(millis_to_duration(-1.0), Duration::ZERO);
        assert_eq!(millis_to_duration(f64::NAN), Duration::ZERO);
    }
}
