//! Debounce - deadline-based coalescing of rapid updates.
//!
//! A [`Debouncer`] holds the latest payload and a deadline. Arming it
//! again before the deadline replaces the payload and pushes the deadline
//! out, so a burst of updates collapses into one delivery. The host event
//! loop polls [`Debouncer::fire_due`] (and can shorten its input poll
//! timeout to the next deadline) instead of spawning timer threads, which
//! keeps everything on the UI thread and deterministic under test.

use std::time::{Duration, Instant};

/// Fallback delay when a configured timeout is invalid.
pub const DEFAULT_TIMEOUT_MS: f64 = 250.0;

/// Coalesces rapid payloads into one delivery after a quiet period.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with a delay in milliseconds.
    ///
    /// Negative, NaN, and infinite timeouts fall back to
    /// [`DEFAULT_TIMEOUT_MS`]. Zero is honored: the payload fires on the
    /// next poll.
    pub fn new(timeout_ms: f64) -> Self {
        let timeout_ms = if !timeout_ms.is_finite() || timeout_ms < 0.0 {
            DEFAULT_TIMEOUT_MS
        } else {
            timeout_ms
        };
        Self {
            delay: Duration::from_secs_f64(timeout_ms / 1000.0),
            pending: None,
            deadline: None,
        }
    }

    /// Arm with a payload. Replaces any pending payload and restarts the
    /// delay from `now`.
    pub fn arm(&mut self, payload: T, now: Instant) {
        self.pending = Some(payload);
        self.deadline = Some(now + self.delay);
    }

    /// Take the payload if its deadline has passed.
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drop any pending payload. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline = None;
        self.pending.take().is_some()
    }

    /// Whether a payload is waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending deadline, if armed. Feed this into the event loop's
    /// poll timeout.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut debouncer = Debouncer::new(100.0);
        let start = Instant::now();

        debouncer.arm(1, start);
        assert!(debouncer.is_armed());
        assert_eq!(debouncer.fire_due(start + Duration::from_millis(50)), None);
        assert_eq!(
            debouncer.fire_due(start + Duration::from_millis(100)),
            Some(1)
        );
        assert!(!debouncer.is_armed());
    }

    #[test]
    fn test_rearm_coalesces_and_extends() {
        let mut debouncer = Debouncer::new(100.0);
        let start = Instant::now();

        debouncer.arm(1, start);
        debouncer.arm(2, start + Duration::from_millis(60));

        // Original deadline has passed, but the rearm pushed it out.
        assert_eq!(debouncer.fire_due(start + Duration::from_millis(110)), None);
        assert_eq!(
            debouncer.fire_due(start + Duration::from_millis(160)),
            Some(2)
        );
    }

    #[test]
    fn test_zero_delay_fires_immediately() {
        let mut debouncer = Debouncer::new(0.0);
        let now = Instant::now();

        debouncer.arm("x", now);
        assert_eq!(debouncer.fire_due(now), Some("x"));
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let negative: Debouncer<()> = Debouncer::new(-5.0);
        assert_eq!(negative.delay(), Duration::from_millis(250));

        let nan: Debouncer<()> = Debouncer::new(f64::NAN);
        assert_eq!(nan.delay(), Duration::from_millis(250));

        let infinite: Debouncer<()> = Debouncer::new(f64::INFINITY);
        assert_eq!(infinite.delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::new(100.0);
        let now = Instant::now();

        assert!(!debouncer.cancel());
        debouncer.arm(7, now);
        assert!(debouncer.cancel());
        assert_eq!(debouncer.fire_due(now + Duration::from_millis(200)), None);
    }

    #[test]
    fn test_fire_when_empty() {
        let mut debouncer: Debouncer<u32> = Debouncer::new(100.0);
        assert_eq!(debouncer.fire_due(Instant::now()), None);
    }
}
