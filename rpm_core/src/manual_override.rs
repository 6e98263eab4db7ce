//! Grace window after an operator speed change.
//!
//! The window is a fixed deadline from the last manual change; telemetry
//! never extends it. Expiry is checked against the caller's `now`, so there
//! are no timers to cancel.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Deadline {
    #[default]
    Unarmed,
    Until(Instant),
    /// `now + window` is not representable; the window never closes.
    Never,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualOverride {
    deadline: Deadline,
}

impl ManualOverride {
    /// Start (or restart) the window at `now`.
    pub fn arm(&mut self, now: Instant, window: Duration) {
        self.deadline = now
            .checked_add(window)
            .map_or(Deadline::Never, Deadline::Until);
    }

    /// Suppression is active while `now < until`.
    #[inline]
    pub fn is_active(&self, now: Instant) -> bool {
        match self.deadline {
            Deadline::Unarmed => false,
            Deadline::Until(until) => now < until,
            Deadline::Never => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_until_armed() {
        let gate = ManualOverride::default();
        assert!(!gate.is_active(Instant::now()));
    }

    #[test]
    fn window_end_is_exclusive() {
        let t0 = Instant::now();
        let w = Duration::from_millis(1500);
        let mut gate = ManualOverride::default();
        gate.arm(t0, w);
        assert!(gate.is_active(t0));
        assert!(gate.is_active(t0 + Duration::from_millis(1499)));
        assert!(!gate.is_active(t0 + w));
    }

    #[test]
    fn rearm_moves_deadline() {
        let t0 = Instant::now();
        let w = Duration::from_millis(100);
        let mut gate = ManualOverride::default();
        gate.arm(t0, w);
        gate.arm(t0 + Duration::from_millis(80), w);
        assert!(gate.is_active(t0 + Duration::from_millis(150)));
        assert!(!gate.is_active(t0 + Duration::from_millis(180)));
    }

    #[test]
    fn unrepresentable_deadline_stays_active() {
        let t0 = Instant::now();
        let mut gate = ManualOverride::default();
        gate.arm(t0, Duration::MAX);
        assert!(gate.is_active(t0));
        assert!(gate.is_active(t0 + Duration::from_secs(86_400)));
    }

    #[test]
    fn zero_window_never_suppresses() {
        let t0 = Instant::now();
        let mut gate = ManualOverride::default();
        gate.arm(t0, Duration::ZERO);
        assert!(!gate.is_active(t0));
    }
}
