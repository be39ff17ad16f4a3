//! Monotonic countdown gating automatic fault clearing.
//!
//! When a faulted drive is auto-reset on an enable edge, the drive needs a
//! recovery window to run its internal reset handshake. While the window is
//! counting down the externally visible fault output is suppressed so the
//! downstream fault indicator does not flap. The countdown is driven by the
//! caller-supplied elapsed time, not a wall clock, and saturates at zero.

/// Saturating nanosecond countdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultAutoResetTimer {
    remaining_ns: i64,
}

impl FaultAutoResetTimer {
    /// New, expired timer.
    pub const fn new() -> Self {
        Self { remaining_ns: 0 }
    }

    /// Start (or restart) the countdown.
    #[inline]
    pub fn arm(&mut self, duration_ns: i64) {
        self.remaining_ns = duration_ns.max(0);
    }

    /// Advance the countdown by one cycle's elapsed time.
    ///
    /// Returns true if the timer was still active entering this cycle.
    /// Arming and ticking in the same cycle therefore takes effect from the
    /// next cycle on, matching the read-before-write cycle ordering.
    #[inline]
    pub fn tick(&mut self, elapsed_ns: i64) -> bool {
        if self.remaining_ns > 0 {
            self.remaining_ns = (self.remaining_ns - elapsed_ns.max(0)).max(0);
            true
        } else {
            false
        }
    }

    /// Remaining time [ns].
    #[inline]
    pub fn remaining_ns(&self) -> i64 {
        self.remaining_ns
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_timer_is_inactive() {
        let mut t = FaultAutoResetTimer::new();
        assert!(!t.tick(1_000_000));
    }

    #[test]
    fn active_until_cumulative_elapsed_reaches_duration() {
        let mut t = FaultAutoResetTimer::new();
        t.arm(3_000_000);
        // Three full cycles of 1ms cover the window; each reports active.
        assert!(t.tick(1_000_000));
        assert!(t.tick(1_000_000));
        assert!(t.tick(1_000_000));
        // Window consumed.
        assert!(!t.tick(1_000_000));
    }

    #[test]
    fn saturates_at_zero() {
        let mut t = FaultAutoResetTimer::new();
        t.arm(500);
        assert!(t.tick(1_000_000));
        assert_eq!(t.remaining_ns(), 0);
        assert!(!t.tick(1_000_000));
    }

    #[test]
    fn rearming_restarts_the_window() {
        let mut t = FaultAutoResetTimer::new();
        t.arm(1_000);
        t.tick(600);
        t.arm(1_000);
        assert_eq!(t.remaining_ns(), 1_000);
        assert!(t.tick(600));
        assert!(t.tick(600));
        assert!(!t.tick(600));
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let mut t = FaultAutoResetTimer::new();
        t.arm(-5);
        assert!(!t.tick(1));

        t.arm(100);
        assert!(t.tick(-50));
        assert_eq!(t.remaining_ns(), 100);
    }
}
