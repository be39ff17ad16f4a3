//! User scale with cached reciprocal and dead-zone clamp.
//!
//! Every position channel multiplies its accumulated count by the reciprocal
//! of a user-settable counts-per-unit scale. The reciprocal is cached and
//! recomputed only when the commanded value actually changes, so the cyclic
//! path performs no division. A commanded value inside the dead zone around
//! zero is corrected to 1.0 in place; feeding it to a division would blow up
//! the position output, and the hot path must not fail.

use tracing::warn;

use crate::consts::SCALE_DEAD_ZONE;

/// Cached scale/reciprocal pair, refreshed on change only.
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    /// Effective (clamped) scale in counts per unit.
    value: f64,
    /// Last commanded value absorbed, for change detection.
    last_seen: f64,
    /// Cached `1.0 / value`.
    recip: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self::new()
    }
}

impl Scale {
    /// New scale of 1.0. The first [`Scale::refresh`] always recomputes.
    pub fn new() -> Self {
        Self {
            value: 1.0,
            // NaN compares unequal to everything, forcing the first refresh.
            last_seen: f64::NAN,
            recip: 1.0,
        }
    }

    /// Absorb the commanded scale if it changed since the last cycle.
    ///
    /// A commanded value inside the dead zone (or non-finite) is corrected
    /// to 1.0 in place so the operator-visible slot reflects the value
    /// actually in use. Returns `true` if the reciprocal was recomputed.
    pub fn refresh(&mut self, commanded: &mut f64) -> bool {
        if *commanded == self.last_seen {
            return false;
        }
        if !commanded.is_finite() || commanded.abs() < SCALE_DEAD_ZONE {
            warn!(commanded = *commanded, "scale in dead zone, clamped to 1.0");
            *commanded = 1.0;
        }
        self.last_seen = *commanded;
        self.value = *commanded;
        self.recip = 1.0 / *commanded;
        true
    }

    /// Effective scale in counts per unit.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Cached reciprocal, `1.0 / value()`.
    #[inline]
    pub fn recip(&self) -> f64 {
        self.recip
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_refresh_recomputes() {
        let mut s = Scale::new();
        let mut cmd = 4.0;
        assert!(s.refresh(&mut cmd));
        assert_eq!(s.value(), 4.0);
        assert_eq!(s.recip(), 0.25);
    }

    #[test]
    fn unchanged_value_recomputes_at_most_once() {
        let mut s = Scale::new();
        let mut cmd = 2.0;
        assert!(s.refresh(&mut cmd));
        assert!(!s.refresh(&mut cmd));
        assert!(!s.refresh(&mut cmd));
    }

    #[test]
    fn zero_scale_clamps_to_one() {
        let mut s = Scale::new();
        let mut cmd = 0.0;
        assert!(s.refresh(&mut cmd));
        assert_eq!(cmd, 1.0);
        assert_eq!(s.value(), 1.0);
        assert_eq!(s.recip(), 1.0);
    }

    #[test]
    fn dead_zone_clamps_both_signs() {
        let mut s = Scale::new();
        let mut cmd = 1e-21;
        s.refresh(&mut cmd);
        assert_eq!(cmd, 1.0);

        let mut cmd = -1e-21;
        // Force change detection past the previous 1.0.
        s.refresh(&mut cmd);
        assert_eq!(s.recip(), 1.0);
    }

    #[test]
    fn just_outside_dead_zone_is_kept() {
        let mut s = Scale::new();
        let mut cmd = -1e-19;
        s.refresh(&mut cmd);
        assert_eq!(cmd, -1e-19);
        assert_eq!(s.value(), -1e-19);
    }

    #[test]
    fn nan_scale_clamps_to_one() {
        let mut s = Scale::new();
        let mut cmd = f64::NAN;
        assert!(s.refresh(&mut cmd));
        assert_eq!(cmd, 1.0);
        assert_eq!(s.recip(), 1.0);
    }

    #[test]
    fn negative_scale_keeps_sign() {
        let mut s = Scale::new();
        let mut cmd = -8.0;
        s.refresh(&mut cmd);
        assert_eq!(s.recip(), -0.125);
    }
}
