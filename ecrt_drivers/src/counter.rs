//! Rolling counter channel: overflow-safe accumulation of a fixed-width
//! hardware counter with index-latch handling and rescale-safe position.
//!
//! The hardware samples a free-running 8/16/32-bit counter once per cycle.
//! Consecutive samples are turned into a signed delta through explicit
//! modular reinterpretation ([`wrap_signed`]) instead of relying on native
//! integer overflow, so the logic is identical for every width and for any
//! host word size. The accumulated count is unbounded (i64) and is the
//! externally visible quantity; the position output is the count times the
//! cached scale reciprocal.
//!
//! A true physical displacement of half the counter modulus or more within
//! one cycle is indistinguishable from wraparound and aliases to the
//! minimal-magnitude delta. That is a sampling limit, not a defect.

use ecrt_common::scale::Scale;
use static_assertions::const_assert;

// wrap_signed computes diff % m + m + half in i64; the widest modulus must
// leave that headroom.
const_assert!(CounterWidth::W32.modulus() < i64::MAX / 4);

/// Bit width of the hardware counter, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterWidth {
    /// 8-bit counter (modulus 256).
    W8,
    /// 16-bit counter (modulus 65536).
    W16,
    /// 32-bit counter (modulus 2^32).
    W32,
}

impl CounterWidth {
    /// Wraparound modulus `M = 2^width`.
    #[inline]
    pub const fn modulus(self) -> i64 {
        match self {
            Self::W8 => 1 << 8,
            Self::W16 => 1 << 16,
            Self::W32 => 1 << 32,
        }
    }
}

/// Reinterpret a raw sample difference into the signed range `[-M/2, M/2)`.
///
/// A difference of exactly `M/2` maps to `-M/2` (two's-complement
/// convention); that is the aliasing boundary.
#[inline]
pub const fn wrap_signed(diff: i64, width: CounterWidth) -> i64 {
    let m = width.modulus();
    let half = m / 2;
    ((diff % m + m + half) % m) - half
}

/// Index/latch event: the hardware captured the counter at a reference
/// pulse and the channel must resynchronize to it.
#[derive(Debug, Clone, Copy)]
pub struct LatchEvent {
    /// Captured counter sample at the pulse (sign-extended).
    pub seed: i64,
    /// Count the channel restarts from (typically 0).
    pub reset_count: i64,
}

/// Result of one counter cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterOutput {
    /// Accumulated count after this cycle.
    pub count: i64,
    /// Scaled position, `count / scale`.
    pub position: f64,
    /// True if a latch event was absorbed this cycle; the caller clears its
    /// one-shot latch-enable request on this.
    pub latch_applied: bool,
}

/// Overflow-safe tracking of one hardware counter.
#[derive(Debug, Clone, Copy)]
pub struct CounterChannel {
    width: CounterWidth,
    /// Last absorbed raw sample (sign-extended).
    last_raw: i64,
    /// Unbounded accumulated count.
    accumulated: i64,
    scale: Scale,
    /// False until the first valid sample is absorbed.
    initialized: bool,
}

impl CounterChannel {
    /// New channel for a counter of the given width.
    pub fn new(width: CounterWidth) -> Self {
        Self {
            width,
            last_raw: 0,
            accumulated: 0,
            scale: Scale::new(),
            initialized: false,
        }
    }

    /// Absorb one cycle's raw sample.
    ///
    /// - `raw`: sign-extended counter sample from the process image.
    /// - `resync`: true on the first cycle after the link came back; the
    ///   sample is absorbed without applying a delta, so whatever the
    ///   counter did while the link was down is not misread as motion.
    /// - `latch`: index/latch capture; takes precedence over the delta for
    ///   this cycle and restarts the count.
    /// - `scale_cmd`: commanded counts-per-unit scale, corrected in place
    ///   if degenerate.
    pub fn update(
        &mut self,
        raw: i64,
        resync: bool,
        latch: Option<LatchEvent>,
        scale_cmd: &mut f64,
    ) -> CounterOutput {
        self.scale.refresh(scale_cmd);

        if !self.initialized || resync {
            self.last_raw = raw;
            self.initialized = true;
        }

        let mut latch_applied = false;
        if let Some(event) = latch {
            // The latch wins over the wrapped delta in the same cycle.
            // Counts between the pulse and this sample are picked up next
            // cycle from the seeded last_raw.
            self.last_raw = event.seed;
            self.accumulated = event.reset_count;
            latch_applied = true;
        } else {
            self.accumulated += wrap_signed(raw - self.last_raw, self.width);
            self.last_raw = raw;
        }

        CounterOutput {
            count: self.accumulated,
            position: self.accumulated as f64 * self.scale.recip(),
            latch_applied,
        }
    }

    /// Accumulated count without advancing the channel.
    #[inline]
    pub fn count(&self) -> i64 {
        self.accumulated
    }

    /// Effective (clamped) scale.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale.value()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
