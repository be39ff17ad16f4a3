//! Machine-control pendant (handwheel subset).
//!
//! The pendant exposes a rolling 8-bit handwheel register, a one-hot axis
//! selector byte, an increment selector and two override counters. The
//! handwheel delta is weighted by the increment selector (x1/x10/x100) and
//! accumulated only while the operator has handwheel mode selected; the
//! key/LED matrix of the device is handled elsewhere.

use ecrt_common::image;

use crate::counter::{wrap_signed, CounterWidth};
use crate::driver::{CycleInfo, CyclicDriver};
use crate::link::LinkSupervisor;

/// Number of selectable axes.
pub const PENDANT_AXES: usize = 4;

/// Feed override ceiling [counts].
pub const FEED_OVERRIDE_MAX: u8 = 30;

/// Spindle override ceiling before the fixed offset [counts].
pub const SPINDLE_OVERRIDE_MAX: u8 = 10;

/// Offset added to the clamped spindle override counter.
pub const SPINDLE_OVERRIDE_OFFSET: u8 = 5;

/// Resolved process-image offsets of the pendant PDOs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendantPdos {
    /// Rolling 8-bit handwheel position register.
    pub hw_move: usize,
    /// One-hot axis selector byte.
    pub axis_select: usize,
    /// Increment selector byte (3 bits used).
    pub increment_select: usize,
    pub feed_override: usize,
    pub spindle_override: usize,
}

/// Operator-owned commanded signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendantCommands {
    /// Handwheel counts accumulate only while this mode is selected.
    pub handwheel_mode: bool,
}

/// Observed signals, overwritten every operational cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendantObservations {
    /// Accumulated, increment-weighted handwheel counts.
    pub hw_counts: i64,
    /// Selected axis, decoded from the one-hot selector. All false when the
    /// selector is parked or reads a non-one-hot pattern.
    pub axis_enable: [bool; PENDANT_AXES],
    /// Feed override counter, clamped to `0..=FEED_OVERRIDE_MAX`.
    pub feed_override: u8,
    /// Spindle override counter, clamped then offset.
    pub spindle_override: u8,
    /// Weight applied to handwheel deltas this cycle (0, 1, 10 or 100).
    pub increment_weight: i64,
}

/// Weight encoded by the 3-bit increment selector.
#[inline]
fn increment_weight(selector: u8) -> i64 {
    match selector & 0b111 {
        4 => 100,
        2 => 10,
        1 => 1,
        _ => 0,
    }
}

/// Cyclic driver for the pendant.
pub struct PendantDriver {
    pdos: PendantPdos,
    link: LinkSupervisor,
    last_raw: i64,
    initialized: bool,
    pub commands: PendantCommands,
    pub observations: PendantObservations,
}

impl PendantDriver {
    pub fn new(pdos: PendantPdos) -> Self {
        Self {
            pdos,
            link: LinkSupervisor::new(),
            last_raw: 0,
            initialized: false,
            commands: PendantCommands::default(),
            observations: PendantObservations::default(),
        }
    }
}

impl CyclicDriver for PendantDriver {
    fn name(&self) -> &'static str {
        "pendant"
    }

    fn read(&mut self, pd: &[u8], cycle: CycleInfo) {
        let edges = self.link.update(cycle.operational);
        if !edges.operational {
            return;
        }

        let obs = &mut self.observations;
        let raw = image::read_u8(pd, self.pdos.hw_move) as i64;
        let weight = increment_weight(image::read_u8(pd, self.pdos.increment_select));
        obs.increment_weight = weight;

        if !self.initialized || edges.became_operational {
            // Seed only; a stale register after a link gap is not motion.
            self.initialized = true;
        } else {
            let delta = wrap_signed(raw - self.last_raw, CounterWidth::W8);
            if self.commands.handwheel_mode {
                obs.hw_counts += delta * weight;
            }
        }
        self.last_raw = raw;

        let selector = image::read_u8(pd, self.pdos.axis_select);
        for (i, enable) in obs.axis_enable.iter_mut().enumerate() {
            *enable = selector == 1 << i;
        }

        obs.feed_override = image::read_u8(pd, self.pdos.feed_override).min(FEED_OVERRIDE_MAX);
        obs.spindle_override = image::read_u8(pd, self.pdos.spindle_override)
            .min(SPINDLE_OVERRIDE_MAX)
            + SPINDLE_OVERRIDE_OFFSET;
    }

    fn write(&mut self, _pd: &mut [u8]) {}
}

// ─── Tests ──────────────────────────────────────────────────────────
