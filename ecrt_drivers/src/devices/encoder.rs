//! Incremental encoder interface (EL5021-style).
//!
//! One 32-bit counter with an index input (latch C). The device captures
//! the counter value at the index pulse into a latch register and flags
//! `latch_valid`; the driver then restarts its count from the captured
//! sample and clears the operator's one-shot `index_enable` request.
//! A separate set-counter handshake presets the hardware counter.

use ecrt_common::image::{self, PdoOffset};

use crate::counter::{CounterChannel, CounterWidth, LatchEvent};
use crate::driver::{CycleInfo, CyclicDriver};
use crate::link::LinkSupervisor;

/// Resolved process-image offsets of the encoder PDOs.
#[derive(Debug, Clone, Default)]
pub struct EncoderPdos {
    // Inputs
    pub latch_valid: PdoOffset,
    pub set_counter_done: PdoOffset,
    pub frequency_error: PdoOffset,
    pub amplitude_error: PdoOffset,
    pub input_c_status: PdoOffset,
    pub sync_error: PdoOffset,
    pub txpdo_error: PdoOffset,
    pub txpdo_state: PdoOffset,
    pub count: usize,
    pub latch_value: usize,
    // Outputs
    pub enable_latch: PdoOffset,
    pub set_counter: PdoOffset,
    pub set_counter_value: usize,
}

/// Operator-owned commanded signals, snapshotted once per cycle.
#[derive(Debug, Clone, Copy)]
pub struct EncoderCommands {
    /// One-shot: arm latch C; cleared by the driver when the latch fires.
    pub index_enable: bool,
    /// Counts per position unit.
    pub pos_scale: f64,
    /// One-shot: preset the hardware counter; cleared on acknowledge.
    pub set_counter: bool,
    /// Preset value for the set-counter handshake.
    pub set_counter_value: i32,
}

impl Default for EncoderCommands {
    fn default() -> Self {
        Self {
            index_enable: false,
            pos_scale: 1.0,
            set_counter: false,
            set_counter_value: 0,
        }
    }
}

/// Observed signals, overwritten every operational cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderObservations {
    /// Accumulated count.
    pub count: i64,
    /// Last captured latch register value.
    pub latch: i32,
    /// Scaled position.
    pub pos: f64,
    pub input_c_status: bool,
    pub frequency_error: bool,
    pub amplitude_error: bool,
    pub sync_error: bool,
    pub txpdo_error: bool,
    pub txpdo_state: bool,
    pub set_counter_done: bool,
}

/// Cyclic driver for the incremental encoder interface.
pub struct EncoderDriver {
    pdos: EncoderPdos,
    channel: CounterChannel,
    link: LinkSupervisor,
    /// Commanded signals (operator side).
    pub commands: EncoderCommands,
    /// Observed signals (device side).
    pub observations: EncoderObservations,
}

impl EncoderDriver {
    pub fn new(pdos: EncoderPdos) -> Self {
        Self {
            pdos,
            channel: CounterChannel::new(CounterWidth::W32),
            link: LinkSupervisor::new(),
            commands: EncoderCommands::default(),
            observations: EncoderObservations::default(),
        }
    }
}

impl CyclicDriver for EncoderDriver {
    fn name(&self) -> &'static str {
        "encoder"
    }

    fn read(&mut self, pd: &[u8], cycle: CycleInfo) {
        let edges = self.link.update(cycle.operational);
        if !edges.operational {
            // Outputs freeze; the channel resynchronizes on recovery.
            return;
        }

        let obs = &mut self.observations;
        obs.frequency_error = image::read_bit(pd, self.pdos.frequency_error);
        obs.amplitude_error = image::read_bit(pd, self.pdos.amplitude_error);
        obs.input_c_status = image::read_bit(pd, self.pdos.input_c_status);
        obs.sync_error = image::read_bit(pd, self.pdos.sync_error);
        obs.txpdo_error = image::read_bit(pd, self.pdos.txpdo_error);
        obs.txpdo_state = image::read_bit(pd, self.pdos.txpdo_state);
        obs.set_counter_done = image::read_bit(pd, self.pdos.set_counter_done);

        let raw_count = image::read_i32(pd, self.pdos.count);
        let raw_latch = image::read_i32(pd, self.pdos.latch_value);
        obs.latch = raw_latch;

        let latch = image::read_bit(pd, self.pdos.latch_valid).then_some(LatchEvent {
            seed: raw_latch as i64,
            reset_count: 0,
        });

        let out = self.channel.update(
            raw_count as i64,
            edges.became_operational,
            latch,
            &mut self.commands.pos_scale,
        );
        if out.latch_applied {
            self.commands.index_enable = false;
        }
        if obs.set_counter_done {
            self.commands.set_counter = false;
        }

        obs.count = out.count;
        obs.pos = out.position;
    }

    fn write(&mut self, pd: &mut [u8]) {
        image::write_bit(pd, self.pdos.enable_latch, self.commands.index_enable);
        image::write_bit(pd, self.pdos.set_counter, self.commands.set_counter);
        image::write_i32(
            pd,
            self.pdos.set_counter_value,
            self.commands.set_counter_value,
        );
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
