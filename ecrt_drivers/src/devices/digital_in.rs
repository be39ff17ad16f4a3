//! Digital input modules (16 or 32 independent channels).
//!
//! Pure stateless unpack: every operational cycle the input word is split
//! into per-channel `active`/`inverted` pairs. No history, no write side.

use ecrt_common::image;

use crate::driver::{CycleInfo, CyclicDriver};
use crate::link::LinkSupervisor;

/// Maximum channels on one module.
pub const MAX_DIGITAL_IN: usize = 32;

/// Resolved process-image offset of the input word.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitalInPdos {
    /// Byte offset of the packed input word.
    pub word: usize,
}

/// One input channel: the raw level and its complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitalInput {
    pub active: bool,
    pub inverted: bool,
}

/// Cyclic driver for the digital input modules.
pub struct DigitalInDriver {
    pdos: DigitalInPdos,
    channels: usize,
    link: LinkSupervisor,
    /// Observed inputs, `[0..channels]` valid.
    pub inputs: [DigitalInput; MAX_DIGITAL_IN],
}

impl DigitalInDriver {
    /// `channels` is 16 or 32 depending on the module variant.
    pub fn new(pdos: DigitalInPdos, channels: usize) -> Self {
        Self {
            pdos,
            channels: channels.min(MAX_DIGITAL_IN),
            link: LinkSupervisor::new(),
            inputs: [DigitalInput::default(); MAX_DIGITAL_IN],
        }
    }

    /// Number of populated channels.
    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl CyclicDriver for DigitalInDriver {
    fn name(&self) -> &'static str {
        "digital_in"
    }

    fn read(&mut self, pd: &[u8], cycle: CycleInfo) {
        let edges = self.link.update(cycle.operational);
        if !edges.operational {
            return;
        }

        let mut word = image::read_u32(pd, self.pdos.word);
        for input in self.inputs.iter_mut().take(self.channels) {
            let level = word & 1 != 0;
            input.active = level;
            input.inverted = !level;
            word >>= 1;
        }
    }

    fn write(&mut self, _pd: &mut [u8]) {}
}

// ─── Tests ──────────────────────────────────────────────────────────
