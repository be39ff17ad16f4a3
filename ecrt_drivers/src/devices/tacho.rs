//! Servo tachometer/encoder module (two channels).
//!
//! Each channel carries an encoder counter with a latch-request/latch-ack
//! handshake, a sticky fault fed by the device error dword and cleared
//! through an error-clear/clear-ack handshake, and an analog velocity
//! command scaled into the device's fixed-point range. A CAN message
//! passthrough (code + data) rides along on the output PDOs.

use bitflags::bitflags;
use ecrt_common::consts::MAX_CHANNELS;
use ecrt_common::image;
use ecrt_common::scale::Scale;

use crate::counter::{CounterChannel, CounterWidth, LatchEvent};
use crate::driver::{CycleInfo, CyclicDriver};
use crate::link::LinkSupervisor;

/// Full-scale raw velocity command (fixed point, corresponds to 10V).
pub const VEL_CMD_MAX_RAW: i32 = 0x1F_FFFF;

bitflags! {
    /// Channel status dword bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TachoStatus: u32 {
        /// Latch captured, latch register valid.
        const LATCH_ACK       = 1 << 3;
        /// Error-clear request acknowledged.
        const ERROR_CLEAR_ACK = 1 << 4;
    }
}

bitflags! {
    /// Channel error dword bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TachoError: u32 {
        /// Encoder signal fault.
        const ENCODER = 1 << 1;
    }
}

bitflags! {
    /// Channel control word bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TachoControl: u16 {
        /// Clear the sticky device error.
        const ERROR_CLEAR   = 1 << 9;
        /// Arm the reference-pulse latch.
        const LATCH_REQUEST = 1 << 11;
    }
}

/// Resolved process-image offsets of one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TachoChannelPdos {
    // Outputs
    pub vel_cmd: usize,
    pub control: usize,
    pub index_pulse_position: usize,
    pub enc_resolution: usize,
    pub enc_max_speed: usize,
    pub message_code: usize,
    pub message_data: usize,
    // Inputs
    pub count: usize,
    pub latch: usize,
    pub status: usize,
    pub error: usize,
}

/// Resolved offsets for the whole slave.
#[derive(Debug, Clone, Default)]
pub struct TachoPdos {
    pub channels: heapless::Vec<TachoChannelPdos, MAX_CHANNELS>,
}

/// Operator-owned commanded signals of one channel.
#[derive(Debug, Clone, Copy)]
pub struct TachoCommands {
    /// Velocity command in user units.
    pub vel_cmd: f64,
    /// Counts per position unit.
    pub pos_scale: f64,
    /// User units per full-scale velocity command.
    pub vel_scale: f64,
    /// One-shot: arm the latch; cleared by the driver on latch-ack.
    pub index_enable: bool,
    /// Reference pulse position selector (2 bits used).
    pub index_pulse_position: u16,
    /// Clear the channel fault.
    pub fault_reset: bool,
    /// CAN message passthrough.
    pub message_code: u32,
    pub message_data: f64,
    /// Encoder lines per revolution parameter echo.
    pub enc_resolution: u16,
    /// Rated speed parameter echo [rpm].
    pub enc_max_speed: i16,
}

impl Default for TachoCommands {
    fn default() -> Self {
        Self {
            vel_cmd: 0.0,
            pos_scale: 1.0,
            vel_scale: 1.0,
            index_enable: false,
            index_pulse_position: 0,
            fault_reset: false,
            message_code: 0,
            message_data: 0.0,
            enc_resolution: 1000,
            enc_max_speed: 6000,
        }
    }
}

/// Observed signals of one channel, overwritten every operational cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TachoObservations {
    pub count: i64,
    pub pos: f64,
    /// Sticky channel fault: set by the encoder error bit or link loss,
    /// cleared when the device acknowledges an error clear.
    pub fault: bool,
}

/// One tacho/encoder channel.
pub struct TachoChannel {
    pdos: TachoChannelPdos,
    counter: CounterChannel,
    vel_scale: Scale,
    pub commands: TachoCommands,
    pub observations: TachoObservations,
}

impl TachoChannel {
    fn new(pdos: TachoChannelPdos) -> Self {
        Self {
            pdos,
            counter: CounterChannel::new(CounterWidth::W32),
            vel_scale: Scale::new(),
            commands: TachoCommands::default(),
            observations: TachoObservations::default(),
        }
    }

    fn read(&mut self, pd: &[u8], resync: bool) {
        self.vel_scale.refresh(&mut self.commands.vel_scale);

        let status = TachoStatus::from_bits_truncate(image::read_u32(pd, self.pdos.status));
        let error = TachoError::from_bits_truncate(image::read_u32(pd, self.pdos.error));

        // Clear-ack retires the sticky fault before new errors are folded in.
        if self.observations.fault && status.contains(TachoStatus::ERROR_CLEAR_ACK) {
            self.observations.fault = false;
        }
        if error.contains(TachoError::ENCODER) {
            self.observations.fault = true;
        }

        let raw_count = image::read_i32(pd, self.pdos.count);
        let latch = status.contains(TachoStatus::LATCH_ACK).then(|| LatchEvent {
            seed: image::read_i32(pd, self.pdos.latch) as i64,
            reset_count: 0,
        });

        let out = self.counter.update(
            raw_count as i64,
            resync,
            latch,
            &mut self.commands.pos_scale,
        );
        if out.latch_applied {
            self.commands.index_enable = false;
        }
        self.observations.count = out.count;
        self.observations.pos = out.position;
    }

    fn write(&mut self, pd: &mut [u8]) {
        let mut control = TachoControl::empty();
        if self.commands.index_enable {
            control |= TachoControl::LATCH_REQUEST;
        }
        if self.observations.fault && self.commands.fault_reset {
            control |= TachoControl::ERROR_CLEAR;
        }
        image::write_u16(pd, self.pdos.control, control.bits());

        self.commands.index_pulse_position &= 0b11;
        image::write_u16(
            pd,
            self.pdos.index_pulse_position,
            self.commands.index_pulse_position,
        );

        image::write_u32(pd, self.pdos.message_code, self.commands.message_code);
        image::write_f32(pd, self.pdos.message_data, self.commands.message_data as f32);

        image::write_u16(pd, self.pdos.enc_resolution, self.commands.enc_resolution);
        image::write_i16(pd, self.pdos.enc_max_speed, self.commands.enc_max_speed);

        // Full scale corresponds to vel_scale user units.
        let full_scale = VEL_CMD_MAX_RAW as f64;
        let raw = (self.commands.vel_cmd * full_scale * self.vel_scale.recip())
            .clamp(-full_scale, full_scale);
        image::write_i32(pd, self.pdos.vel_cmd, raw as i32);
    }
}

/// Cyclic driver for the two-channel tachometer/encoder slave.
pub struct TachoDriver {
    link: LinkSupervisor,
    pub channels: heapless::Vec<TachoChannel, MAX_CHANNELS>,
}

impl TachoDriver {
    pub fn new(pdos: TachoPdos) -> Self {
        let mut channels = heapless::Vec::new();
        for chan_pdos in &pdos.channels {
            // Capacity matches the pdos list by construction.
            let _ = channels.push(TachoChannel::new(*chan_pdos));
        }
        Self {
            link: LinkSupervisor::new(),
            channels,
        }
    }
}

impl CyclicDriver for TachoDriver {
    fn name(&self) -> &'static str {
        "tacho"
    }

    fn read(&mut self, pd: &[u8], cycle: CycleInfo) {
        let edges = self.link.update(cycle.operational);
        if !edges.operational {
            // Fail safe while the link is down.
            for chan in &mut self.channels {
                chan.observations.fault = true;
            }
            return;
        }
        for chan in &mut self.channels {
            chan.read(pd, edges.became_operational);
        }
    }

    fn write(&mut self, pd: &mut [u8]) {
        for chan in &mut self.channels {
            chan.write(pd);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: i64 = 1_000_000;

    fn one_channel() -> TachoPdos {
        let mut channels = heapless::Vec::new();
        let _ = channels.push(TachoChannelPdos {
            vel_cmd: 0,
            control: 4,
            index_pulse_position: 6,
            enc_resolution: 8,
            enc_max_speed: 10,
            message_code: 12,
            message_data: 16,
            count: 20,
            latch: 24,
            status: 28,
            error: 32,
        });
        TachoPdos { channels }
    }

    fn image_with(count: i32, latch: i32, status: u32, error: u32) -> [u8; 36] {
        let mut pd = [0u8; 36];
        image::write_i32(&mut pd, 20, count);
        image::write_i32(&mut pd, 24, latch);
        image::write_u32(&mut pd, 28, status);
        image::write_u32(&mut pd, 32, error);
        pd
    }

    #[test]
    fn latch_ack_restarts_count_and_clears_request() {
        let mut drv = TachoDriver::new(one_channel());
        drv.channels[0].commands.index_enable = true;

        drv.read(&image_with(100, 0, 0, 0), CycleInfo::operational(PERIOD));

        let mut pd = [0u8; 36];
        drv.write(&mut pd);
        let control = TachoControl::from_bits_truncate(image::read_u16(&pd, 4));
        assert!(control.contains(TachoControl::LATCH_REQUEST));

        drv.read(
            &image_with(130, 120, TachoStatus::LATCH_ACK.bits(), 0),
            CycleInfo::operational(PERIOD),
        );
        assert_eq!(drv.channels[0].observations.count, 0);
        assert!(!drv.channels[0].commands.index_enable);

        drv.read(&image_with(150, 120, 0, 0), CycleInfo::operational(PERIOD));
        assert_eq!(drv.channels[0].observations.count, 30);
    }

    #[test]
    fn encoder_error_sets_sticky_fault_until_clear_ack() {
        let mut drv = TachoDriver::new(one_channel());
        drv.read(&image_with(0, 0, 0, 0), CycleInfo::operational(PERIOD));
        assert!(!drv.channels[0].observations.fault);

        // One cycle with the encoder error bit: fault latches.
        drv.read(
            &image_with(0, 0, 0, TachoError::ENCODER.bits()),
            CycleInfo::operational(PERIOD),
        );
        assert!(drv.channels[0].observations.fault);

        // Error bit gone, but no acknowledge yet: fault stays.
        drv.read(&image_with(0, 0, 0, 0), CycleInfo::operational(PERIOD));
        assert!(drv.channels[0].observations.fault);

        // Operator commands a reset: the control word carries error-clear.
        drv.channels[0].commands.fault_reset = true;
        let mut pd = [0u8; 36];
        drv.write(&mut pd);
        let control = TachoControl::from_bits_truncate(image::read_u16(&pd, 4));
        assert!(control.contains(TachoControl::ERROR_CLEAR));

        // Device acknowledges: fault drops.
        drv.read(
            &image_with(0, 0, TachoStatus::ERROR_CLEAR_ACK.bits(), 0),
            CycleInfo::operational(PERIOD),
        );
        assert!(!drv.channels[0].observations.fault);
    }

    #[test]
    fn link_loss_forces_fault() {
        let mut drv = TachoDriver::new(one_channel());
        drv.read(&image_with(0, 0, 0, 0), CycleInfo::operational(PERIOD));
        drv.read(&image_with(0, 0, 0, 0), CycleInfo::link_down(PERIOD));
        assert!(drv.channels[0].observations.fault);
    }

    #[test]
    fn velocity_command_is_scaled_and_clamped() {
        let mut drv = TachoDriver::new(one_channel());
        drv.channels[0].commands.vel_scale = 10.0;
        drv.read(&image_with(0, 0, 0, 0), CycleInfo::operational(PERIOD));

        let mut pd = [0u8; 36];
        drv.channels[0].commands.vel_cmd = 5.0;
        drv.write(&mut pd);
        let raw = image::read_i32(&pd, 0);
        assert_eq!(raw, (0.5 * VEL_CMD_MAX_RAW as f64) as i32);

        // Over-range commands clamp to full scale.
        drv.channels[0].commands.vel_cmd = 25.0;
        drv.write(&mut pd);
        assert_eq!(image::read_i32(&pd, 0), VEL_CMD_MAX_RAW);

        drv.channels[0].commands.vel_cmd = -25.0;
        drv.write(&mut pd);
        assert_eq!(image::read_i32(&pd, 0), -VEL_CMD_MAX_RAW);
    }

    #[test]
    fn pulse_position_selector_is_masked() {
        let mut drv = TachoDriver::new(one_channel());
        drv.channels[0].commands.index_pulse_position = 0b111;
        let mut pd = [0u8; 36];
        drv.write(&mut pd);
        assert_eq!(image::read_u16(&pd, 6), 0b11);
        assert_eq!(drv.channels[0].commands.index_pulse_position, 0b11);
    }

    #[test]
    fn parameters_and_message_are_echoed() {
        let mut drv = TachoDriver::new(one_channel());
        drv.channels[0].commands.message_code = 0x123;
        drv.channels[0].commands.message_data = 2.5;
        let mut pd = [0u8; 36];
        drv.write(&mut pd);
        assert_eq!(image::read_u32(&pd, 12), 0x123);
        assert_eq!(image::read_u32(&pd, 16), 2.5f32.to_bits());
        assert_eq!(image::read_u16(&pd, 8), 1000);
        assert_eq!(image::read_i16(&pd, 10), 6000);
    }
}
