//! DS402 servo drive in cyclic synchronous position mode.
//!
//! The drive owns the enable/fault state machine; this driver decodes the
//! status word into named flags, runs the staged handshake, and converts
//! between user position units and encoder pulses. Position feedback goes
//! through a wraparound-safe counter channel so a 32-bit rollover of the
//! pulse counter never shows up as motion.

use ecrt_common::image;
use ecrt_common::scale::Scale;

use crate::counter::{CounterChannel, CounterWidth};
use crate::driver::{CycleInfo, CyclicDriver};
use crate::ds402::{
    ControlHandshake, DriveState, HandshakeConfig, StatusFlags, DS402_STATUS,
};
use crate::link::LinkSupervisor;

/// Modes-of-operation value for cyclic synchronous position.
pub const MODE_CYCLIC_SYNC_POSITION: u8 = 8;

/// Default encoder pulses per motor revolution.
pub const DEFAULT_PULSES_PER_REV: u32 = 1 << 23;

/// Error code reported while the link is down.
pub const LINK_DOWN_ERROR_CODE: u16 = 0x100;

/// Resolved process-image offsets of the drive PDOs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServoPdos {
    // Inputs
    pub error_code: usize,
    pub status: usize,
    pub modes_display: usize,
    pub curr_pos: usize,
    pub curr_ferr: usize,
    pub din: usize,
    // Outputs
    pub control: usize,
    pub modes: usize,
    pub target_pos: usize,
}

/// Operator-owned commanded signals.
#[derive(Debug, Clone, Copy)]
pub struct ServoCommands {
    /// Commanded position in user units.
    pub pos_cmd: f64,
    pub enable: bool,
    pub fault_reset: bool,
    /// User units per motor revolution.
    pub pos_scale: f64,
    /// Encoder pulses per motor revolution.
    pub pprev: u32,
}

impl Default for ServoCommands {
    fn default() -> Self {
        Self {
            pos_cmd: 0.0,
            enable: false,
            fault_reset: false,
            pos_scale: 1.0,
            pprev: DEFAULT_PULSES_PER_REV,
        }
    }
}

/// Drive digital inputs (object 0x60FD), device mnemonics.
///
/// `not`/`pot` are the negative/positive over-travel switches, `inp` is
/// the in-position flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServoDigitalInputs {
    pub not: bool,
    pub pot: bool,
    pub home: bool,
    pub vicl: bool,
    pub ret: bool,
    pub ext1: bool,
    pub ext2: bool,
    pub mon3: bool,
    pub mon4: bool,
    pub stop: bool,
    pub inp: bool,
    pub retst: bool,
}

impl ServoDigitalInputs {
    fn decode(din: u32) -> Self {
        Self {
            not: din & (1 << 0) != 0,
            pot: din & (1 << 1) != 0,
            home: din & (1 << 2) != 0,
            vicl: din & (1 << 17) != 0,
            ret: din & (1 << 18) != 0,
            ext1: din & (1 << 19) != 0,
            ext2: din & (1 << 20) != 0,
            mon3: din & (1 << 21) != 0,
            mon4: din & (1 << 22) != 0,
            stop: din & (1 << 23) != 0,
            inp: din & (1 << 24) != 0,
            retst: din & (1 << 25) != 0,
        }
    }
}

/// Observed signals, overwritten every cycle.
#[derive(Debug, Clone, Copy)]
pub struct ServoObservations {
    /// Externally visible fault. Forced while the link is down.
    pub fault: bool,
    /// Drive error code; [`LINK_DOWN_ERROR_CODE`] while the link is down.
    pub error_code: u16,
    pub status: StatusFlags,
    pub drive_state: DriveState,
    pub modes_display: u8,
    pub din: ServoDigitalInputs,
    /// Accumulated feedback count [pulses].
    pub count: i64,
    /// Feedback position [user units].
    pub pos: f64,
    /// Following error [user units].
    pub pos_ferr: f64,
}

impl Default for ServoObservations {
    fn default() -> Self {
        Self {
            fault: false,
            error_code: 0,
            status: StatusFlags::default(),
            drive_state: DriveState::SwitchOnDisabled,
            modes_display: 0,
            din: ServoDigitalInputs::default(),
            count: 0,
            pos: 0.0,
            pos_ferr: 0.0,
        }
    }
}

/// Cyclic driver for the servo drive.
pub struct ServoDriver {
    pdos: ServoPdos,
    link: LinkSupervisor,
    channel: CounterChannel,
    handshake: ControlHandshake,
    pos_scale: Scale,
    /// Control word computed on the read side, transmitted on the write side.
    control_word: u16,
    pub commands: ServoCommands,
    pub observations: ServoObservations,
}

impl ServoDriver {
    pub fn new(pdos: ServoPdos, auto_fault_reset: bool, fault_reset_window_ns: i64) -> Self {
        let config = HandshakeConfig {
            auto_fault_reset,
            reset_window_ns: fault_reset_window_ns,
            ..HandshakeConfig::default()
        };
        Self {
            pdos,
            link: LinkSupervisor::new(),
            channel: CounterChannel::new(CounterWidth::W32),
            handshake: ControlHandshake::new(config),
            pos_scale: Scale::new(),
            control_word: 0,
            commands: ServoCommands::default(),
            observations: ServoObservations::default(),
        }
    }
}

impl CyclicDriver for ServoDriver {
    fn name(&self) -> &'static str {
        "servo"
    }

    fn read(&mut self, pd: &[u8], cycle: CycleInfo) {
        self.pos_scale.refresh(&mut self.commands.pos_scale);

        let edges = self.link.update(cycle.operational);
        if !edges.operational {
            self.observations.fault = true;
            self.observations.error_code = LINK_DOWN_ERROR_CODE;
            return;
        }

        let obs = &mut self.observations;
        obs.status = StatusFlags::decode(image::read_u16(pd, self.pdos.status), &DS402_STATUS);
        obs.modes_display = image::read_u8(pd, self.pdos.modes_display);
        obs.din = ServoDigitalInputs::decode(image::read_u32(pd, self.pdos.din));
        obs.error_code = image::read_u16(pd, self.pdos.error_code);

        // Counts per user unit for the feedback channel.
        let mut counts_per_unit = self.commands.pprev as f64 * self.pos_scale.recip();
        let raw_pos = image::read_i32(pd, self.pdos.curr_pos);
        let out = self.channel.update(
            raw_pos as i64,
            edges.became_operational,
            None,
            &mut counts_per_unit,
        );
        obs.count = out.count;
        obs.pos = out.position;

        let raw_ferr = image::read_i32(pd, self.pdos.curr_ferr);
        obs.pos_ferr =
            raw_ferr as f64 * self.pos_scale.value() / self.commands.pprev as f64;

        let hs = self.handshake.cycle(
            &obs.status,
            self.commands.enable,
            self.commands.fault_reset,
            cycle.period_ns,
        );
        self.control_word = hs.control_word;
        obs.fault = hs.fault;
        obs.drive_state = hs.drive_state;
    }

    fn write(&mut self, pd: &mut [u8]) {
        image::write_u16(pd, self.pdos.control, self.control_word);
        image::write_u8(pd, self.pdos.modes, MODE_CYCLIC_SYNC_POSITION);

        let target = self.commands.pos_cmd
            * (self.pos_scale.recip() * self.commands.pprev as f64);
        image::write_i32(pd, self.pdos.target_pos, target as i32);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds402::{ControlWord, StatusWord};

    const PERIOD: i64 = 1_000_000;

    fn pdos() -> ServoPdos {
        ServoPdos {
            error_code: 0,
            status: 2,
            modes_display: 4,
            curr_pos: 6,
            curr_ferr: 10,
            din: 14,
            control: 18,
            modes: 20,
            target_pos: 22,
        }
    }

    fn image_with(status: StatusWord, pos: i32, ferr: i32, din: u32, error: u16) -> [u8; 26] {
        let mut pd = [0u8; 26];
        image::write_u16(&mut pd, 0, error);
        image::write_u16(&mut pd, 2, status.bits());
        image::write_i32(&mut pd, 6, pos);
        image::write_i32(&mut pd, 10, ferr);
        image::write_u32(&mut pd, 14, din);
        pd
    }

    fn drv() -> ServoDriver {
        ServoDriver::new(pdos(), true, 100_000_000)
    }

    #[test]
    fn enable_sequence_over_the_wire() {
        let mut drv = drv();
        drv.commands.enable = true;
        let mut pd = image_with(StatusWord::empty(), 0, 0, 0, 0);

        drv.read(&pd, CycleInfo::operational(PERIOD));
        drv.write(&mut pd);
        assert_eq!(
            image::read_u16(&pd, 18),
            (ControlWord::ENABLE_VOLTAGE | ControlWord::QUICK_STOP).bits()
        );
        assert_eq!(image::read_u8(&pd, 20), MODE_CYCLIC_SYNC_POSITION);

        let mut pd = image_with(StatusWord::READY_TO_SWITCH_ON, 0, 0, 0, 0);
        drv.read(&pd, CycleInfo::operational(PERIOD));
        drv.write(&mut pd);
        assert_eq!(
            image::read_u16(&pd, 18),
            (ControlWord::ENABLE_VOLTAGE | ControlWord::QUICK_STOP | ControlWord::SWITCH_ON)
                .bits()
        );

        let mut pd = image_with(
            StatusWord::READY_TO_SWITCH_ON | StatusWord::SWITCHED_ON,
            0,
            0,
            0,
            0,
        );
        drv.read(&pd, CycleInfo::operational(PERIOD));
        drv.write(&mut pd);
        assert_eq!(
            image::read_u16(&pd, 18),
            (ControlWord::ENABLE_VOLTAGE
                | ControlWord::QUICK_STOP
                | ControlWord::SWITCH_ON
                | ControlWord::ENABLE_OPERATION
                | ControlWord::NEW_SETPOINT)
                .bits()
        );
        assert_eq!(drv.observations.drive_state, DriveState::SwitchedOn);
    }

    #[test]
    fn position_feedback_in_user_units() {
        let mut drv = drv();
        drv.commands.pprev = 1000;
        drv.commands.pos_scale = 2.0;

        drv.read(
            &image_with(StatusWord::empty(), 0, 0, 0, 0),
            CycleInfo::operational(PERIOD),
        );
        drv.read(
            &image_with(StatusWord::empty(), 500, 0, 0, 0),
            CycleInfo::operational(PERIOD),
        );
        assert_eq!(drv.observations.count, 500);
        assert!((drv.observations.pos - 1.0).abs() < 1e-12);
    }

    #[test]
    fn following_error_in_user_units() {
        let mut drv = drv();
        drv.commands.pprev = 1000;
        drv.commands.pos_scale = 2.0;
        drv.read(
            &image_with(StatusWord::empty(), 0, 250, 0, 0),
            CycleInfo::operational(PERIOD),
        );
        assert!((drv.observations.pos_ferr - 0.5).abs() < 1e-12);
    }

    #[test]
    fn target_position_in_pulses() {
        let mut drv = drv();
        drv.commands.pprev = 1000;
        drv.commands.pos_scale = 2.0;
        drv.commands.pos_cmd = 3.0;

        let mut pd = image_with(StatusWord::empty(), 0, 0, 0, 0);
        drv.read(&pd, CycleInfo::operational(PERIOD));
        drv.write(&mut pd);
        assert_eq!(image::read_i32(&pd, 22), 1500);
    }

    #[test]
    fn link_down_reports_fault_and_error_code() {
        let mut drv = drv();
        let pd = image_with(StatusWord::OPERATION_ENABLED, 0, 0, 0, 0x42);
        drv.read(&pd, CycleInfo::operational(PERIOD));
        assert_eq!(drv.observations.error_code, 0x42);
        assert!(!drv.observations.fault);

        drv.read(&pd, CycleInfo::link_down(PERIOD));
        assert!(drv.observations.fault);
        assert_eq!(drv.observations.error_code, LINK_DOWN_ERROR_CODE);
    }

    #[test]
    fn digital_inputs_are_decoded() {
        let mut drv = drv();
        let din = (1 << 0) | (1 << 2) | (1 << 17) | (1 << 24);
        drv.read(
            &image_with(StatusWord::empty(), 0, 0, din, 0),
            CycleInfo::operational(PERIOD),
        );
        let d = drv.observations.din;
        assert!(d.not);
        assert!(d.home);
        assert!(d.vicl);
        assert!(d.inp);
        assert!(!d.pot);
        assert!(!d.stop);
    }

    #[test]
    fn rollover_does_not_jump_position() {
        let mut drv = drv();
        drv.read(
            &image_with(StatusWord::empty(), i32::MAX - 4, 0, 0, 0),
            CycleInfo::operational(PERIOD),
        );
        drv.read(
            &image_with(StatusWord::empty(), i32::MIN + 5, 0, 0, 0),
            CycleInfo::operational(PERIOD),
        );
        assert_eq!(drv.observations.count, 10);
    }
}
