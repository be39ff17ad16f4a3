//! DS402-style enable/fault handshake.
//!
//! The drive is the authority on its own state: every cycle the status word
//! is decoded into named flags and the control word is rebuilt from scratch
//! as a pure function of those flags, the commanded enable/fault-reset
//! signals and the auto-reset countdown. Nothing is incrementally mutated,
//! so a dropped or corrupted cycle self-heals on the next valid one.
//!
//! Bit positions are device profile data, not protocol logic. The stage
//! sequencing below never names a bit position; it goes through a
//! per-device [`StatusBitMap`] / [`ControlBitMap`], with defaults matching
//! the CiA DS402 profile.

use bitflags::bitflags;

use crate::timer::FaultAutoResetTimer;

bitflags! {
    /// CiA DS402 status word bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusWord: u16 {
        /// Ready to switch on.
        const READY_TO_SWITCH_ON = 1 << 0;
        /// Switched on.
        const SWITCHED_ON        = 1 << 1;
        /// Operation enabled.
        const OPERATION_ENABLED  = 1 << 2;
        /// Fault.
        const FAULT              = 1 << 3;
        /// Voltage enabled.
        const VOLTAGE_ENABLED    = 1 << 4;
        /// Quick stop (active low on the wire).
        const QUICK_STOP         = 1 << 5;
        /// Switch on disabled.
        const SWITCH_ON_DISABLED = 1 << 6;
        /// Warning.
        const WARNING            = 1 << 7;
        /// Remote (control word is processed).
        const REMOTE             = 1 << 9;
    }
}

bitflags! {
    /// CiA DS402 control word bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlWord: u16 {
        /// Switch on.
        const SWITCH_ON        = 1 << 0;
        /// Enable voltage.
        const ENABLE_VOLTAGE   = 1 << 1;
        /// Quick stop (1 = quick stop NOT requested).
        const QUICK_STOP       = 1 << 2;
        /// Enable operation.
        const ENABLE_OPERATION = 1 << 3;
        /// Fault reset (edge sensitive on the drive side).
        const FAULT_RESET      = 1 << 7;
        /// New set-point / change on set-point.
        const NEW_SETPOINT     = 1 << 9;
    }
}

// ─── Per-device bit maps ────────────────────────────────────────────

/// Status-word bit positions for one device profile.
#[derive(Debug, Clone, Copy)]
pub struct StatusBitMap {
    pub switch_on_ready: u16,
    pub switched_on: u16,
    pub op_enabled: u16,
    pub fault: u16,
    pub volt_enabled: u16,
    pub quick_stop: u16,
    pub switch_on_disabled: u16,
    pub warning: u16,
    pub remote: u16,
}

/// The standard DS402 status layout.
pub const DS402_STATUS: StatusBitMap = StatusBitMap {
    switch_on_ready: StatusWord::READY_TO_SWITCH_ON.bits(),
    switched_on: StatusWord::SWITCHED_ON.bits(),
    op_enabled: StatusWord::OPERATION_ENABLED.bits(),
    fault: StatusWord::FAULT.bits(),
    volt_enabled: StatusWord::VOLTAGE_ENABLED.bits(),
    quick_stop: StatusWord::QUICK_STOP.bits(),
    switch_on_disabled: StatusWord::SWITCH_ON_DISABLED.bits(),
    warning: StatusWord::WARNING.bits(),
    remote: StatusWord::REMOTE.bits(),
};

/// Control-word bit positions for one device profile.
#[derive(Debug, Clone, Copy)]
pub struct ControlBitMap {
    pub switch_on: u16,
    pub enable_voltage: u16,
    pub quick_stop: u16,
    pub enable_operation: u16,
    pub fault_reset: u16,
    pub new_setpoint: u16,
}

/// The standard DS402 control layout.
pub const DS402_CONTROL: ControlBitMap = ControlBitMap {
    switch_on: ControlWord::SWITCH_ON.bits(),
    enable_voltage: ControlWord::ENABLE_VOLTAGE.bits(),
    quick_stop: ControlWord::QUICK_STOP.bits(),
    enable_operation: ControlWord::ENABLE_OPERATION.bits(),
    fault_reset: ControlWord::FAULT_RESET.bits(),
    new_setpoint: ControlWord::NEW_SETPOINT.bits(),
};

// ─── Status decoding ────────────────────────────────────────────────

/// Decoded status word: plain named booleans, no overlay tricks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFlags {
    pub switch_on_ready: bool,
    pub switched_on: bool,
    pub op_enabled: bool,
    pub fault: bool,
    pub volt_enabled: bool,
    pub quick_stop: bool,
    pub switch_on_disabled: bool,
    pub warning: bool,
    pub remote: bool,
}

impl StatusFlags {
    /// Decode a raw status word through the device's bit map.
    /// Pure bitmask extraction, no state.
    pub fn decode(word: u16, map: &StatusBitMap) -> Self {
        Self {
            switch_on_ready: word & map.switch_on_ready != 0,
            switched_on: word & map.switched_on != 0,
            op_enabled: word & map.op_enabled != 0,
            fault: word & map.fault != 0,
            volt_enabled: word & map.volt_enabled != 0,
            quick_stop: word & map.quick_stop != 0,
            switch_on_disabled: word & map.switch_on_disabled != 0,
            warning: word & map.warning != 0,
            remote: word & map.remote != 0,
        }
    }

    /// Drive state as reported by the status bits this cycle.
    pub fn state(&self) -> DriveState {
        if self.fault {
            DriveState::Fault
        } else if self.op_enabled {
            DriveState::OperationEnabled
        } else if self.switched_on {
            DriveState::SwitchedOn
        } else if self.switch_on_ready {
            DriveState::ReadyToSwitchOn
        } else {
            DriveState::SwitchOnDisabled
        }
    }
}

/// Drive state, re-derived from status bits every cycle.
///
/// Never stored: the physical device is the authority and may move to
/// `Fault` asynchronously from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DriveState {
    /// Initial/terminal state of the enable sequence.
    SwitchOnDisabled = 0,
    /// Main power may be applied.
    ReadyToSwitchOn = 1,
    /// Main power applied, operation not yet enabled.
    SwitchedOn = 2,
    /// Drive is actively controlling.
    OperationEnabled = 3,
    /// Drive-reported fault; leaves only via a successful reset handshake.
    Fault = 4,
}

// ─── Handshake ──────────────────────────────────────────────────────

/// Handshake policy for one drive.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeConfig {
    /// Auto-assert fault reset on an enable rising edge while faulted.
    pub auto_fault_reset: bool,
    /// Recovery window armed by an auto reset [ns].
    pub reset_window_ns: i64,
    /// Control-word bit positions of the device profile.
    pub control_map: ControlBitMap,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            auto_fault_reset: true,
            reset_window_ns: 100_000_000,
            control_map: DS402_CONTROL,
        }
    }
}

/// Output of one handshake cycle.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeOutput {
    /// Control word to transmit, rebuilt from scratch this cycle.
    pub control_word: u16,
    /// Externally visible fault signal. Suppressed while the auto-reset
    /// window is counting down.
    pub fault: bool,
    /// Drive state decoded from the status bits.
    pub drive_state: DriveState,
}

/// Staged enable/fault negotiation against a DS402-style drive.
#[derive(Debug, Clone, Copy)]
pub struct ControlHandshake {
    config: HandshakeConfig,
    enable_prev: bool,
    auto_reset: FaultAutoResetTimer,
}

impl ControlHandshake {
    pub fn new(config: HandshakeConfig) -> Self {
        Self {
            config,
            enable_prev: false,
            auto_reset: FaultAutoResetTimer::new(),
        }
    }

    /// Run one handshake cycle.
    ///
    /// The enable sequence is strictly staged: voltage-enable and
    /// quick-stop-release need nothing, switch-on needs the drive to
    /// report ready, enable-operation and set-point commit need it to
    /// report switched-on. A stage is never skipped, even when several
    /// status bits turn up true at once.
    pub fn cycle(
        &mut self,
        status: &StatusFlags,
        enable: bool,
        fault_reset: bool,
        period_ns: i64,
    ) -> HandshakeOutput {
        let resetting = self.auto_reset.tick(period_ns);

        let enable_edge = enable && !self.enable_prev;
        self.enable_prev = enable;

        let map = &self.config.control_map;
        let mut control = 0u16;
        if status.fault {
            if fault_reset {
                control |= map.fault_reset;
            }
            if self.config.auto_fault_reset && enable_edge {
                self.auto_reset.arm(self.config.reset_window_ns);
                control |= map.fault_reset;
            }
        } else if enable {
            control |= map.quick_stop;
            control |= map.enable_voltage;
            if status.switch_on_ready {
                control |= map.switch_on;
                if status.switched_on {
                    control |= map.enable_operation;
                    control |= map.new_setpoint;
                }
            }
        }

        HandshakeOutput {
            control_word: control,
            fault: if resetting { false } else { status.fault && enable },
            drive_state: status.state(),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
