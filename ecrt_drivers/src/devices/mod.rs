//! Slave device drivers.
//!
//! One module per physical device family. Each driver composes the core
//! engines (counter channels, link supervisor, handshake) with the
//! device's PDO offsets, captured by value at construction. The offsets
//! are resolved by the out-of-scope registration layer; nothing here
//! touches global state.

pub mod digital_in;
pub mod encoder;
pub mod pendant;
pub mod servo;
pub mod tacho;

use ecrt_common::config::{SlaveConfig, SlaveKind};

use crate::driver::{CyclicDriver, DriverError};
use digital_in::{DigitalInDriver, DigitalInPdos};
use encoder::{EncoderDriver, EncoderPdos};
use pendant::{PendantDriver, PendantPdos};
use servo::{ServoDriver, ServoPdos};
use tacho::{TachoDriver, TachoPdos};

/// Resolved PDO offsets for one slave, produced by the registration layer.
#[derive(Debug, Clone)]
pub enum DevicePdos {
    Encoder(EncoderPdos),
    DigitalIn(DigitalInPdos),
    Pendant(PendantPdos),
    Tacho(TachoPdos),
    Servo(ServoPdos),
}

/// Build the driver for a configured slave.
///
/// # Errors
/// Returns `DriverError::ConfigError` if the offset map does not match the
/// configured device kind.
pub fn build_driver(
    config: &SlaveConfig,
    pdos: DevicePdos,
) -> Result<Box<dyn CyclicDriver>, DriverError> {
    let driver: Box<dyn CyclicDriver> = match (config.kind, pdos) {
        (SlaveKind::Encoder, DevicePdos::Encoder(pdos)) => Box::new(EncoderDriver::new(pdos)),
        (SlaveKind::DigitalIn16, DevicePdos::DigitalIn(pdos)) => {
            Box::new(DigitalInDriver::new(pdos, 16))
        }
        (SlaveKind::DigitalIn32, DevicePdos::DigitalIn(pdos)) => {
            Box::new(DigitalInDriver::new(pdos, 32))
        }
        (SlaveKind::Pendant, DevicePdos::Pendant(pdos)) => Box::new(PendantDriver::new(pdos)),
        (SlaveKind::Tacho, DevicePdos::Tacho(pdos)) => Box::new(TachoDriver::new(pdos)),
        (SlaveKind::Servo, DevicePdos::Servo(pdos)) => Box::new(ServoDriver::new(
            pdos,
            config.auto_fault_reset,
            config.fault_reset_window_ns,
        )),
        (kind, _) => {
            return Err(DriverError::ConfigError(format!(
                "slave {}: offset map does not match device kind {kind:?}",
                config.name
            )));
        }
    };
    Ok(driver)
}
