//! Cyclic driver trait and error types.
//!
//! This module defines:
//! - `CyclicDriver` trait - Per-cycle contract every slave driver implements
//! - `CycleInfo` struct - Link state and elapsed period for one cycle
//! - `DriverError` enum - One-time construction failures

use thiserror::Error;

/// Error types for driver construction.
///
/// Only one-time initialization can fail; the cyclic path reports nothing.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The slave configuration does not match this driver.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// No driver registered for the requested device kind.
    #[error("unsupported device kind: {0}")]
    UnsupportedKind(String),
}

/// Per-cycle context supplied by the bus layer.
#[derive(Debug, Clone, Copy)]
pub struct CycleInfo {
    /// Whether the slave is in the OP state this cycle.
    pub operational: bool,
    /// Elapsed time since the previous cycle [ns].
    pub period_ns: i64,
}

impl CycleInfo {
    /// Operational cycle with the given period.
    pub const fn operational(period_ns: i64) -> Self {
        Self {
            operational: true,
            period_ns,
        }
    }

    /// Cycle while the slave link is down.
    pub const fn link_down(period_ns: i64) -> Self {
        Self {
            operational: false,
            period_ns,
        }
    }
}

/// Trait defining the per-cycle contract of a slave driver.
///
/// The bus layer calls `read()` for every slave, then `write()` for every
/// slave, once per cycle, strictly sequentially on the real-time thread.
///
/// # Ordering
///
/// Within one cycle all read-side state is fully derived from the current
/// process image before any write-side state is computed from it, so the
/// two phases never observe a torn intermediate state.
///
/// # Timing Contracts
///
/// | Operation | RT Constraint |
/// |-----------|---------------|
/// | construction | None (pre-RT) |
/// | `read()` / `write()` | **HARD**: bounded time, no allocation, no blocking, no panic |
pub trait CyclicDriver: Send {
    /// Returns the driver's device-kind identifier (e.g. "encoder", "servo").
    fn name(&self) -> &'static str;

    /// Decode the process image into this driver's observation signals.
    ///
    /// Called every cycle, also while the link is down: drivers use the
    /// link-down cycles to force fault-safe outputs and to arm
    /// resynchronization for the first operational cycle.
    fn read(&mut self, pd: &[u8], cycle: CycleInfo);

    /// Encode the commanded signals into the process image patch for the
    /// next bus cycle.
    fn write(&mut self, pd: &mut [u8]);
}

impl core::fmt::Debug for dyn CyclicDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CyclicDriver")
            .field("name", &self.name())
            .finish()
    }
}
