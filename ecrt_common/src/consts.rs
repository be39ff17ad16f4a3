//! System-wide constants shared by all ECRT crates.

use std::time::Duration;

/// Default bus cycle time in microseconds (1ms = 1000us).
pub const DEFAULT_CYCLE_TIME_US: u32 = 1000;

/// Default bus cycle time as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(DEFAULT_CYCLE_TIME_US as u64);

/// Default bus cycle time in nanoseconds, the unit the cyclic callbacks use.
pub const DEFAULT_CYCLE_TIME_NS: i64 = DEFAULT_CYCLE_TIME_US as i64 * 1000;

/// Maximum number of slaves on one bus.
pub const MAX_SLAVES: usize = 64;

/// Maximum number of counter channels on one slave.
pub const MAX_CHANNELS: usize = 4;

/// Dead zone below which a user scale is treated as zero and clamped to 1.0.
/// Dividing by anything smaller would blow up the position output.
pub const SCALE_DEAD_ZONE: f64 = 1e-20;
