//! Bus and slave configuration loaded from `bus.toml`.
//!
//! The registration layer (out of scope here) scans the bus, maps PDOs and
//! resolves the byte/bit offsets of every entry. What the drivers need from
//! it is captured in this configuration: the cycle time, the list of slaves
//! with their device kind, and per-device knobs such as the fault
//! auto-reset policy. Offsets themselves travel in the per-device
//! `*Pdos` structs, built by the registration layer at init time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::consts::{DEFAULT_CYCLE_TIME_US, MAX_SLAVES};

/// Default function for cycle_time_us.
fn default_cycle_time_us() -> u32 {
    DEFAULT_CYCLE_TIME_US
}

/// Default true helper.
fn default_true() -> bool {
    true
}

/// Default fault auto-reset window [ns].
fn default_fault_reset_window_ns() -> i64 {
    100_000_000
}

/// Error types for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Semantic validation failed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which cyclic driver serves a slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaveKind {
    /// Incremental encoder interface (32-bit counter, index latch C).
    Encoder,
    /// 16-channel digital input module.
    DigitalIn16,
    /// 32-channel digital input module.
    DigitalIn32,
    /// Machine-control pendant (handwheel/override subset).
    Pendant,
    /// Two-channel servo tachometer/encoder module.
    Tacho,
    /// DS402 servo drive.
    Servo,
}

/// One slave entry from `bus.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlaveConfig {
    /// Unique slave name, used for signal naming and logging.
    pub name: String,
    /// Device kind, selects the driver.
    pub kind: SlaveKind,
    /// Bus position (ring order).
    pub position: u16,
    /// Whether a faulted drive may auto-reset on an enable rising edge.
    /// Only meaningful for `kind = "servo"`.
    #[serde(default = "default_true")]
    pub auto_fault_reset: bool,
    /// Recovery window armed by an auto fault reset [ns].
    #[serde(default = "default_fault_reset_window_ns")]
    pub fault_reset_window_ns: i64,
}

/// Main configuration loaded from `bus.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Bus cycle time in microseconds.
    /// Defaults to DEFAULT_CYCLE_TIME_US (1000us) if omitted.
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Slaves on the bus, in ring order.
    #[serde(default)]
    pub slaves: Vec<SlaveConfig>,
}

impl BusConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        info!(
            path = %path.display(),
            slaves = config.slaves.len(),
            cycle_time_us = config.cycle_time_us,
            "bus configuration loaded"
        );
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `cycle_time_us` > 0
    /// 2. `slaves.len()` <= MAX_SLAVES
    /// 3. Slave names unique
    /// 4. Bus positions unique
    /// 5. `fault_reset_window_ns` >= 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_time_us == 0 {
            return Err(ConfigError::Invalid(
                "cycle_time_us must be greater than 0".to_string(),
            ));
        }

        if self.slaves.len() > MAX_SLAVES {
            return Err(ConfigError::Invalid(format!(
                "too many slaves: {} (max {})",
                self.slaves.len(),
                MAX_SLAVES
            )));
        }

        let mut names = HashSet::new();
        let mut positions = HashSet::new();
        for slave in &self.slaves {
            if !names.insert(slave.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate slave name: {}",
                    slave.name
                )));
            }
            if !positions.insert(slave.position) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate bus position: {}",
                    slave.position
                )));
            }
            if slave.fault_reset_window_ns < 0 {
                return Err(ConfigError::Invalid(format!(
                    "slave {}: fault_reset_window_ns must not be negative",
                    slave.name
                )));
            }
        }

        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
