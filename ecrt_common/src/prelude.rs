//! Prelude module for common re-exports.
//!
//! Consumers can do `use ecrt_common::prelude::*;` and get the most
//! important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{BusConfig, ConfigError, SlaveConfig, SlaveKind};

// ─── Process image ──────────────────────────────────────────────────
pub use crate::image::PdoOffset;

// ─── Scaling ────────────────────────────────────────────────────────
pub use crate::scale::Scale;

// ─── System constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_CYCLE_TIME, DEFAULT_CYCLE_TIME_NS, MAX_SLAVES};
