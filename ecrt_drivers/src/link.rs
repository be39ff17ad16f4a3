//! Bus link supervision: operational-state edge detection.
//!
//! One bit of memory. Drivers use the rising edge to resynchronize their
//! counter channels (a stale sample after a communication gap must not be
//! read as motion) and the falling edge to force fault-safe outputs.

use tracing::{info, warn};

/// Edges produced by one supervision cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkEdges {
    /// Slave is operational this cycle.
    pub operational: bool,
    /// False→true transition: first operational cycle after a gap.
    pub became_operational: bool,
    /// True→false transition: link just dropped.
    pub lost_operational: bool,
}

/// Tracks the slave's operational state across cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkSupervisor {
    was_operational: bool,
}

impl LinkSupervisor {
    /// New supervisor; the first operational cycle reports a rising edge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb this cycle's operational flag and report the edges.
    pub fn update(&mut self, operational: bool) -> LinkEdges {
        let edges = LinkEdges {
            operational,
            became_operational: operational && !self.was_operational,
            lost_operational: !operational && self.was_operational,
        };
        if edges.lost_operational {
            warn!("slave link lost");
        } else if edges.became_operational {
            info!("slave link operational");
        }
        self.was_operational = operational;
        edges
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
