//! # ECRT Drivers
//!
//! Cyclic decode/encode logic for EtherCAT slave devices. Each driver is
//! invoked once per bus cycle to translate the raw process image into
//! application-facing signals and to translate commanded signals back into
//! the image for the next cycle.
//!
//! ## Core Engines
//!
//! - [`counter`] — rolling fixed-width counter tracking with rescale-safe
//!   position output and index-latch handling
//! - [`link`] — bus-operational edge detection driving resynchronization
//! - [`ds402`] — staged enable/fault handshake against a drive status word
//! - [`timer`] — monotonic countdown gating automatic fault clearing
//!
//! ## Zero-Allocation Cycle
//!
//! All driver state is pre-allocated at construction. The per-cycle
//! [`driver::CyclicDriver::read`] / [`driver::CyclicDriver::write`] calls
//! perform no heap allocation, never block and never panic; degenerate
//! inputs are corrected locally instead of being surfaced as errors.

pub mod counter;
pub mod devices;
pub mod driver;
pub mod ds402;
pub mod link;
pub mod timer;
