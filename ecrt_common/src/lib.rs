//! ECRT Common Library
//!
//! This crate provides the shared, driver-agnostic utilities for the ECRT
//! workspace: process-image accessors, the numeric scale-safety helper and
//! bus configuration loading.
//!
//! # Module Structure
//!
//! - [`image`] - Little-endian process-image read/write accessors
//! - [`scale`] - User scale with cached reciprocal and dead-zone clamp
//! - [`config`] - Bus/slave configuration loading and validation
//! - [`consts`] - System-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use ecrt_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod image;
pub mod prelude;
pub mod scale;
