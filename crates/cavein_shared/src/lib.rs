//! # CAVEIN Shared
//!
//! Common types used by the world grid, the collapse simulation and the host.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `cavein_world`
//! - `cavein_collapse`
//! - Any randomness or I/O
//!
//! If you need block data, put it in `cavein_world`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{AREA_LOADED_RADIUS, SCAN_BASE_OFFSET, SCAN_COLUMN_HEIGHT, TICK_RATE};
pub use math::{BlockBox, BlockPos};
