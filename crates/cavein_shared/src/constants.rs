//! # Simulation Constants
//!
//! Values that shape the collapse scan. These are not configuration: changing
//! them changes which blocks a given seed collapses.

// =============================================================================
// HOST TIMING
// =============================================================================

/// Tick rate (host updates per second).
pub const TICK_RATE: u32 = 20;

// =============================================================================
// TRIGGER
// =============================================================================

/// Radius around a disturbance that must be loaded before a collapse may trigger.
pub const AREA_LOADED_RADIUS: i32 = 32;

/// Horizontal half-width draw: `(rand(HORIZONTAL_HALF_WIDTH_ROLL) + HORIZONTAL_HALF_WIDTH_BASE) / 2`.
pub const HORIZONTAL_HALF_WIDTH_ROLL: i32 = 5;

/// Base added to the horizontal half-width roll.
pub const HORIZONTAL_HALF_WIDTH_BASE: i32 = 4;

/// Vertical half-width draw: `(rand(VERTICAL_HALF_WIDTH_ROLL) + VERTICAL_HALF_WIDTH_BASE) / 2`.
pub const VERTICAL_HALF_WIDTH_ROLL: i32 = 3;

/// Base added to the vertical half-width roll.
pub const VERTICAL_HALF_WIDTH_BASE: i32 = 2;

// =============================================================================
// COLUMN SCAN
// =============================================================================

/// Height offset (relative to the epicenter) of the bottom layer of the scan.
pub const SCAN_BASE_OFFSET: i32 = -4;

/// Highest step scanned upward from the bottom layer (inclusive).
pub const SCAN_COLUMN_HEIGHT: i32 = 8;
