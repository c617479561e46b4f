//! # Grid Capability
//!
//! The narrow surface the collapse simulation needs from whatever owns the
//! world. Hosts implement this over their own storage; [`crate::VoxelWorld`]
//! is the in-tree implementation.

use cavein_shared::BlockPos;

use crate::block::Block;

/// Read/write access to block states plus the two spatial queries a
/// collapse needs.
///
/// Implementations must be total: a position with no loaded data is a valid
/// query and answers with [`Block::UNLOADED`], not passable, not loaded.
pub trait SpatialGrid {
    /// Block state at `pos`.
    fn block_state(&self, pos: BlockPos) -> Block;

    /// Replaces the block state at `pos`.
    ///
    /// Visible to every later read in the same pass. Writes to unloaded
    /// positions are dropped.
    fn set_block_state(&mut self, pos: BlockPos, block: Block);

    /// Returns true if a falling block could occupy `pos`.
    fn can_fall_through(&self, pos: BlockPos) -> bool;

    /// Returns true if every position within `radius` of `center` (on every
    /// axis) is backed by loaded data.
    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool;

    /// Returns true if `pos` itself is loaded.
    fn is_loaded(&self, pos: BlockPos) -> bool {
        self.is_area_loaded(pos, 0)
    }
}
