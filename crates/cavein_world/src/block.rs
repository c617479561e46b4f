//! # Block State
//!
//! A block is an opaque `(id, meta)` pair. The id names the block kind and is
//! what tags and recipes match on; `meta` carries the block's properties
//! (rotation, variant, ...) and is only ever copied, never interpreted.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Block kind identifier.
pub type BlockId = u16;

/// A single block in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
#[serde(deny_unknown_fields)]
pub struct Block {
    /// Block type ID.
    pub id: BlockId,
    /// Block metadata (properties carried through transforms).
    #[serde(default)]
    pub meta: u16,
}

impl Block {
    /// Air block (empty).
    pub const AIR: Self = Self { id: 0, meta: 0 };
    /// Read result for positions outside any loaded chunk.
    ///
    /// Impassable and untagged, so scans treat missing data as solid ground
    /// that never collapses.
    pub const UNLOADED: Self = Self { id: BlockId::MAX, meta: 0 };

    /// Creates a new block with given ID.
    #[inline]
    #[must_use]
    pub const fn new(id: BlockId) -> Self {
        Self { id, meta: 0 }
    }

    /// Creates a block with ID and metadata.
    #[inline]
    #[must_use]
    pub const fn with_meta(id: BlockId, meta: u16) -> Self {
        Self { id, meta }
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.id == Self::AIR.id
    }

    /// Returns true if this block came from a loaded chunk.
    #[inline]
    #[must_use]
    pub const fn is_loaded(self) -> bool {
        self.id != Self::UNLOADED.id
    }
}
