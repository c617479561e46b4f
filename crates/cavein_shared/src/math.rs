//! Integer grid math shared by the world and the simulation.
//!
//! Everything here is a plain value type: a position has no identity beyond
//! its coordinates.

use bytemuck::{Pod, Zeroable};

/// Integer block position in the voxel grid.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
pub struct BlockPos {
    /// X coordinate
    pub x: i32,
    /// Y coordinate (up)
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl BlockPos {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Creates a new position
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position offset by the given deltas
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Position `n` blocks above
    #[inline]
    #[must_use]
    pub const fn up_by(self, n: i32) -> Self {
        self.offset(0, n, 0)
    }

    /// Position directly above
    #[inline]
    #[must_use]
    pub const fn up(self) -> Self {
        self.up_by(1)
    }

    /// Position directly below
    #[inline]
    #[must_use]
    pub const fn down(self) -> Self {
        self.up_by(-1)
    }

    /// Squared Euclidean distance between block coordinates.
    ///
    /// Computed in `i64` so far-apart positions cannot overflow.
    #[inline]
    #[must_use]
    pub const fn distance_sq(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Inclusive axis-aligned box of block positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockBox {
    /// Minimum corner (inclusive)
    pub min: BlockPos,
    /// Maximum corner (inclusive)
    pub max: BlockPos,
}

impl BlockBox {
    /// Creates a box from two corners in any order.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Box of half-widths `(rx, ry, rz)` centered on `center`.
    #[must_use]
    pub fn around(center: BlockPos, rx: i32, ry: i32, rz: i32) -> Self {
        Self::new(center.offset(-rx, -ry, -rz), center.offset(rx, ry, rz))
    }

    /// Returns a box grown by the given amounts on every side.
    #[must_use]
    pub fn expand(self, horizontal: i32, down: i32, up: i32) -> Self {
        Self {
            min: self.min.offset(-horizontal, -down, -horizontal),
            max: self.max.offset(horizontal, up, horizontal),
        }
    }

    /// Returns true if the position lies inside the box.
    #[inline]
    #[must_use]
    pub const fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Number of positions in the box.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as u64;
        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }

    /// Iterates every position, x fastest, then y, then z.
    ///
    /// The order is part of the contract: given a seed, it decides which
    /// column collapses first.
    #[must_use]
    pub fn iter(&self) -> BlockBoxIter {
        BlockBoxIter {
            bounds: *self,
            next: Some(self.min),
        }
    }
}

impl IntoIterator for BlockBox {
    type Item = BlockPos;
    type IntoIter = BlockBoxIter;

    fn into_iter(self) -> BlockBoxIter {
        self.iter()
    }
}

/// Iterator over the positions of a [`BlockBox`].
#[derive(Clone, Debug)]
pub struct BlockBoxIter {
    bounds: BlockBox,
    next: Option<BlockPos>,
}

impl Iterator for BlockBoxIter {
    type Item = BlockPos;

    fn next(&mut self) -> Option<BlockPos> {
        let current = self.next?;
        let BlockBox { min, max } = self.bounds;

        self.next = if current.x < max.x {
            Some(BlockPos::new(current.x + 1, current.y, current.z))
        } else if current.y < max.y {
            Some(BlockPos::new(min.x, current.y + 1, current.z))
        } else if current.z < max.z {
            Some(BlockPos::new(min.x, min.y, current.z + 1))
        } else {
            None
        };

        Some(current)
    }
}
