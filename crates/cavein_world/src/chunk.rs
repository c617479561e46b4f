//! # Chunk System
//!
//! World data is organized into fixed-size cubic chunks so that:
//! - Only the neighbourhood of activity has to exist in memory
//! - "Is this area loaded" is a handful of map lookups
//! - Negative coordinates need no special casing
//!
//! ## Chunk Format
//!
//! Chunks are 16x16x16 blocks. Each block is stored as a [`Block`]
//! (`u16` id + `u16` meta), indexed as `[y][z][x]`.

use cavein_shared::BlockPos;

use crate::block::Block;

/// Chunk edge length in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Total blocks per chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Y coordinate (in chunks, not blocks).
    pub y: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts a block position to the coordinate of the chunk holding it.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(pos: BlockPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE as i32),
            y: pos.y.div_euclid(CHUNK_SIZE as i32),
            z: pos.z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// Returns the block position of the chunk's origin (lowest corner).
    #[inline]
    #[must_use]
    pub const fn origin(self) -> BlockPos {
        BlockPos::new(
            self.x * CHUNK_SIZE as i32,
            self.y * CHUNK_SIZE as i32,
            self.z * CHUNK_SIZE as i32,
        )
    }
}

/// Local offset of a block position inside its chunk.
#[inline]
#[must_use]
pub const fn local_offset(pos: BlockPos) -> (usize, usize, usize) {
    (
        pos.x.rem_euclid(CHUNK_SIZE as i32) as usize,
        pos.y.rem_euclid(CHUNK_SIZE as i32) as usize,
        pos.z.rem_euclid(CHUNK_SIZE as i32) as usize,
    )
}

/// A chunk of world data.
#[derive(Clone)]
pub struct Chunk {
    /// Chunk position in the world.
    pub coord: ChunkCoord,
    /// Block data (indexed as [y][z][x]).
    blocks: Box<[Block; BLOCKS_PER_CHUNK]>,
    /// Count of non-air blocks.
    solid_count: usize,
    /// Whether this chunk has been modified since loading.
    pub modified: bool,
}

impl Chunk {
    /// Creates a new empty (all air) chunk at the given coordinates.
    #[must_use]
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: Box::new([Block::AIR; BLOCKS_PER_CHUNK]),
            solid_count: 0,
            modified: false,
        }
    }

    #[inline]
    const fn index(x: usize, y: usize, z: usize) -> usize {
        (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
    }

    /// Gets a block at local coordinates.
    ///
    /// Out-of-range coordinates read as air.
    #[inline]
    #[must_use]
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> Block {
        if x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE {
            self.blocks[Self::index(x, y, z)]
        } else {
            Block::AIR
        }
    }

    /// Sets a block at local coordinates. Out-of-range writes are ignored.
    #[inline]
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: Block) {
        if x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE {
            let slot = &mut self.blocks[Self::index(x, y, z)];
            match (slot.is_air(), block.is_air()) {
                (true, false) => self.solid_count += 1,
                (false, true) => self.solid_count -= 1,
                _ => {}
            }
            *slot = block;
            self.modified = true;
        }
    }

    /// Number of non-air blocks.
    #[inline]
    #[must_use]
    pub const fn solid_count(&self) -> usize {
        self.solid_count
    }

    /// Returns true if every block is air.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.solid_count == 0
    }

    /// Raw block slice, `[y][z][x]` order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    /// Block data as bytes, for hosts that store or ship chunks.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.blocks.as_slice())
    }

    /// Rebuilds a chunk from [`Chunk::as_bytes`] output.
    ///
    /// Returns `None` if `bytes` is not exactly one chunk of blocks.
    #[must_use]
    pub fn from_bytes(coord: ChunkCoord, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != BLOCKS_PER_CHUNK * std::mem::size_of::<Block>() {
            return None;
        }
        // Copies, so `bytes` need not be aligned for `Block`.
        let blocks: Vec<Block> = bytes
            .chunks_exact(std::mem::size_of::<Block>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let blocks: Box<[Block; BLOCKS_PER_CHUNK]> = blocks.into_boxed_slice().try_into().ok()?;
        let solid_count = blocks.iter().filter(|b| !b.is_air()).count();
        Some(Self {
            coord,
            blocks,
            solid_count,
            modified: false,
        })
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("solid_count", &self.solid_count)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_negative() {
        assert_eq!(ChunkCoord::from_block_pos(BlockPos::new(-1, -1, -1)), ChunkCoord::new(-1, -1, -1));
        assert_eq!(ChunkCoord::from_block_pos(BlockPos::new(-16, 0, 15)), ChunkCoord::new(-1, 0, 0));
        assert_eq!(ChunkCoord::from_block_pos(BlockPos::new(16, 31, 32)), ChunkCoord::new(1, 1, 2));
    }

    #[test]
    fn test_local_offset_negative() {
        assert_eq!(local_offset(BlockPos::new(-1, -16, 17)), (15, 0, 1));
    }

    #[test]
    fn test_chunk_set_get() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        assert!(chunk.is_empty());

        chunk.set_block(3, 4, 5, Block::with_meta(7, 2));
        assert_eq!(chunk.get_block(3, 4, 5), Block::with_meta(7, 2));
        assert_eq!(chunk.solid_count(), 1);
        assert!(chunk.modified);

        chunk.set_block(3, 4, 5, Block::AIR);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_chunk_bytes_round_trip() {
        let mut chunk = Chunk::new(ChunkCoord::new(2, -1, 0));
        chunk.set_block(0, 0, 0, Block::new(1));
        chunk.set_block(15, 15, 15, Block::with_meta(9, 4));

        let restored = Chunk::from_bytes(chunk.coord, chunk.as_bytes()).unwrap();
        assert_eq!(restored.blocks(), chunk.blocks());
        assert_eq!(restored.solid_count(), 2);
        assert!(!restored.modified);

        assert!(Chunk::from_bytes(chunk.coord, &chunk.as_bytes()[1..]).is_none());
    }

    #[test]
    fn test_chunk_out_of_range() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set_block(16, 0, 0, Block::new(1));
        assert!(chunk.is_empty());
        assert_eq!(chunk.get_block(0, 99, 0), Block::AIR);
    }
}
