//! # Voxel World
//!
//! Sparse chunk map implementing [`SpatialGrid`].
//!
//! ## Loading
//!
//! A chunk is "loaded" exactly when it is present in the map. Loading creates
//! an all-air chunk; unloading drops it and hands it back to the caller.
//! Hosts that stream terrain call [`VoxelWorld::insert_chunk`] with their data.

use std::collections::{HashMap, HashSet};

use cavein_shared::{BlockBox, BlockPos};

use crate::block::{Block, BlockId};
use crate::chunk::{local_offset, Chunk, ChunkCoord, CHUNK_SIZE};
use crate::grid::SpatialGrid;

/// Sparse block grid made of loaded chunks.
#[derive(Debug, Default)]
pub struct VoxelWorld {
    /// Loaded chunks.
    chunks: HashMap<ChunkCoord, Chunk>,
    /// Block ids other than air a falling block can pass through (fluids, plants).
    passable: HashSet<BlockId>,
}

impl VoxelWorld {
    /// Creates an empty world with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks extra block ids as passable for falling blocks.
    #[must_use]
    pub fn with_passable(mut self, ids: impl IntoIterator<Item = BlockId>) -> Self {
        self.passable.extend(ids);
        self
    }

    /// Returns true if `block` is air or one of the passable ids.
    #[inline]
    #[must_use]
    pub fn is_passable(&self, block: Block) -> bool {
        block.is_loaded() && (block.is_air() || self.passable.contains(&block.id))
    }

    /// Loads an empty chunk at `coord` unless one is already loaded.
    pub fn load_chunk(&mut self, coord: ChunkCoord) -> &mut Chunk {
        self.chunks.entry(coord).or_insert_with(|| Chunk::new(coord))
    }

    /// Inserts (or replaces) a chunk supplied by the host.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.coord, chunk)
    }

    /// Unloads a chunk, returning it if it was loaded.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let removed = self.chunks.remove(&coord);
        if removed.is_some() {
            tracing::trace!("unloaded chunk [{},{},{}]", coord.x, coord.y, coord.z);
        }
        removed
    }

    /// Returns the chunk at `coord`, if loaded.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Returns true if the chunk at `coord` is loaded.
    #[must_use]
    pub fn is_chunk_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Coordinates of every loaded chunk.
    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Loads every chunk touching the cube of half-width `radius` around `center`.
    ///
    /// Returns the number of chunks that were newly loaded.
    pub fn ensure_loaded_around(&mut self, center: BlockPos, radius: i32) -> usize {
        let before = self.chunks.len();
        for coord in chunk_span(BlockBox::around(center, radius, radius, radius)) {
            self.load_chunk(coord);
        }
        self.chunks.len() - before
    }

    /// Sets every position of `bounds` to `block`, loading chunks as needed.
    pub fn fill(&mut self, bounds: BlockBox, block: Block) {
        for pos in bounds {
            let (x, y, z) = local_offset(pos);
            self.load_chunk(ChunkCoord::from_block_pos(pos)).set_block(x, y, z, block);
        }
    }

    /// Every non-air block in loaded chunks, in no particular order.
    pub fn solid_blocks(&self) -> impl Iterator<Item = (BlockPos, Block)> + '_ {
        self.chunks.values().filter(|c| !c.is_empty()).flat_map(|chunk| {
            let origin = chunk.coord.origin();
            chunk.blocks().iter().enumerate().filter(|(_, b)| !b.is_air()).map(move |(i, b)| {
                let x = (i % CHUNK_SIZE) as i32;
                let z = ((i / CHUNK_SIZE) % CHUNK_SIZE) as i32;
                let y = (i / (CHUNK_SIZE * CHUNK_SIZE)) as i32;
                (origin.offset(x, y, z), *b)
            })
        })
    }

    /// Counts loaded blocks with the given id.
    #[must_use]
    pub fn count_blocks(&self, id: BlockId) -> usize {
        self.solid_blocks().filter(|(_, b)| b.id == id).count()
    }
}

impl SpatialGrid for VoxelWorld {
    fn block_state(&self, pos: BlockPos) -> Block {
        let (x, y, z) = local_offset(pos);
        self.chunks
            .get(&ChunkCoord::from_block_pos(pos))
            .map_or(Block::UNLOADED, |chunk| chunk.get_block(x, y, z))
    }

    fn set_block_state(&mut self, pos: BlockPos, block: Block) {
        let (x, y, z) = local_offset(pos);
        if let Some(chunk) = self.chunks.get_mut(&ChunkCoord::from_block_pos(pos)) {
            chunk.set_block(x, y, z, block);
        }
    }

    fn can_fall_through(&self, pos: BlockPos) -> bool {
        self.is_passable(self.block_state(pos))
    }

    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool {
        let radius = radius.max(0);
        chunk_span(BlockBox::around(center, radius, radius, radius)).all(|c| self.chunks.contains_key(&c))
    }
}

/// Every chunk coordinate overlapping `bounds`.
fn chunk_span(bounds: BlockBox) -> impl Iterator<Item = ChunkCoord> {
    let lo = ChunkCoord::from_block_pos(bounds.min);
    let hi = ChunkCoord::from_block_pos(bounds.max);
    BlockBox::new(BlockPos::new(lo.x, lo.y, lo.z), BlockPos::new(hi.x, hi.y, hi.z))
        .into_iter()
        .map(|p| ChunkCoord::new(p.x, p.y, p.z))
}
