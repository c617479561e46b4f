//! # CAVEIN World
//!
//! The block grid the collapse simulation reads and writes.
//!
//! ## Design Principles
//!
//! 1. **Capability, not world**: the simulation only sees [`SpatialGrid`]
//! 2. **Sparse**: storage is a map of 16x16x16 chunks, loaded on demand
//! 3. **Total**: reads outside loaded chunks return [`Block::UNLOADED`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use cavein_world::{Block, SpatialGrid, VoxelWorld};
//! use cavein_shared::BlockPos;
//!
//! let mut world = VoxelWorld::new();
//! world.ensure_loaded_around(BlockPos::ORIGIN, 32);
//! world.set_block_state(BlockPos::new(0, 1, 0), Block::new(2));
//! assert!(world.can_fall_through(BlockPos::ORIGIN));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod chunk;
pub mod grid;
pub mod tags;
pub mod world;

pub use block::{Block, BlockId};
pub use chunk::{Chunk, ChunkCoord, CHUNK_SIZE};
pub use grid::SpatialGrid;
pub use tags::{BlockTag, TagRegistry};
pub use world::VoxelWorld;
