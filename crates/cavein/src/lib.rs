//! # CAVEIN
//!
//! The main crate, integrating the world grid and the collapse simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          CollapseWorld                           │
//! │                                                                  │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌─────────────────┐   │
//! │  │ VoxelWorld   │<──│ CollapseEngine   │──>│ PropagationQueue│   │
//! │  │ (grid)       │   │ (per call)       │   │ (owned)         │   │
//! │  └──────────────┘   └────────┬─────────┘   └─────────────────┘   │
//! │                              │                                   │
//! │                              ▼                                   │
//! │                      EventSender ──> host                        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: Effect and lifecycle event channel
//! - `world`: The tick-driven aggregate

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod events;
pub mod world;

// Re-export the layers
pub use cavein_collapse as collapse;
pub use cavein_shared as shared;
pub use cavein_world as grid;

// Re-export commonly used types
pub use events::{CaveEvent, EventBus, EventReceiver, EventSender};
pub use world::{CollapseStats, CollapseWorld, CollapseWorldConfig, TickReport};
