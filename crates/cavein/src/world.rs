//! # Collapse World
//!
//! Owns everything one world needs to run cave-ins: the grid, the rules, the
//! live configuration, the pending cascades and the random stream.
//!
//! ## Tick Order
//!
//! ```text
//! host: mine_block / on_block_disturbed   (any time between ticks)
//!         └─ trigger check, initial scan, frontier queued at now + delay
//!
//! host: tick()
//!         ├─ advance tick counter
//!         ├─ drain records due at the new tick
//!         ├─ drop records whose epicenter is no longer loaded
//!         └─ continuation pass per record, re-queue what continues
//! ```

use std::path::Path;

use cavein_collapse::persistence;
use cavein_collapse::{
    CollapseEffect, CollapseEngine, CollapseOutcome, CollapseResult, CollapseRules, EffectSink,
    PropagationQueue, SharedConfig,
};
use cavein_shared::BlockPos;
use cavein_world::{Block, ChunkCoord, SpatialGrid, VoxelWorld};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::events::{CaveEvent, EventSender};

/// Setup values for a [`CollapseWorld`].
#[derive(Clone, Debug)]
pub struct CollapseWorldConfig {
    /// Seed of the collapse random stream.
    pub seed: u64,
    /// Tick the world starts at.
    pub start_tick: u64,
}

impl Default for CollapseWorldConfig {
    fn default() -> Self {
        Self {
            seed: 0x00CA_7E1E,
            start_tick: 0,
        }
    }
}

/// What one [`CollapseWorld::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick that ran.
    pub tick: u64,
    /// Records that continued into another pass.
    pub continued: usize,
    /// Records whose cascade ended this tick.
    pub settled: usize,
    /// Records dropped because their epicenter was unloaded.
    pub dropped: usize,
    /// Blocks that fell this tick.
    pub blocks_fallen: usize,
}

/// Running totals since the world was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollapseStats {
    /// Disturbances reported.
    pub disturbances: u64,
    /// Collapses started.
    pub collapses_started: u64,
    /// Blocks that fell, initial scans and continuations.
    pub blocks_fallen: u64,
    /// Cascades that ran to the end.
    pub cascades_settled: u64,
    /// Records dropped on unload.
    pub records_dropped: u64,
}

/// A voxel world with cave-ins.
pub struct CollapseWorld {
    grid: VoxelWorld,
    rules: CollapseRules,
    config: SharedConfig,
    queue: PropagationQueue,
    rng: ChaCha8Rng,
    tick: u64,
    events: EventSender,
    stats: CollapseStats,
}

impl CollapseWorld {
    /// Creates an empty world (nothing loaded) driven by `rules`.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the rules' configuration is invalid.
    pub fn new(rules: CollapseRules, config: CollapseWorldConfig, events: EventSender) -> CollapseResult<Self> {
        let shared = SharedConfig::new(rules.config)?;
        let grid = VoxelWorld::new().with_passable(rules.passable.iter().copied());
        Ok(Self {
            grid,
            rules,
            config: shared,
            queue: PropagationQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tick: config.start_tick,
            events,
            stats: CollapseStats::default(),
        })
    }

    /// The block grid.
    #[must_use]
    pub fn grid(&self) -> &VoxelWorld {
        &self.grid
    }

    /// Mutable block grid, for hosts streaming terrain in.
    pub fn grid_mut(&mut self) -> &mut VoxelWorld {
        &mut self.grid
    }

    /// Live configuration handle. Clone it to reload from another thread.
    #[must_use]
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Pending cascades.
    #[must_use]
    pub fn queue(&self) -> &PropagationQueue {
        &self.queue
    }

    /// Current tick.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Running totals.
    #[must_use]
    pub fn stats(&self) -> CollapseStats {
        self.stats
    }

    /// Removes the block at `pos` and reports the disturbance.
    ///
    /// Does nothing if `pos` is not loaded or already air.
    pub fn mine_block(&mut self, pos: BlockPos) -> Option<CollapseOutcome> {
        let state = self.grid.block_state(pos);
        if !state.is_loaded() || state.is_air() {
            return None;
        }
        self.grid.set_block_state(pos, Block::AIR);
        self.on_block_disturbed(pos)
    }

    /// Runs the trigger check for a disturbance at `pos`.
    pub fn on_block_disturbed(&mut self, pos: BlockPos) -> Option<CollapseOutcome> {
        self.stats.disturbances += 1;
        let engine = CollapseEngine::from_rules(&self.rules, self.config.snapshot());

        let outcome = engine.try_trigger_collapse(
            &mut self.grid,
            &mut self.rng,
            &mut self.queue,
            &mut self.events,
            pos,
            self.tick,
        )?;

        self.stats.collapses_started += 1;
        self.stats.blocks_fallen += outcome.collapsed.len() as u64;
        self.events.send(CaveEvent::CollapseStarted {
            epicenter: outcome.epicenter,
            radius_squared: outcome.radius_squared,
            collapsed: outcome.collapsed.len(),
        });
        if outcome.is_settled() {
            self.stats.cascades_settled += 1;
            self.events.send(CaveEvent::CascadeSettled {
                epicenter: outcome.epicenter,
            });
        }
        Some(outcome)
    }

    /// Advances one tick and runs every continuation that became due.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let now = self.tick;
        let config = self.config.snapshot();
        let engine = CollapseEngine::from_rules(&self.rules, config);
        let mut report = TickReport {
            tick: now,
            ..TickReport::default()
        };

        for record in self.queue.drain_due(now) {
            if !self.grid.is_loaded(record.epicenter) {
                report.dropped += 1;
                continue;
            }

            let mut sink = CountingSink::new(&mut self.events);
            let next = engine.propagate(&mut self.grid, &mut self.rng, &mut sink, &record);
            report.blocks_fallen += sink.falling;

            match next {
                Some(next) => {
                    self.queue.enqueue(next, now.saturating_add(config.propagation_delay_ticks));
                    report.continued += 1;
                }
                None => {
                    report.settled += 1;
                    self.events.send(CaveEvent::CascadeSettled {
                        epicenter: record.epicenter,
                    });
                }
            }
        }

        self.stats.blocks_fallen += report.blocks_fallen as u64;
        self.stats.cascades_settled += report.settled as u64;
        self.stats.records_dropped += report.dropped as u64;
        if report.blocks_fallen > 0 || report.dropped > 0 {
            tracing::trace!(
                "tick {}: {} fell, {} continue, {} settled, {} dropped",
                now,
                report.blocks_fallen,
                report.continued,
                report.settled,
                report.dropped
            );
        }
        report
    }

    /// Unloads a chunk and drops every cascade centred in unloaded space.
    ///
    /// Returns the number of records dropped.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> usize {
        self.grid.unload_chunk(coord);
        let grid = &self.grid;
        let dropped = self.queue.drop_unloaded(|pos| grid.is_loaded(pos));
        self.stats.records_dropped += dropped as u64;
        dropped
    }

    /// Writes the pending cascades to `path`.
    ///
    /// # Errors
    ///
    /// See [`persistence::save_to_file`].
    pub fn save_queue(&self, path: impl AsRef<Path>) -> CollapseResult<()> {
        persistence::save_to_file(&self.queue, path)
    }

    /// Replaces the pending cascades with the snapshot at `path`.
    ///
    /// Due ticks are absolute; restore into a world whose tick counter
    /// continues from the save. On error the current queue is kept.
    ///
    /// # Errors
    ///
    /// See [`persistence::load_from_file`].
    pub fn restore_queue(&mut self, path: impl AsRef<Path>) -> CollapseResult<usize> {
        self.queue = persistence::load_from_file(path)?;
        Ok(self.queue.len())
    }
}

/// Forwards effects and counts falling blocks.
struct CountingSink<'a, E: EffectSink> {
    inner: &'a mut E,
    falling: usize,
}

impl<'a, E: EffectSink> CountingSink<'a, E> {
    fn new(inner: &'a mut E) -> Self {
        Self { inner, falling: 0 }
    }
}

impl<E: EffectSink> EffectSink for CountingSink<'_, E> {
    fn emit(&mut self, effect: CollapseEffect) {
        if matches!(effect, CollapseEffect::FallingBlock { .. }) {
            self.falling += 1;
        }
        self.inner.emit(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use cavein_shared::{BlockBox, AREA_LOADED_RADIUS};

    const RULES: &str = r#"
        [config]
        collapse_trigger_chance = 1.0
        collapse_propagate_chance = 1.0
        collapse_min_radius = 5
        collapse_radius_variance = 0
        propagation_delay_ticks = 2

        [tags]
        can_start_collapse = [1]
        can_collapse = [1]

        [[recipes]]
        name = "stone"
        ingredient = [1]
        transform = { output = { id = 4 } }
    "#;

    fn cavern(bus: &EventBus) -> CollapseWorld {
        let rules = CollapseRules::from_toml_str(RULES).unwrap();
        let mut world = CollapseWorld::new(rules, CollapseWorldConfig::default(), bus.sender()).unwrap();
        let grid = world.grid_mut();
        grid.ensure_loaded_around(BlockPos::ORIGIN, AREA_LOADED_RADIUS);
        grid.fill(BlockBox::new(BlockPos::new(-8, 0, -8), BlockPos::new(8, 8, 8)), Block::new(1));
        world
    }

    #[test]
    fn test_mining_runs_cascade_to_completion() {
        let bus = EventBus::new(4096);
        let receiver = bus.receiver();
        let mut world = cavern(&bus);

        let outcome = world.mine_block(BlockPos::new(0, -1, 0));
        // Mining air does nothing.
        assert!(outcome.is_none());

        let outcome = world.on_block_disturbed(BlockPos::new(0, -1, 0)).unwrap();
        assert_eq!(outcome.radius_squared, 25);
        assert_eq!(world.queue().len(), 1);

        let mut ticks = 0;
        while !world.queue().is_empty() {
            world.tick();
            ticks += 1;
            assert!(ticks < 100);
        }

        let stats = world.stats();
        assert_eq!(stats.collapses_started, 1);
        assert_eq!(stats.cascades_settled, 1);
        assert!(stats.blocks_fallen > outcome.collapsed.len() as u64);

        let events = receiver.drain();
        let falling = events
            .iter()
            .filter(|e| matches!(e, CaveEvent::FallingBlock { .. }))
            .count() as u64;
        assert_eq!(falling, stats.blocks_fallen);
        assert!(matches!(events.last(), Some(CaveEvent::CascadeSettled { .. })));
    }

    #[test]
    fn test_continuation_waits_for_delay() {
        let bus = EventBus::new(4096);
        let mut world = cavern(&bus);
        world.on_block_disturbed(BlockPos::new(0, -1, 0)).unwrap();

        assert_eq!(world.tick().continued, 0);
        let report = world.tick();
        assert_eq!(report.tick, 2);
        assert_eq!(report.continued, 1);
        assert!(report.blocks_fallen > 0);
    }

    #[test]
    fn test_unload_drops_pending_cascade() {
        let bus = EventBus::new(4096);
        let mut world = cavern(&bus);
        let outcome = world.on_block_disturbed(BlockPos::new(0, -1, 0)).unwrap();

        let coord = ChunkCoord::from_block_pos(outcome.epicenter);
        assert_eq!(world.unload_chunk(coord), 1);
        assert!(world.queue().is_empty());
        assert_eq!(world.stats().records_dropped, 1);
    }

    #[test]
    fn test_config_reload_applies_to_next_trigger() {
        let bus = EventBus::new(4096);
        let mut world = cavern(&bus);
        let handle = world.config().clone();

        handle.reload_from_toml_str("collapse_trigger_chance = 0.0").unwrap();
        assert!(world.on_block_disturbed(BlockPos::new(0, -1, 0)).is_none());
        assert!(world.queue().is_empty());
    }
}
