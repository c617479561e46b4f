//! # Collapse Engine
//!
//! Trigger, columnar scan and continuation passes.
//!
//! ## Passes
//!
//! ```text
//! disturbance ──► try_trigger_collapse ──► start_collapse ──► frontier ──► queue
//!                      │ (not loaded,          │                            │
//!                      │  roll failed,         │ (no frontier: settled)     ▼
//!                      ▼  no candidate)        ▼                        propagate ──► ...
//!                    no-op                   done
//! ```
//!
//! ## Determinism
//!
//! Every random draw comes from the `rng` argument, in a fixed order: trigger
//! roll, three half-widths, radius, then one roll per eligible block in scan
//! order. The same seed over the same grid collapses the same blocks.
//!
//! ## Outcomes
//!
//! Nothing here fails. An unloaded area, a failed roll or a block without a
//! recipe are ordinary results (`None`, `false`, an empty frontier).

use cavein_shared::constants::{
    AREA_LOADED_RADIUS, HORIZONTAL_HALF_WIDTH_BASE, HORIZONTAL_HALF_WIDTH_ROLL, SCAN_BASE_OFFSET,
    SCAN_COLUMN_HEIGHT, VERTICAL_HALF_WIDTH_BASE, VERTICAL_HALF_WIDTH_ROLL,
};
use cavein_shared::{BlockBox, BlockPos};
use cavein_world::{Block, BlockTag, SpatialGrid, TagRegistry};
use rand::Rng;

use crate::config::{CollapseConfig, MAX_COLLAPSE_RADIUS};
use crate::effects::{CollapseSound, EffectSink};
use crate::queue::{PendingPropagation, PropagationQueue};
use crate::recipe::RecipeBook;
use crate::rules::CollapseRules;
use crate::scanner::{is_trigger_site, SupportScanner};

/// Result of one initial scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollapseOutcome {
    /// Origin of the collapse.
    pub epicenter: BlockPos,
    /// Squared radius drawn for this collapse.
    pub radius_squared: i64,
    /// Positions that collapsed, in scan order.
    pub collapsed: Vec<BlockPos>,
    /// Positions queued for the next pass.
    pub frontier: Vec<BlockPos>,
}

impl CollapseOutcome {
    /// Returns true if the collapse ended with this scan.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.frontier.is_empty()
    }
}

/// Collapse simulation over borrowed rules and a configuration snapshot.
///
/// Cheap to build; hosts create one per trigger or per tick so that a
/// configuration reload is picked up on the next call.
#[derive(Clone, Copy, Debug)]
pub struct CollapseEngine<'a> {
    recipes: &'a RecipeBook,
    tags: &'a TagRegistry,
    scanner: &'a SupportScanner,
    config: CollapseConfig,
}

impl<'a> CollapseEngine<'a> {
    /// Creates an engine from its collaborators.
    ///
    /// `config` is used as given; only the drawn radius is capped, so an
    /// unvalidated configuration cannot make a scan unbounded.
    #[must_use]
    pub fn new(
        recipes: &'a RecipeBook,
        tags: &'a TagRegistry,
        scanner: &'a SupportScanner,
        config: CollapseConfig,
    ) -> Self {
        Self {
            recipes,
            tags,
            scanner,
            config,
        }
    }

    /// Creates an engine over a loaded rule set.
    #[must_use]
    pub fn from_rules(rules: &'a CollapseRules, config: CollapseConfig) -> Self {
        Self::new(&rules.recipes, &rules.tags, &rules.scanner, config)
    }

    /// Configuration this engine runs with.
    #[must_use]
    pub fn config(&self) -> &CollapseConfig {
        &self.config
    }

    /// Reacts to a disturbance at `pos` (a mined block, an explosion).
    ///
    /// Starts at most one collapse, at the first trigger site inside a small
    /// random box around `pos`. Returns `None` without touching the grid,
    /// queue or effects if the area is not loaded, the trigger roll fails or
    /// there is no trigger site.
    pub fn try_trigger_collapse<G, R, E>(
        &self,
        grid: &mut G,
        rng: &mut R,
        queue: &mut PropagationQueue,
        effects: &mut E,
        pos: BlockPos,
        now: u64,
    ) -> Option<CollapseOutcome>
    where
        G: SpatialGrid + ?Sized,
        R: Rng + ?Sized,
        E: EffectSink + ?Sized,
    {
        if !grid.is_area_loaded(pos, AREA_LOADED_RADIUS) {
            return None;
        }
        if !roll(rng, self.config.collapse_trigger_chance) {
            return None;
        }

        // Integer halving is intentional: horizontal 2..=4, vertical 1..=2.
        let rad_x = (rng.gen_range(0..HORIZONTAL_HALF_WIDTH_ROLL) + HORIZONTAL_HALF_WIDTH_BASE) / 2;
        let rad_y = (rng.gen_range(0..VERTICAL_HALF_WIDTH_ROLL) + VERTICAL_HALF_WIDTH_BASE) / 2;
        let rad_z = (rng.gen_range(0..HORIZONTAL_HALF_WIDTH_ROLL) + HORIZONTAL_HALF_WIDTH_BASE) / 2;

        let epicenter = self
            .scanner
            .find_unsupported_positions(
                &*grid,
                self.tags,
                pos.offset(-rad_x, -rad_y, -rad_z),
                pos.offset(rad_x, rad_y, rad_z),
            )
            .find(|candidate| self.can_start_collapse(&*grid, *candidate))?;

        let outcome = self.start_collapse(grid, rng, queue, effects, epicenter, now);
        effects.play_sound(pos, CollapseSound::RockSlideLong);
        Some(outcome)
    }

    /// Returns true if a collapse may originate at `pos`.
    #[must_use]
    pub fn can_start_collapse<G: SpatialGrid + ?Sized>(&self, grid: &G, pos: BlockPos) -> bool {
        is_trigger_site(grid, self.tags, pos)
    }

    /// Runs the initial columnar scan around `epicenter`.
    ///
    /// Every column of the `(2r+1)^2` square, four blocks below the
    /// epicenter, is walked upward nine blocks. Once a passable block has been
    /// seen in a column, the first collapsible block above it within the
    /// radius may fail; at most one block fails per column. The block above
    /// each failure becomes the frontier, queued for `now + delay`.
    pub fn start_collapse<G, R, E>(
        &self,
        grid: &mut G,
        rng: &mut R,
        queue: &mut PropagationQueue,
        effects: &mut E,
        epicenter: BlockPos,
        now: u64,
    ) -> CollapseOutcome
    where
        G: SpatialGrid + ?Sized,
        R: Rng + ?Sized,
        E: EffectSink + ?Sized,
    {
        let radius = self.draw_radius(rng);
        let radius_squared = i64::from(radius) * i64::from(radius);
        let mut collapsed = Vec::new();
        let mut frontier = Vec::new();

        let floor = BlockBox::around(epicenter.up_by(SCAN_BASE_OFFSET), radius, 0, radius);
        for column in floor {
            let mut found_empty = false;
            for step in 0..=SCAN_COLUMN_HEIGHT {
                let pos = column.up_by(step);
                let state = grid.block_state(pos);

                if found_empty
                    && self.tags.has_tag(state, BlockTag::CanCollapse)
                    && pos.distance_sq(epicenter) < radius_squared
                    && roll(rng, self.config.collapse_propagate_chance)
                    && self.collapse_block(grid, effects, pos, state)
                {
                    collapsed.push(pos);
                    let above = pos.up();
                    if above.distance_sq(epicenter) < radius_squared {
                        frontier.push(above);
                    }
                    break;
                }

                // Checked after the attempt so a block never counts as its own gap.
                if grid.can_fall_through(pos) {
                    found_empty = true;
                }
            }
        }

        tracing::debug!(
            "collapse at {} (r={}): {} blocks fell, {} in frontier",
            epicenter,
            radius,
            collapsed.len(),
            frontier.len()
        );

        if !frontier.is_empty() {
            queue.enqueue(
                PendingPropagation::new(epicenter, frontier.clone(), radius_squared),
                now.saturating_add(self.config.propagation_delay_ticks),
            );
        }

        CollapseOutcome {
            epicenter,
            radius_squared,
            collapsed,
            frontier,
        }
    }

    /// Collapses one block: first matching recipe, grid write, falling block.
    ///
    /// Returns false and leaves the grid alone if no recipe accepts `state`.
    pub fn collapse_block<G, E>(&self, grid: &mut G, effects: &mut E, pos: BlockPos, state: Block) -> bool
    where
        G: SpatialGrid + ?Sized,
        E: EffectSink + ?Sized,
    {
        let Some(fallen) = self.recipes.transform(state) else {
            return false;
        };
        grid.set_block_state(pos, fallen);
        effects.spawn_falling_block(pos, fallen);
        true
    }

    /// Runs one continuation pass over a drained record.
    ///
    /// Returns the next record (same epicenter and radius) if anything fell,
    /// `None` once the cascade has settled. Does not enqueue.
    pub fn propagate<G, R, E>(
        &self,
        grid: &mut G,
        rng: &mut R,
        effects: &mut E,
        record: &PendingPropagation,
    ) -> Option<PendingPropagation>
    where
        G: SpatialGrid + ?Sized,
        R: Rng + ?Sized,
        E: EffectSink + ?Sized,
    {
        let mut next = Vec::new();
        for &pos in &record.frontier {
            let state = grid.block_state(pos);
            if self.tags.has_tag(state, BlockTag::CanCollapse)
                && record.within_radius(pos)
                && roll(rng, self.config.collapse_propagate_chance)
                && self.collapse_block(grid, effects, pos, state)
            {
                let above = pos.up();
                if record.within_radius(above) {
                    next.push(above);
                }
            }
        }

        tracing::trace!(
            "continuation at {}: {} of {} frontier blocks continue",
            record.epicenter,
            next.len(),
            record.frontier.len()
        );

        if next.is_empty() {
            return None;
        }
        effects.play_sound(record.epicenter, CollapseSound::RockSlideShort);
        Some(PendingPropagation::new(record.epicenter, next, record.radius_squared))
    }

    /// Draws `min + rand(variance)`, capped at [`MAX_COLLAPSE_RADIUS`]; no
    /// draw when the variance is zero.
    fn draw_radius<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let variance = self.config.collapse_radius_variance;
        let extra = if variance == 0 { 0 } else { rng.gen_range(0..variance) };
        self.config
            .collapse_min_radius
            .saturating_add(extra)
            .min(MAX_COLLAPSE_RADIUS) as i32
    }
}

/// `true` with probability `chance`.
#[inline]
fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    rng.gen::<f32>() < chance
}
