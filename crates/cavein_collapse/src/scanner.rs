//! # Support Scanner
//!
//! Finds the positions inside a box where a collapse could begin: a block
//! tagged [`BlockTag::CanStartCollapse`] with nothing solid underneath, that
//! no support block is holding up.
//!
//! ## Supports
//!
//! A [`SupportRule`] makes a block kind (a beam, a pillar) hold up every
//! position within `horizontal` blocks on x/z and from `down` below to `up`
//! above itself. With no rules, nothing is supported and the scan reduces to
//! the tag and gap checks.

use std::collections::{HashMap, HashSet};

use cavein_shared::{BlockBox, BlockPos};
use cavein_world::{BlockId, BlockTag, SpatialGrid, TagRegistry};
use serde::{Deserialize, Serialize};

use crate::config::MAX_COLLAPSE_RADIUS;
use crate::error::{CollapseError, CollapseResult};

/// Support range of one block kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportRule {
    /// Block kind providing support.
    pub block: BlockId,
    /// Blocks supported above the support block.
    pub up: i32,
    /// Blocks supported below the support block.
    pub down: i32,
    /// Blocks supported on each horizontal side.
    pub horizontal: i32,
}

impl SupportRule {
    /// Box of positions held up by a support at `pos`.
    #[must_use]
    pub fn coverage(&self, pos: BlockPos) -> BlockBox {
        BlockBox::new(
            pos.offset(-self.horizontal, -self.down, -self.horizontal),
            pos.offset(self.horizontal, self.up, self.horizontal),
        )
    }
}

/// Returns true if `pos` may be the origin of a collapse.
///
/// Tag check plus a passable position directly below. Supports are not
/// consulted here.
#[inline]
pub fn is_trigger_site<G: SpatialGrid + ?Sized>(grid: &G, tags: &TagRegistry, pos: BlockPos) -> bool {
    tags.has_tag(grid.block_state(pos), BlockTag::CanStartCollapse) && grid.can_fall_through(pos.down())
}

/// Candidate search over a bounding box.
#[derive(Clone, Debug, Default)]
pub struct SupportScanner {
    /// Rules keyed by support block id.
    rules: HashMap<BlockId, SupportRule>,
    /// Largest `up` of any rule.
    max_up: i32,
    /// Largest `down` of any rule.
    max_down: i32,
    /// Largest `horizontal` of any rule.
    max_horizontal: i32,
}

impl SupportScanner {
    /// Scanner without supports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner with the given support rules.
    ///
    /// # Errors
    ///
    /// Returns [`CollapseError::InvalidConfig`] for negative ranges, ranges
    /// beyond [`MAX_COLLAPSE_RADIUS`] or two rules for the same block.
    pub fn with_rules(rules: impl IntoIterator<Item = SupportRule>) -> CollapseResult<Self> {
        let mut scanner = Self::new();
        for rule in rules {
            if rule.up < 0 || rule.down < 0 || rule.horizontal < 0 {
                return Err(CollapseError::InvalidConfig(format!(
                    "support rule for block {} has a negative range",
                    rule.block
                )));
            }
            let limit = MAX_COLLAPSE_RADIUS as i32;
            if rule.up > limit || rule.down > limit || rule.horizontal > limit {
                return Err(CollapseError::InvalidConfig(format!(
                    "support rule for block {} reaches beyond {limit} blocks",
                    rule.block
                )));
            }
            if scanner.rules.insert(rule.block, rule).is_some() {
                return Err(CollapseError::InvalidConfig(format!(
                    "block {} has two support rules",
                    rule.block
                )));
            }
            scanner.max_up = scanner.max_up.max(rule.up);
            scanner.max_down = scanner.max_down.max(rule.down);
            scanner.max_horizontal = scanner.max_horizontal.max(rule.horizontal);
        }
        Ok(scanner)
    }

    /// Configured rules, in no particular order.
    pub fn rules(&self) -> impl Iterator<Item = &SupportRule> {
        self.rules.values()
    }

    /// Every position in `bounds` held up by a support block.
    ///
    /// Supports outside `bounds` count: the scan covers `bounds` grown by the
    /// largest ranges.
    #[must_use]
    pub fn supported_positions<G: SpatialGrid + ?Sized>(&self, grid: &G, bounds: BlockBox) -> HashSet<BlockPos> {
        let mut supported = HashSet::new();
        if self.rules.is_empty() {
            return supported;
        }

        // A support at y holds [y - down, y + up], so look `max_up` below and `max_down` above.
        let search = bounds.expand(self.max_horizontal, self.max_up, self.max_down);
        for pos in search {
            let Some(rule) = self.rules.get(&grid.block_state(pos).id) else {
                continue;
            };
            supported.extend(rule.coverage(pos).into_iter().filter(|p| bounds.contains(*p)));
        }
        supported
    }

    /// Lazily yields every unsupported trigger site between `min` and `max`
    /// (inclusive), x fastest, then y, then z.
    ///
    /// Read-only. Each call rescans; callers may stop at the first hit.
    pub fn find_unsupported_positions<'a, G: SpatialGrid + ?Sized>(
        &'a self,
        grid: &'a G,
        tags: &'a TagRegistry,
        min: BlockPos,
        max: BlockPos,
    ) -> impl Iterator<Item = BlockPos> + 'a {
        let bounds = BlockBox::new(min, max);
        let supported = self.supported_positions(grid, bounds);
        bounds
            .into_iter()
            .filter(move |pos| !supported.contains(pos) && is_trigger_site(grid, tags, *pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cavein_world::{Block, VoxelWorld};

    const STONE: Block = Block::new(2);
    const BEAM: Block = Block::new(20);

    fn tags() -> TagRegistry {
        TagRegistry::new()
            .with(BlockTag::CanStartCollapse, [STONE.id])
            .with(BlockTag::CanCollapse, [STONE.id])
    }

    /// Stone ceiling at y=1 over air, 5x5 around the origin.
    fn ceiling_world() -> VoxelWorld {
        let mut world = VoxelWorld::new();
        world.ensure_loaded_around(BlockPos::ORIGIN, 16);
        world.fill(BlockBox::around(BlockPos::new(0, 1, 0), 2, 0, 2), STONE);
        world
    }

    #[test]
    fn test_finds_ceiling_in_box_order() {
        let world = ceiling_world();
        let scanner = SupportScanner::new();
        let tags = tags();
        let found: Vec<BlockPos> = scanner
            .find_unsupported_positions(&world, &tags, BlockPos::new(-1, 0, -1), BlockPos::new(1, 2, 1))
            .collect();

        assert_eq!(found.len(), 9);
        assert_eq!(found[0], BlockPos::new(-1, 1, -1));
        assert_eq!(found[1], BlockPos::new(0, 1, -1));
        assert!(found.iter().all(|p| p.y == 1));
    }

    #[test]
    fn test_requires_gap_below() {
        let mut world = ceiling_world();
        world.fill(BlockBox::around(BlockPos::ORIGIN, 2, 0, 2), Block::new(5));
        let tags = tags();
        let scanner = SupportScanner::new();
        assert_eq!(
            scanner
                .find_unsupported_positions(&world, &tags, BlockPos::new(-2, -2, -2), BlockPos::new(2, 2, 2))
                .count(),
            0
        );
    }

    #[test]
    fn test_support_rule_suppresses_candidates() {
        let mut world = ceiling_world();
        world.set_block_state(BlockPos::new(0, 0, 0), BEAM);
        let scanner = SupportScanner::with_rules([SupportRule {
            block: BEAM.id,
            up: 1,
            down: 0,
            horizontal: 1,
        }])
        .unwrap();
        let tags = tags();

        let found: HashSet<BlockPos> = scanner
            .find_unsupported_positions(&world, &tags, BlockPos::new(-2, 1, -2), BlockPos::new(2, 1, 2))
            .collect();

        // 25 ceiling blocks minus the 3x3 held by the beam.
        assert_eq!(found.len(), 16);
        assert!(!found.contains(&BlockPos::new(1, 1, 1)));
        assert!(found.contains(&BlockPos::new(2, 1, 2)));
    }

    #[test]
    fn test_support_outside_box_counts() {
        let mut world = ceiling_world();
        world.set_block_state(BlockPos::new(0, -3, 0), BEAM);
        let scanner = SupportScanner::with_rules([SupportRule {
            block: BEAM.id,
            up: 4,
            down: 0,
            horizontal: 0,
        }])
        .unwrap();

        let supported = scanner.supported_positions(&world, BlockBox::around(BlockPos::new(0, 1, 0), 1, 0, 1));
        assert_eq!(supported.len(), 1);
        assert!(supported.contains(&BlockPos::new(0, 1, 0)));
    }

    #[test]
    fn test_rejects_bad_rules() {
        let rule = SupportRule {
            block: BEAM.id,
            up: 1,
            down: -1,
            horizontal: 1,
        };
        assert!(SupportScanner::with_rules([rule]).is_err());

        let rule = SupportRule { down: 1, ..rule };
        assert!(SupportScanner::with_rules([rule, rule]).is_err());

        let limit = MAX_COLLAPSE_RADIUS as i32;
        assert!(SupportScanner::with_rules([SupportRule { horizontal: limit, ..rule }]).is_ok());
        assert!(SupportScanner::with_rules([SupportRule { horizontal: 100_000, ..rule }]).is_err());
        assert!(SupportScanner::with_rules([SupportRule { up: limit + 1, ..rule }]).is_err());
    }
}
