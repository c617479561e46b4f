//! # Block Tags
//!
//! Collapse behaviour is classified by set membership, not by block kind:
//! a rule file lists which ids may start a collapse and which may be dragged
//! along by one. Sets are built once at load time; lookups are O(1).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};

/// Tags the collapse simulation asks about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockTag {
    /// Block can be the origin of a collapse.
    CanStartCollapse,
    /// Block can fail once a collapse is under way.
    CanCollapse,
}

/// Membership sets for every [`BlockTag`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagRegistry {
    /// Ids tagged [`BlockTag::CanStartCollapse`].
    can_start_collapse: HashSet<BlockId>,
    /// Ids tagged [`BlockTag::CanCollapse`].
    can_collapse: HashSet<BlockId>,
}

impl TagRegistry {
    /// Creates an empty registry (nothing ever collapses).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `ids` to `tag`.
    pub fn insert(&mut self, tag: BlockTag, ids: impl IntoIterator<Item = BlockId>) {
        self.set_mut(tag).extend(ids);
    }

    /// Builder form of [`TagRegistry::insert`].
    #[must_use]
    pub fn with(mut self, tag: BlockTag, ids: impl IntoIterator<Item = BlockId>) -> Self {
        self.insert(tag, ids);
        self
    }

    /// Returns true if `block` carries `tag`.
    #[inline]
    #[must_use]
    pub fn has_tag(&self, block: Block, tag: BlockTag) -> bool {
        self.set(tag).contains(&block.id)
    }

    /// All ids carrying `tag`.
    #[must_use]
    pub fn ids(&self, tag: BlockTag) -> &HashSet<BlockId> {
        self.set(tag)
    }

    fn set(&self, tag: BlockTag) -> &HashSet<BlockId> {
        match tag {
            BlockTag::CanStartCollapse => &self.can_start_collapse,
            BlockTag::CanCollapse => &self.can_collapse,
        }
    }

    fn set_mut(&mut self, tag: BlockTag) -> &mut HashSet<BlockId> {
        match tag {
            BlockTag::CanStartCollapse => &mut self.can_start_collapse,
            BlockTag::CanCollapse => &mut self.can_collapse,
        }
    }
}
