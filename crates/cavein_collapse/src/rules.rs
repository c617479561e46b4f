//! # Rule Files
//!
//! Everything the simulation needs besides the grid, loaded from one TOML
//! document:
//!
//! ```toml
//! passable = [8, 9]          # falling blocks pass through these (besides air)
//!
//! [config]                   # CollapseConfig; omitted keys keep defaults
//! collapse_trigger_chance = 0.1
//!
//! [tags]
//! can_start_collapse = [1, 2]
//! can_collapse = [1, 2, 3]
//!
//! [[supports]]
//! block = 20
//! up = 3
//! down = 0
//! horizontal = 2
//!
//! [[recipes]]                # first match wins, in file order
//! name = "stone"
//! ingredient = [1]
//! transform = { output = { id = 4 }, copy_input_state = false }
//! ```
//!
//! Loading validates everything up front; nothing is checked again while
//! simulating.

use std::collections::HashSet;
use std::path::Path;

use cavein_world::{BlockId, BlockTag, TagRegistry};
use serde::Deserialize;

use crate::config::CollapseConfig;
use crate::error::{CollapseError, CollapseResult};
use crate::recipe::{CollapseRecipe, RecipeBook};
use crate::scanner::{SupportRule, SupportScanner};

/// On-disk layout of a rule file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RuleFile {
    passable: Vec<BlockId>,
    config: CollapseConfig,
    tags: TagRegistry,
    supports: Vec<SupportRule>,
    recipes: Vec<CollapseRecipe>,
}

/// A validated rule set.
#[derive(Debug, Default)]
pub struct CollapseRules {
    /// Initial configuration.
    pub config: CollapseConfig,
    /// Collapse tags.
    pub tags: TagRegistry,
    /// Extra passable ids for the grid.
    pub passable: HashSet<BlockId>,
    /// Candidate search with the configured supports.
    pub scanner: SupportScanner,
    /// Collapse recipes in file order.
    pub recipes: RecipeBook,
}

impl CollapseRules {
    /// Parses and validates a rule document.
    ///
    /// # Errors
    ///
    /// Returns [`CollapseError::InvalidConfig`] for syntax errors, unknown
    /// keys and invalid values, and [`CollapseError::DuplicateRecipe`] if two
    /// recipes share a name.
    pub fn from_toml_str(source: &str) -> CollapseResult<Self> {
        let file: RuleFile = toml::from_str(source).map_err(|e| CollapseError::InvalidConfig(e.to_string()))?;
        file.config.validate()?;

        let rules = Self {
            config: file.config,
            tags: file.tags,
            passable: file.passable.into_iter().collect(),
            scanner: SupportScanner::with_rules(file.supports)?,
            recipes: RecipeBook::from_recipes(file.recipes)?,
        };
        rules.warn_uncovered();
        Ok(rules)
    }

    /// Reads a rule file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CollapseError::Io`] if the file cannot be read, otherwise as
    /// [`CollapseRules::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> CollapseResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| CollapseError::Io(format!("failed to read {}: {e}", path.display())))?;
        let rules = Self::from_toml_str(&source)?;
        tracing::info!(
            "loaded {} collapse recipes and {} support rules from {}",
            rules.recipes.recipe_count(),
            rules.scanner.rules().count(),
            path.display()
        );
        Ok(rules)
    }

    /// Tagged blocks without a recipe never fall; usually a rule-file mistake.
    fn warn_uncovered(&self) {
        let mut uncovered: Vec<BlockId> = self
            .tags
            .ids(BlockTag::CanCollapse)
            .iter()
            .copied()
            .filter(|id| !self.recipes.covers(*id))
            .collect();
        if !uncovered.is_empty() {
            uncovered.sort_unstable();
            tracing::warn!("blocks tagged can_collapse have no recipe: {:?}", uncovered);
        }
    }
}
