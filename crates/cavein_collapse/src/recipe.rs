//! # Collapse Recipes
//!
//! A recipe only says *what* a block turns into when it fails. Whether a
//! block can fail at all is decided by tags; a tagged block without a recipe
//! simply never collapses.
//!
//! ## Lookup
//!
//! Recipes are kept in registration order and indexed by block id. For a
//! given block the first registered recipe whose ingredient contains it wins,
//! so more specific recipes must be registered before broader ones.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut book = RecipeBook::new();
//! book.add_recipe(CollapseRecipe::new(
//!     "raw_rock",
//!     BlockIngredient::of([GRANITE, BASALT]),
//!     CollapseTransform::new(Block::new(COBBLE)).copying_input_state(),
//! )?)?;
//!
//! let transformed = book.transform(Block::with_meta(GRANITE, 3));
//! ```

use std::collections::{HashMap, HashSet};

use cavein_world::{Block, BlockId};
use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, CollapseResult};

/// Set of block ids a recipe accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockIngredient {
    blocks: HashSet<BlockId>,
}

impl BlockIngredient {
    /// Ingredient accepting exactly `ids`.
    #[must_use]
    pub fn of(ids: impl IntoIterator<Item = BlockId>) -> Self {
        Self {
            blocks: ids.into_iter().collect(),
        }
    }

    /// Returns true if `block` is accepted.
    #[inline]
    #[must_use]
    pub fn test(&self, block: Block) -> bool {
        self.blocks.contains(&block.id)
    }

    /// Every accepted id.
    pub fn valid_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().copied()
    }

    /// Returns true if no block is accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// What a failing block becomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollapseTransform {
    /// Resulting block.
    pub output: Block,
    /// Carry the input block's properties (`meta`) over to the output.
    #[serde(default)]
    pub copy_input_state: bool,
}

impl CollapseTransform {
    /// Transform to `output`, dropping the input's properties.
    #[must_use]
    pub const fn new(output: Block) -> Self {
        Self {
            output,
            copy_input_state: false,
        }
    }

    /// Keeps the input's properties on the output.
    #[must_use]
    pub const fn copying_input_state(mut self) -> Self {
        self.copy_input_state = true;
        self
    }

    /// Applies the transform.
    #[inline]
    #[must_use]
    pub const fn apply(&self, input: Block) -> Block {
        if self.copy_input_state {
            Block::with_meta(self.output.id, input.meta)
        } else {
            self.output
        }
    }
}

/// A named collapse recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollapseRecipe {
    /// Unique recipe name.
    pub name: String,
    /// Blocks this recipe applies to.
    pub ingredient: BlockIngredient,
    /// The transformation applied.
    pub transform: CollapseTransform,
}

impl CollapseRecipe {
    /// Creates a recipe with basic validation.
    ///
    /// # Errors
    ///
    /// Returns error if the ingredient is empty or matches air or unloaded
    /// space.
    pub fn new(
        name: impl Into<String>,
        ingredient: BlockIngredient,
        transform: CollapseTransform,
    ) -> CollapseResult<Self> {
        let recipe = Self {
            name: name.into(),
            ingredient,
            transform,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    fn validate(&self) -> CollapseResult<()> {
        if self.ingredient.is_empty() {
            return Err(CollapseError::InvalidConfig(format!(
                "recipe '{}' has an empty ingredient",
                self.name
            )));
        }
        if self.ingredient.test(Block::AIR) || self.ingredient.test(Block::UNLOADED) {
            return Err(CollapseError::InvalidConfig(format!(
                "recipe '{}' matches air or unloaded space",
                self.name
            )));
        }
        Ok(())
    }
}

/// Ordered recipe registry with a per-block index.
#[derive(Debug, Default)]
pub struct RecipeBook {
    /// Recipes in registration order.
    recipes: Vec<CollapseRecipe>,
    /// Block id to indices into `recipes`, ascending.
    by_block: HashMap<BlockId, Vec<usize>>,
}

impl RecipeBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from recipes in order.
    ///
    /// # Errors
    ///
    /// See [`RecipeBook::add_recipe`].
    pub fn from_recipes(recipes: impl IntoIterator<Item = CollapseRecipe>) -> CollapseResult<Self> {
        let mut book = Self::new();
        for recipe in recipes {
            book.add_recipe(recipe)?;
        }
        Ok(book)
    }

    /// Appends a recipe. It loses ties against every earlier recipe.
    ///
    /// # Errors
    ///
    /// Returns error if the name is taken or the recipe is invalid.
    pub fn add_recipe(&mut self, recipe: CollapseRecipe) -> CollapseResult<()> {
        recipe.validate()?;
        if self.recipes.iter().any(|r| r.name == recipe.name) {
            return Err(CollapseError::DuplicateRecipe(recipe.name));
        }

        let index = self.recipes.len();
        for id in recipe.ingredient.valid_blocks() {
            self.by_block.entry(id).or_default().push(index);
        }
        self.recipes.push(recipe);
        Ok(())
    }

    /// First recipe (in registration order) accepting `block`.
    #[must_use]
    pub fn find(&self, block: Block) -> Option<&CollapseRecipe> {
        self.by_block
            .get(&block.id)?
            .iter()
            .map(|&i| &self.recipes[i])
            .find(|recipe| recipe.ingredient.test(block))
    }

    /// The collapsed form of `block`, if any recipe accepts it.
    #[must_use]
    pub fn transform(&self, block: Block) -> Option<Block> {
        self.find(block).map(|recipe| recipe.transform.apply(block))
    }

    /// Returns the number of recipes.
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Returns true if some recipe accepts `id`.
    #[must_use]
    pub fn covers(&self, id: BlockId) -> bool {
        self.by_block.contains_key(&id)
    }
}
