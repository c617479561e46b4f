//! # CAVEIN Collapse
//!
//! Probabilistic structural failure that spreads upward and outward over
//! several ticks.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: every random draw comes from a caller-supplied RNG
//! 2. **Host-agnostic**: the grid is a [`cavein_world::SpatialGrid`], effects go
//!    to an [`EffectSink`]
//! 3. **Total**: simulation never errors; only loading rules or saves can fail
//!
//! ## Core Components
//!
//! - `SupportScanner`: finds unsupported ceilings where a collapse may start
//! - `CollapseEngine`: trigger, columnar scan, continuation passes
//! - `PropagationQueue`: cascades waiting for their next pass
//! - `RecipeBook`: what each block turns into when it falls
//! - `CollapseRules`: the above, loaded from a TOML rule file
//!
//! ## Example
//!
//! ```rust,ignore
//! use cavein_collapse::{CollapseEngine, CollapseRules, NoEffects, PropagationQueue};
//! use rand::SeedableRng;
//!
//! let rules = CollapseRules::from_file("data/collapse.toml")?;
//! let engine = CollapseEngine::from_rules(&rules, rules.config);
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! let mut queue = PropagationQueue::new();
//!
//! engine.try_trigger_collapse(&mut world, &mut rng, &mut queue, &mut NoEffects, mined_at, tick);
//!
//! for record in queue.drain_due(tick) {
//!     if let Some(next) = engine.propagate(&mut world, &mut rng, &mut NoEffects, &record) {
//!         queue.enqueue(next, tick + rules.config.propagation_delay_ticks);
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod queue;
pub mod recipe;
pub mod rules;
pub mod scanner;

pub use config::{CollapseConfig, SharedConfig, MAX_COLLAPSE_RADIUS};
pub use effects::{CollapseEffect, CollapseSound, EffectSink, NoEffects};
pub use engine::{CollapseEngine, CollapseOutcome};
pub use error::{CollapseError, CollapseResult};
pub use queue::{PendingPropagation, PropagationQueue, ScheduledPropagation};
pub use recipe::{BlockIngredient, CollapseRecipe, CollapseTransform, RecipeBook};
pub use rules::CollapseRules;
pub use scanner::{SupportRule, SupportScanner};
