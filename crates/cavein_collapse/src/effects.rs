//! # Collapse Effects
//!
//! The simulation never touches entities or audio. It reports what the host
//! should spawn or play through an [`EffectSink`] and forgets about it.

use cavein_shared::BlockPos;
use cavein_world::Block;

/// Sounds a collapse asks the host to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollapseSound {
    /// A new collapse started (played once per trigger).
    RockSlideLong,
    /// A continuation pass brought more blocks down.
    RockSlideShort,
}

/// A fire-and-forget request to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollapseEffect {
    /// Spawn a falling block entity at the centre of `pos` carrying `block`.
    ///
    /// The grid already holds `block` at `pos` when this is emitted.
    FallingBlock {
        /// Where the block failed.
        pos: BlockPos,
        /// The collapsed block state.
        block: Block,
    },
    /// Play a sound heard world-wide.
    Sound {
        /// Source position.
        pos: BlockPos,
        /// Which sound.
        sound: CollapseSound,
    },
}

/// Receiver of collapse effects.
pub trait EffectSink {
    /// Accepts one effect. Must not fail; a sink that cannot deliver drops it.
    fn emit(&mut self, effect: CollapseEffect);

    /// Requests a falling block entity.
    fn spawn_falling_block(&mut self, pos: BlockPos, block: Block) {
        self.emit(CollapseEffect::FallingBlock { pos, block });
    }

    /// Requests a sound.
    fn play_sound(&mut self, pos: BlockPos, sound: CollapseSound) {
        self.emit(CollapseEffect::Sound { pos, sound });
    }
}

impl EffectSink for Vec<CollapseEffect> {
    fn emit(&mut self, effect: CollapseEffect) {
        self.push(effect);
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl EffectSink for NoEffects {
    fn emit(&mut self, _effect: CollapseEffect) {}
}
