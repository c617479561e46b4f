//! # CAVEIN Event System
//!
//! Lock-free hand-off of collapse effects to whoever renders or plays them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌─────────────┐      ┌─────────────────┐
//! │ CollapseWorld   │─────>│   Event     │─────>│   Host          │
//! │ (tick thread)   │      │   Channel   │      │ (entities,      │
//! └─────────────────┘      └─────────────┘      │  audio, net)    │
//!                                               └─────────────────┘
//! ```
//!
//! The channel is bounded. A full channel drops the event and logs a
//! warning; the simulation never waits on a consumer.

use cavein_collapse::{CollapseEffect, CollapseSound, EffectSink};
use cavein_shared::BlockPos;
use cavein_world::Block;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Events flowing out of the collapse simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum CaveEvent {
    // =========================================================================
    // Effects (per block / per pass)
    // =========================================================================
    /// Spawn a falling block entity.
    FallingBlock {
        /// Where the block failed.
        pos: BlockPos,
        /// The collapsed state it carries.
        block: Block,
    },

    /// Play a world-wide sound.
    Sound {
        /// Source position.
        pos: BlockPos,
        /// Which sound.
        sound: CollapseSound,
    },

    // =========================================================================
    // Lifecycle (per collapse)
    // =========================================================================
    /// A disturbance started a collapse.
    CollapseStarted {
        /// Origin of the collapse.
        epicenter: BlockPos,
        /// Squared radius drawn for it.
        radius_squared: i64,
        /// Blocks that fell in the initial scan.
        collapsed: usize,
    },

    /// A cascade produced no further frontier.
    CascadeSettled {
        /// Origin of the collapse.
        epicenter: BlockPos,
    },
}

impl From<CollapseEffect> for CaveEvent {
    fn from(effect: CollapseEffect) -> Self {
        match effect {
            CollapseEffect::FallingBlock { pos, block } => Self::FallingBlock { pos, block },
            CollapseEffect::Sound { pos, sound } => Self::Sound { pos, sound },
        }
    }
}

/// Bounded event channel.
pub struct EventBus {
    /// Sender end - held by the simulation.
    sender: Sender<CaveEvent>,
    /// Receiver end - held by consumers.
    receiver: Receiver<CaveEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    ///               A large collapse emits one event per fallen block.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a new pair of sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<CaveEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: CaveEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!("event channel full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl EffectSink for EventSender {
    fn emit(&mut self, effect: CollapseEffect) {
        self.send(effect.into());
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<CaveEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<CaveEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<CaveEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_arrive_as_events() {
        let (mut sender, receiver) = EventBus::create_pair(16);
        let pos = BlockPos::new(1, 2, 3);

        sender.spawn_falling_block(pos, Block::new(4));
        sender.play_sound(pos, CollapseSound::RockSlideShort);

        assert_eq!(
            receiver.drain(),
            vec![
                CaveEvent::FallingBlock {
                    pos,
                    block: Block::new(4)
                },
                CaveEvent::Sound {
                    pos,
                    sound: CollapseSound::RockSlideShort
                },
            ]
        );
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_channel_drops() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        let receiver = bus.receiver();
        let settled = CaveEvent::CascadeSettled {
            epicenter: BlockPos::ORIGIN,
        };

        assert!(sender.send(settled.clone()));
        assert!(!sender.send(settled));
        assert_eq!(receiver.pending_count(), 1);
    }

    #[test]
    fn test_disconnected_receiver() {
        let (sender, receiver) = EventBus::create_pair(4);
        drop(receiver);
        // Bus itself is gone too: nothing holds a receiver.
        assert!(!sender.send(CaveEvent::CascadeSettled {
            epicenter: BlockPos::ORIGIN
        }));
    }
}
