//! Notifications emitted by the simulation
//!
//! The core never plays sounds or draws anything; it hands typed events to
//! an [`EventSink`] and lets the caller decide what to do with them.

use serde::{Deserialize, Serialize};

use super::chain::{Color, Effect};

/// How a board ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A ball reached the end of its path
    Lost,
    /// Every chain was cleared
    Won,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    BallLaunched { color: Color },
    BallCollision { chain: usize },
    BallsMatched { chain: usize, color: Color, count: usize },
    EffectTriggered { chain: usize, effect: Effect },
    BoardOver { outcome: Outcome },
}

/// Receiver for simulation notifications
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: GameEvent) {
        log::debug!("event: {:?}", event);
    }
}
