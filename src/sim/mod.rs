//! Deterministic simulation module
//!
//! All chain logic lives here. This module must stay pure and deterministic:
//! - One fixed-order tick (movement, collisions, matches)
//! - No randomness
//! - Stable iteration order (chain order, then head to foot)
//! - No rendering or platform dependencies

pub mod chain;
pub mod collision;
pub mod events;
pub mod list;
pub mod matching;
pub mod movement;
pub mod path;
pub mod state;
pub mod tick;

pub use chain::{Ball, Chain, ChainedBall, Color, Effect, FreeBall};
pub use collision::{CollisionReport, resolve_collisions, should_insert_before};
pub use events::{EventSink, GameEvent, LogSink, Outcome};
pub use list::{Cursor, Direction, List, NodeId};
pub use matching::{MatchReport, resolve_matches};
pub use movement::{MovementReport, step_movement};
pub use path::{Advance, Path, PathError, Waypoint};
pub use state::GameState;
pub use tick::{TickReport, tick};
