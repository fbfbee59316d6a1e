//! Marble Chain - simulation core for a marble-chain puzzle board
//!
//! Core modules:
//! - `sim`: Deterministic simulation (chains, collisions, movement, matching)
//! - `board`: Static board descriptions and the provider seam
//! - `launcher`: Launch operation that feeds free balls into the simulation
//! - `persistence`: Snapshot/restore of simulation state
//! - `settings`: Data-driven tuning

pub mod board;
pub mod launcher;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use board::{Board, BoardError, BoardProvider, StaticBoard};
pub use launcher::Launcher;
pub use settings::{Settings, SpeedOptions};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Default collision radius shared by every ball
    pub const BALL_RADIUS: f32 = 10.0;

    /// Distance under which a ball counts as having reached its waypoint
    pub const WAYPOINT_EPSILON: f32 = 0.5;
    /// Step length used when pushing balls along the path and walking
    /// insertion targets
    pub const PUSH_STEP: f32 = 1.0;
    /// Extra slack on top of 2×radius for two balls to count as adjacent
    pub const MATCH_SLACK: f32 = 1.0;
    /// Shortest run that gets removed
    pub const MIN_MATCH_RUN: usize = 3;

    /// Ticks the chain stands still after a match
    pub const MATCH_COOLDOWN_TICKS: u32 = 24;

    /// Bounded-loop caps. Hitting one means a logic error or malformed board.
    pub const MAX_BACKOFF_STEPS: u32 = 10_000;
    pub const MAX_WALK_STEPS: u32 = 10_000;
    pub const MAX_PUSH_STEPS: u32 = 100_000;
    pub const MAX_COLLISION_PASSES: u32 = 10_000;
}

/// Move `from` toward `to` by at most `step`, landing exactly on `to`
/// instead of overshooting it.
#[inline]
pub fn step_toward(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= step {
        to
    } else {
        from + delta / dist * step
    }
}

/// Two balls of the given radius collide iff their centers are at most
/// two radii apart (touching counts).
#[inline]
pub fn balls_collide(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance(b) <= 2.0 * radius
}
