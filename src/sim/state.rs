//! Simulation state
//!
//! Everything the engines read or mutate during a tick lives in
//! [`GameState`]. The engines receive it by `&mut` and hold nothing between
//! calls.

use std::sync::Arc;

use super::chain::{Chain, FreeBall};
use super::events::Outcome;
use super::path::Path;
use crate::settings::{Bounds, Settings, SpeedOptions};

#[derive(Debug, Clone)]
pub struct GameState {
    /// Collision radius shared by every ball
    pub ball_radius: f32,
    pub chains: Vec<Chain>,
    pub free_balls: Vec<FreeBall>,
    pub speeds: SpeedOptions,
    pub bounds: Bounds,
    /// Stand-still armed on a chain after each match
    pub match_cooldown_ticks: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Set once the board is over
    pub outcome: Option<Outcome>,
}

impl GameState {
    /// An empty state with no chains
    pub fn new(settings: &Settings) -> Self {
        Self {
            ball_radius: settings.ball_radius,
            chains: Vec::new(),
            free_balls: Vec::new(),
            speeds: settings.speeds,
            bounds: settings.bounds,
            match_cooldown_ticks: settings.match_cooldown_ticks,
            time_ticks: 0,
            outcome: None,
        }
    }

    /// Every distinct path referenced by a chain, in first-use order
    pub fn paths(&self) -> Vec<Arc<Path>> {
        let mut paths: Vec<Arc<Path>> = Vec::new();
        for chain in &self.chains {
            if !paths.iter().any(|p| Arc::ptr_eq(p, &chain.path)) {
                paths.push(Arc::clone(&chain.path));
            }
        }
        paths
    }

    /// Number of balls still sitting in chains
    pub fn chained_ball_count(&self) -> usize {
        self.chains.iter().map(Chain::len).sum()
    }

    /// No chained balls and nothing in flight
    pub fn is_cleared(&self) -> bool {
        self.chains.iter().all(Chain::is_empty) && self.free_balls.is_empty()
    }
}
