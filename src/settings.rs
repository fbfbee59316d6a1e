//! Simulation tuning
//!
//! Loaded from a JSON file on native targets; anything missing falls back to
//! the defaults below.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{BALL_RADIUS, MATCH_COOLDOWN_TICKS};

/// Per-ball-type speeds, in units per tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedOptions {
    /// How fast the foot drives the chain along its path
    pub chain: f32,
    /// How fast a merging ball slides toward its settle point
    pub insertion: f32,
    /// Launch speed of free balls
    pub launch: f32,
}

impl Default for SpeedOptions {
    fn default() -> Self {
        Self {
            chain: 0.5,
            insertion: 2.0,
            launch: 8.0,
        }
    }
}

/// Axis-aligned playfield rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// True when a ball of `radius` centered at `pos` still touches the field
    pub fn touches(&self, pos: Vec2, radius: f32) -> bool {
        pos.x + radius >= self.min.x
            && pos.x - radius <= self.max.x
            && pos.y + radius >= self.min.y
            && pos.y - radius <= self.max.y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(800.0, 600.0))
    }
}

/// Errors loading a settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Collision radius shared by every ball
    pub ball_radius: f32,
    pub speeds: SpeedOptions,
    /// Ticks a chain stands still after a match
    pub match_cooldown_ticks: u32,
    pub bounds: Bounds,
    /// Seed for board seeding and launcher colors
    pub seed: u64,
    /// Chance (0-1) that a seeded ball carries an effect
    pub effect_chance: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ball_radius: BALL_RADIUS,
            speeds: SpeedOptions::default(),
            match_cooldown_ticks: MATCH_COOLDOWN_TICKS,
            bounds: Bounds::default(),
            seed: 0x5EED,
            effect_chance: 0.05,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from `path`, or defaults if the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
