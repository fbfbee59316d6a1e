//! Static board descriptions
//!
//! Paths are authored elsewhere; a board only turns polylines into shared
//! [`Path`]s and seeds the opening chains from its ball budget.

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::MATCH_SLACK;
use crate::settings::Settings;
use crate::sim::{Chain, Color, Effect, GameState, Path, PathError};

/// Effects a seeded ball can carry
const SEED_EFFECTS: [Effect; 4] = [Effect::Bomb, Effect::Slow, Effect::Reverse, Effect::Accuracy];

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("board has no paths")]
    NoPaths,
    #[error("board palette is empty")]
    EmptyPalette,
    #[error("path {index}: {source}")]
    Path {
        index: usize,
        #[source]
        source: PathError,
    },
    #[error("invalid board json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something that can hand out a board
pub trait BoardProvider {
    fn load(&self) -> Result<Board, BoardError>;
}

/// Board as authored: raw polylines plus a palette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticBoard {
    pub launcher: Vec2,
    pub paths: Vec<Vec<Vec2>>,
    pub palette: Vec<Color>,
    /// Total balls spread across all paths
    pub ball_budget: usize,
}

impl StaticBoard {
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl BoardProvider for StaticBoard {
    fn load(&self) -> Result<Board, BoardError> {
        Board::from_polylines(
            self.launcher,
            &self.paths,
            self.palette.clone(),
            self.ball_budget,
        )
    }
}

/// A loaded, read-only board
#[derive(Debug, Clone)]
pub struct Board {
    pub launcher: Vec2,
    pub paths: Vec<Arc<Path>>,
    pub palette: Vec<Color>,
    pub ball_budget: usize,
}

impl Board {
    /// Build paths from polylines. Waypoint ids are numbered across the
    /// whole board so every id is unique.
    pub fn from_polylines(
        launcher: Vec2,
        polylines: &[Vec<Vec2>],
        palette: Vec<Color>,
        ball_budget: usize,
    ) -> Result<Self, BoardError> {
        if polylines.is_empty() {
            return Err(BoardError::NoPaths);
        }
        if palette.is_empty() {
            return Err(BoardError::EmptyPalette);
        }

        let mut next_id = 0u32;
        let mut paths = Vec::with_capacity(polylines.len());
        for (index, points) in polylines.iter().enumerate() {
            let first = next_id;
            next_id += points.len() as u32;
            let path = Path::new((first..).zip(points.iter().copied()))
                .map_err(|source| BoardError::Path { index, source })?;
            paths.push(Arc::new(path));
        }

        log::info!(
            "Loaded board: {} paths, {} waypoints, {} colors",
            paths.len(),
            next_id,
            palette.len()
        );
        Ok(Self {
            launcher,
            paths,
            palette,
            ball_budget,
        })
    }

    /// Fresh simulation state with one seeded chain per path.
    ///
    /// The budget is split evenly (earlier paths take the remainder). Colors
    /// never form a ready-made run of three.
    pub fn seed_state(&self, settings: &Settings) -> GameState {
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let mut state = GameState::new(settings);
        let spacing = 2.0 * settings.ball_radius + MATCH_SLACK / 2.0;

        let per_path = self.ball_budget / self.paths.len();
        let remainder = self.ball_budget % self.paths.len();

        for (index, path) in self.paths.iter().enumerate() {
            let count = per_path + usize::from(index < remainder);
            if count as f32 * spacing > path.length() {
                log::warn!(
                    "Path {index} is too short for {count} balls ({} long)",
                    path.length()
                );
            }
            let balls = self.seed_balls(&mut rng, count, settings.effect_chance);
            state.chains.push(Chain::seeded(Arc::clone(path), balls, spacing));
        }

        log::info!(
            "Seeded {} chains with {} balls (seed {})",
            state.chains.len(),
            state.chained_ball_count(),
            settings.seed
        );
        state
    }

    fn seed_balls(
        &self,
        rng: &mut Pcg32,
        count: usize,
        effect_chance: f32,
    ) -> Vec<(Color, Option<Effect>)> {
        let mut balls: Vec<(Color, Option<Effect>)> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut color = self.palette[rng.random_range(0..self.palette.len())];
            let tail = balls.len().saturating_sub(2);
            let would_match = balls.len() >= 2 && balls[tail..].iter().all(|(c, _)| *c == color);
            if would_match && self.palette.len() > 1 {
                let others: Vec<Color> =
                    self.palette.iter().copied().filter(|c| *c != color).collect();
                color = others[rng.random_range(0..others.len())];
            }
            let effect = (rng.random::<f32>() < effect_chance)
                .then(|| SEED_EFFECTS[rng.random_range(0..SEED_EFFECTS.len())]);
            balls.push((color, effect));
        }
        balls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> StaticBoard {
        StaticBoard {
            launcher: Vec2::new(400.0, 300.0),
            paths: vec![
                vec![Vec2::new(0.0, 50.0), Vec2::new(800.0, 50.0)],
                vec![Vec2::new(0.0, 550.0), Vec2::new(800.0, 550.0)],
            ],
            palette: vec![Color::Red, Color::Blue],
            ball_budget: 21,
        }
    }

    #[test]
    fn test_waypoint_ids_are_board_unique() {
        let board = board().load().unwrap();
        assert_eq!(board.paths.len(), 2);
        assert!(board.paths[0].find(1).is_some());
        assert!(board.paths[0].find(2).is_none());
        assert!(board.paths[1].find(2).is_some());
        assert!(board.paths[1].find(3).is_some());
    }

    #[test]
    fn test_seed_state_splits_budget_without_runs() {
        let board = board().load().unwrap();
        let state = board.seed_state(&Settings::default());

        assert_eq!(state.chains.len(), 2);
        assert_eq!(state.chains[0].len(), 11);
        assert_eq!(state.chains[1].len(), 10);

        for chain in &state.chains {
            assert!(chain.is_ordered());
            let colors: Vec<Color> = chain.iter().map(|(_, b)| b.ball.color).collect();
            assert!(colors.windows(3).all(|w| !(w[0] == w[1] && w[1] == w[2])));
        }
    }

    #[test]
    fn test_seeding_is_deterministic() {
        let board = board().load().unwrap();
        let settings = Settings {
            effect_chance: 0.5,
            ..Settings::default()
        };
        let a = board.seed_state(&settings);
        let b = board.seed_state(&settings);

        let balls = |state: &GameState| -> Vec<(Color, Option<Effect>)> {
            state.chains[0]
                .iter()
                .map(|(_, b)| (b.ball.color, b.effect))
                .collect()
        };
        assert_eq!(balls(&a), balls(&b));
    }

    #[test]
    fn test_rejects_empty_boards() {
        let mut raw = board();
        raw.palette.clear();
        assert!(matches!(raw.load(), Err(BoardError::EmptyPalette)));

        let mut raw = board();
        raw.paths.clear();
        assert!(matches!(raw.load(), Err(BoardError::NoPaths)));

        let mut raw = board();
        raw.paths[1] = vec![Vec2::ZERO, Vec2::ZERO];
        assert!(matches!(
            raw.load(),
            Err(BoardError::Path {
                index: 1,
                source: PathError::ZeroLengthSegment(3)
            })
        ));
    }

    #[test]
    fn test_board_from_json() {
        let json = r#"{
            "launcher": [400.0, 300.0],
            "paths": [[[0.0, 0.0], [100.0, 0.0]]],
            "palette": ["Red", "Green", "Yellow"],
            "ball_budget": 3
        }"#;
        let board = StaticBoard::from_json(json).unwrap().load().unwrap();
        assert_eq!(board.palette, vec![Color::Red, Color::Green, Color::Yellow]);
        assert_eq!(board.paths[0].len(), 2);
    }
}
