//! Launch operation
//!
//! Sits outside the simulation core: turns an aim point into a [`FreeBall`]
//! and appends it to the state. The next loaded color prefers colors that
//! are still on the board.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::board::{Board, BoardError};
use crate::sim::{Ball, Color, EventSink, FreeBall, GameEvent, GameState};

#[derive(Debug, Clone)]
pub struct Launcher {
    pub position: Vec2,
    palette: Vec<Color>,
    rng: Pcg32,
    loaded: Color,
}

impl Launcher {
    pub fn new(position: Vec2, palette: Vec<Color>, seed: u64) -> Result<Self, BoardError> {
        if palette.is_empty() {
            return Err(BoardError::EmptyPalette);
        }
        let mut rng = Pcg32::seed_from_u64(seed);
        let loaded = palette[rng.random_range(0..palette.len())];
        Ok(Self {
            position,
            palette,
            rng,
            loaded,
        })
    }

    pub fn for_board(board: &Board, seed: u64) -> Result<Self, BoardError> {
        Self::new(board.launcher, board.palette.clone(), seed)
    }

    /// Color of the next shot
    pub fn loaded(&self) -> Color {
        self.loaded
    }

    /// Fire the loaded ball toward `aim` at the state's launch speed.
    /// Returns `None` (and fires nothing) if the board is over or the aim
    /// point sits on the launcher.
    pub fn fire(
        &mut self,
        state: &mut GameState,
        aim: Vec2,
        sink: &mut impl EventSink,
    ) -> Option<FreeBall> {
        if state.outcome.is_some() {
            return None;
        }
        let direction = (aim - self.position).normalize_or_zero();
        if direction == Vec2::ZERO {
            return None;
        }

        let color = self.loaded;
        let free = FreeBall {
            ball: Ball::new(self.position, color),
            vel: direction * state.speeds.launch,
        };
        state.free_balls.push(free);
        sink.emit(GameEvent::BallLaunched { color });

        self.loaded = self.pick_next(state);
        Some(free)
    }

    fn pick_next(&mut self, state: &GameState) -> Color {
        let mut on_board: Vec<Color> = Vec::new();
        for chain in &state.chains {
            for (_, chained) in chain.iter() {
                let color = chained.ball.color;
                if self.palette.contains(&color) && !on_board.contains(&color) {
                    on_board.push(color);
                }
            }
        }
        let choices = if on_board.is_empty() {
            &self.palette
        } else {
            &on_board
        };
        choices[self.rng.random_range(0..choices.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::{Chain, Path};
    use std::sync::Arc;

    #[test]
    fn test_fire_appends_free_ball() {
        let mut state = GameState::new(&Settings::default());
        let mut launcher = Launcher::new(Vec2::new(100.0, 100.0), vec![Color::Red], 7).unwrap();
        let mut events = Vec::new();

        let fired = launcher
            .fire(&mut state, Vec2::new(100.0, 0.0), &mut events)
            .unwrap();

        assert_eq!(state.free_balls.len(), 1);
        assert_eq!(fired.ball.color, Color::Red);
        assert_eq!(fired.vel, Vec2::new(0.0, -state.speeds.launch));
        assert_eq!(events, vec![GameEvent::BallLaunched { color: Color::Red }]);
    }

    #[test]
    fn test_fire_at_launcher_does_nothing() {
        let mut state = GameState::new(&Settings::default());
        let mut launcher = Launcher::new(Vec2::ONE, vec![Color::Red], 7).unwrap();
        assert!(launcher.fire(&mut state, Vec2::ONE, &mut Vec::new()).is_none());
        assert!(state.free_balls.is_empty());
    }

    #[test]
    fn test_next_color_comes_from_the_board() {
        let path = Arc::new(Path::from_points(&[Vec2::ZERO, Vec2::new(500.0, 0.0)]).unwrap());
        let mut state = GameState::new(&Settings::default());
        state.chains.push(Chain::seeded(
            path,
            [(Color::Green, None), (Color::Green, None)],
            21.0,
        ));
        let mut launcher = Launcher::new(
            Vec2::new(250.0, 300.0),
            vec![Color::Red, Color::Green, Color::Blue],
            3,
        )
        .unwrap();

        for _ in 0..10 {
            launcher.fire(&mut state, Vec2::new(250.0, 0.0), &mut Vec::new());
            assert_eq!(launcher.loaded(), Color::Green);
        }
    }

    #[test]
    fn test_empty_palette_is_rejected() {
        assert!(matches!(
            Launcher::new(Vec2::ZERO, Vec::new(), 1),
            Err(BoardError::EmptyPalette)
        ));
    }
}
