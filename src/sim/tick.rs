//! Fixed-order simulation tick
//!
//! One tick is movement, then collisions (to a fixed point), then one match
//! check per chain. Nothing in here suspends or retries.

use super::collision::resolve_collisions;
use super::events::{EventSink, GameEvent, Outcome};
use super::matching::resolve_matches;
use super::movement::step_movement;
use super::state::GameState;

/// What happened during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub collided: bool,
    pub matched: bool,
    pub outcome: Option<Outcome>,
}

/// Advance the simulation by one tick. A finished board is left untouched.
pub fn tick(state: &mut GameState, sink: &mut impl EventSink) -> TickReport {
    if state.outcome.is_some() {
        return TickReport {
            outcome: state.outcome,
            ..Default::default()
        };
    }

    state.time_ticks += 1;

    step_movement(state, sink);
    let collided = resolve_collisions(state, sink).has_collision;

    let mut matched = false;
    for chain in 0..state.chains.len() {
        matched |= resolve_matches(state, chain, sink).matches;
    }

    if state.outcome.is_none() && state.is_cleared() {
        log::info!("Board cleared at tick {}", state.time_ticks);
        state.outcome = Some(Outcome::Won);
        sink.emit(GameEvent::BoardOver {
            outcome: Outcome::Won,
        });
    }

    TickReport {
        collided,
        matched,
        outcome: state.outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::chain::{Ball, Chain, Color, FreeBall};
    use crate::sim::path::Path;
    use glam::Vec2;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn row(colors: &[Color]) -> GameState {
        let path = Arc::new(
            Path::from_points(&[Vec2::new(0.0, 300.0), Vec2::new(800.0, 300.0)]).unwrap(),
        );
        let mut state = GameState::new(&Settings::default());
        state.ball_radius = 10.0;
        state.speeds.chain = 0.5;
        state.speeds.insertion = 2.0;
        state
            .chains
            .push(Chain::seeded(path, colors.iter().map(|&c| (c, None)), 20.5));
        state
    }

    #[test]
    fn test_shot_completes_a_run() {
        // Head to foot: G R R B, reds at x=41 and x=20.5
        let mut state = row(&[Color::Green, Color::Red, Color::Red, Color::Blue]);
        state.free_balls.push(FreeBall {
            ball: Ball::new(Vec2::new(31.0, 200.0), Color::Red),
            vel: Vec2::new(0.0, 8.0),
        });

        let mut events = Vec::new();
        let mut matched = false;
        for _ in 0..300 {
            let report = tick(&mut state, &mut events);
            if report.matched {
                matched = true;
                break;
            }
        }

        assert!(matched);
        let colors: Vec<Color> = state.chains[0].iter().map(|(_, b)| b.ball.color).collect();
        assert_eq!(colors, vec![Color::Green, Color::Blue]);
        assert!(events.contains(&GameEvent::BallCollision { chain: 0 }));
        assert!(events.contains(&GameEvent::BallsMatched {
            chain: 0,
            color: Color::Red,
            count: 3
        }));
    }

    #[test]
    fn test_cleared_board_is_won_once() {
        let mut state = row(&[]);
        let mut events = Vec::new();

        let report = tick(&mut state, &mut events);
        assert_eq!(report.outcome, Some(Outcome::Won));

        let report = tick(&mut state, &mut events);
        assert_eq!(report.outcome, Some(Outcome::Won));
        assert_eq!(
            events,
            vec![GameEvent::BoardOver {
                outcome: Outcome::Won
            }]
        );
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_ball_in_flight_keeps_board_open() {
        let mut state = row(&[]);
        state.free_balls.push(FreeBall {
            ball: Ball::new(Vec2::new(400.0, 100.0), Color::Red),
            vel: Vec2::new(0.0, -1.0),
        });
        assert_eq!(tick(&mut state, &mut Vec::new()).outcome, None);
    }

    #[test]
    fn test_determinism() {
        let build = || {
            let mut state = row(&[Color::Red, Color::Blue, Color::Blue, Color::Green, Color::Red]);
            state.free_balls.push(FreeBall {
                ball: Ball::new(Vec2::new(60.0, 150.0), Color::Blue),
                vel: Vec2::new(0.3, 6.0),
            });
            state
        };
        let mut state1 = build();
        let mut state2 = build();
        let mut events1 = Vec::new();
        let mut events2 = Vec::new();

        for _ in 0..400 {
            tick(&mut state1, &mut events1);
            tick(&mut state2, &mut events2);
        }

        assert_eq!(events1, events2);
        let pos1: Vec<Vec2> = state1.chains[0].iter().map(|(_, b)| b.ball.pos).collect();
        let pos2: Vec<Vec2> = state2.chains[0].iter().map(|(_, b)| b.ball.pos).collect();
        assert_eq!(pos1, pos2);
    }

    const PALETTE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    proptest! {
        #[test]
        fn prop_chain_stays_ordered_under_fire(
            colors in proptest::collection::vec(0usize..4, 6..18),
            shots in proptest::collection::vec((0usize..32, 0usize..4, 0u32..12), 1..8),
        ) {
            // Doubles back on itself so balls run along -x as well as +x
            let path = Arc::new(
                Path::from_points(&[
                    Vec2::new(20.0, 60.0),
                    Vec2::new(380.0, 60.0),
                    Vec2::new(380.0, 260.0),
                    Vec2::new(20.0, 260.0),
                    Vec2::new(20.0, 460.0),
                    Vec2::new(380.0, 460.0),
                ])
                .unwrap(),
            );
            let mut state = GameState::new(&Settings::default());
            state.ball_radius = 10.0;
            state.chains.push(Chain::seeded(
                path,
                colors.iter().map(|&c| (PALETTE[c], None)),
                20.5,
            ));
            let launcher = Vec2::new(650.0, 300.0);
            let min_gap = 2.0 * state.ball_radius - 1e-3;

            let mut shots = shots.into_iter();
            let mut wait = 0u32;
            let mut events = Vec::new();
            for _ in 0..500 {
                if wait > 0 {
                    wait -= 1;
                } else if let Some((target, color, delay)) = shots.next() {
                    let chain = &state.chains[0];
                    let aim = chain
                        .iter()
                        .nth(target % chain.len().max(1))
                        .map(|(_, b)| b.ball.pos);
                    if let Some(aim) = aim {
                        let vel = (aim - launcher).normalize_or_zero() * state.speeds.launch;
                        state.free_balls.push(FreeBall {
                            ball: Ball::new(launcher, PALETTE[color]),
                            vel,
                        });
                    }
                    wait = delay;
                }

                if tick(&mut state, &mut events).outcome.is_some() {
                    break;
                }

                let chain = &state.chains[0];
                if chain.inserting > 0 {
                    continue;
                }
                prop_assert!(chain.is_ordered());
                for (id, ball) in chain.iter() {
                    if let Some(next) = chain.balls.next(id) {
                        let gap = ball.ball.pos.distance(chain.balls[next].ball.pos);
                        prop_assert!(gap >= min_gap, "adjacent balls {gap} apart");
                    }
                }
            }
        }
    }
}

