//! Match resolution
//!
//! Runs of three or more same-colored balls that sit right next to each
//! other are cut out of the chain.

use glam::Vec2;

use super::chain::{Chain, Color};
use super::events::{EventSink, GameEvent};
use super::list::{Cursor, Direction, NodeId};
use super::state::GameState;
use crate::consts::{MATCH_SLACK, MIN_MATCH_RUN};

/// Result of a match check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub matches: bool,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    first: NodeId,
    last: NodeId,
    len: usize,
}

/// Remove the first qualifying run (head to foot) from chain `chain_index`.
///
/// Does nothing while the chain still has balls settling in. A removed run
/// arms the chain's post-match pause and emits `BallsMatched`, then one
/// `EffectTriggered` per effect ball in head-to-foot order.
///
/// A run that reaches all the way to the foot is not picked up; only runs
/// broken by a following ball count.
pub fn resolve_matches(
    state: &mut GameState,
    chain_index: usize,
    sink: &mut impl EventSink,
) -> MatchReport {
    let threshold = 2.0 * state.ball_radius + MATCH_SLACK;
    let cooldown = state.match_cooldown_ticks;
    let chain = &mut state.chains[chain_index];

    if chain.inserting > 0 {
        return MatchReport::default();
    }
    let Some(run) = find_run(chain, threshold) else {
        return MatchReport::default();
    };

    let removed = chain.detach_run(run.first, run.last);
    chain.pause_steps_after_match = Some(cooldown);

    let color = removed[0].ball.color;
    log::debug!(
        "Chain {}: matched {} {:?} balls, {} left",
        chain_index,
        run.len,
        color,
        chain.len()
    );
    sink.emit(GameEvent::BallsMatched {
        chain: chain_index,
        color,
        count: removed.len(),
    });
    for effect in removed.iter().filter_map(|ball| ball.effect) {
        sink.emit(GameEvent::EffectTriggered {
            chain: chain_index,
            effect,
        });
    }

    MatchReport { matches: true }
}

fn find_run(chain: &Chain, threshold: f32) -> Option<Run> {
    let mut cursor = Cursor::new(chain.head, Direction::Forward);
    let (first, _) = cursor.advance(&chain.balls)?;
    let mut run = Run {
        first,
        last: first,
        len: 1,
    };

    while let Some((id, _)) = cursor.advance(&chain.balls) {
        let (last_pos, last_color) = ball_of(chain, run.last);
        let (pos, color) = ball_of(chain, id);
        if color == last_color && last_pos.distance(pos) <= threshold {
            run.last = id;
            run.len += 1;
            continue;
        }
        if run.len >= MIN_MATCH_RUN {
            return Some(run);
        }
        run = Run {
            first: id,
            last: id,
            len: 1,
        };
    }
    None
}

fn ball_of(chain: &Chain, id: NodeId) -> (Vec2, Color) {
    let ball = &chain.balls[id].ball;
    (ball.pos, ball.color)
}
