//! Per-tick movement
//!
//! Free balls fly straight. A chain either settles its merging balls, sits
//! out a post-match pause, or is driven forward by its foot, which pushes
//! every overlapping ball ahead of it along the path.

use glam::Vec2;

use super::chain::{Chain, ChainedBall};
use super::events::{EventSink, GameEvent, Outcome};
use super::list::{Cursor, Direction, NodeId};
use super::path::Advance;
use super::state::GameState;
use crate::consts::{MAX_PUSH_STEPS, MAX_WALK_STEPS, PUSH_STEP};
use crate::{balls_collide, step_toward};

/// Result of a movement step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementReport {
    /// Some ball ran off the end of its path this step
    pub reached_end: bool,
}

/// Advance every free ball and chain by one tick.
///
/// A ball reaching the end of its path is removed and the board is marked
/// lost (emitting `BoardOver` the first time).
pub fn step_movement(state: &mut GameState, sink: &mut impl EventSink) -> MovementReport {
    move_free_balls(state);

    let radius = state.ball_radius;
    let speeds = state.speeds;
    let mut report = MovementReport::default();

    for chain in &mut state.chains {
        if chain.is_empty() {
            continue;
        }
        let reached_end = if chain.inserting > 0 {
            settle_insertions(chain, radius, speeds.insertion)
        } else if let Some(remaining) = chain.pause_steps_after_match {
            let left = remaining.saturating_sub(1);
            chain.pause_steps_after_match = (left > 0).then_some(left);
            false
        } else {
            drive(chain, radius, speeds.chain)
        };
        report.reached_end |= reached_end;
    }

    if report.reached_end && state.outcome.is_none() {
        log::warn!("A ball reached the end of its path at tick {}", state.time_ticks);
        state.outcome = Some(Outcome::Lost);
        sink.emit(GameEvent::BoardOver {
            outcome: Outcome::Lost,
        });
    }
    report
}

fn move_free_balls(state: &mut GameState) {
    for free in &mut state.free_balls {
        free.ball.pos += free.vel;
    }
    let bounds = state.bounds;
    let radius = state.ball_radius;
    state
        .free_balls
        .retain(|free| bounds.touches(free.ball.pos, radius));
}

/// Move the foot along the path, then let it push the rest of the chain
fn drive(chain: &mut Chain, radius: f32, speed: f32) -> bool {
    let Some(foot) = chain.foot else {
        return false;
    };
    let mut reached_end = false;
    let ball = &mut chain.balls[foot];
    if chain.path.advance(&mut ball.ball.pos, &mut ball.waypoint, speed) == Advance::Exhausted {
        chain.detach(foot);
        reached_end = true;
    }
    if let Some(foot) = chain.foot {
        reached_end |= push_ahead(chain, foot, radius);
    }
    reached_end
}

/// Step every merging ball toward its settle point, head to foot, then make
/// room along the whole chain
fn settle_insertions(chain: &mut Chain, radius: f32, speed: f32) -> bool {
    let mut cursor = Cursor::new(chain.head, Direction::Forward);
    while let Some((id, _)) = cursor.advance(&chain.balls) {
        if chain.balls[id].is_inserting() && step_insertion(&mut chain.balls[id], speed) {
            chain.finish_insertion(id);
        }
    }
    match chain.foot {
        Some(foot) => push_ahead(chain, foot, radius),
        None => false,
    }
}

/// Slide a merging ball one step toward its settle point. Returns true once
/// it has arrived (snapped exactly onto the target).
///
/// # Panics
/// If the ball has no insertion target.
pub fn step_insertion(ball: &mut ChainedBall, speed: f32) -> bool {
    let Some(target) = ball.insertion else {
        panic!("insertion step on a ball with no insertion target");
    };
    let before = ball.ball.pos.distance(target);
    let mut pos = step_toward(ball.ball.pos, target, speed);
    if pos.distance(target) > before {
        pos = target;
    }
    ball.ball.pos = pos;
    if pos.distance(target) < speed * 0.5 {
        ball.ball.pos = target;
        return true;
    }
    false
}

/// Where a ball is headed: its settle point while merging, else where it is
fn anchor_of(ball: &ChainedBall) -> Vec2 {
    ball.insertion.unwrap_or(ball.ball.pos)
}

/// Starting at `from`, walk toward the head so every ball ends up clear of,
/// and no further back along the path than, the ball behind it.
///
/// A settled ball is pushed forward along its own waypoints. A merging ball
/// is left where it is and its settle point moves forward instead. A settled
/// ball ahead of a ball that is still merging only has to clear where that
/// ball is right now. Balls pushed off the end of the path are removed;
/// returns true if any were.
///
/// # Panics
/// If pushing takes more than [`MAX_PUSH_STEPS`] unit steps.
fn push_ahead(chain: &mut Chain, from: NodeId, radius: f32) -> bool {
    let mut reached_end = false;
    let mut steps = 0u32;
    let mut behind = Some(from);

    while let Some(pusher) = behind {
        let (pusher_pos, pusher_anchor, pusher_progress, merging) = {
            let ball = &chain.balls[pusher];
            let anchor = anchor_of(ball);
            (
                ball.ball.pos,
                anchor,
                chain.path.progress(ball.waypoint, anchor),
                ball.is_inserting(),
            )
        };

        while let Some(ahead) = chain.balls.prev(pusher) {
            if chain.balls[ahead].is_inserting() {
                clear_settle_point(chain, ahead, pusher_anchor, pusher_progress, radius);
                break;
            }

            let ball = &chain.balls[ahead];
            let blocked = if merging {
                balls_collide(ball.ball.pos, pusher_pos, radius)
            } else {
                balls_collide(ball.ball.pos, pusher_pos, radius)
                    || chain.path.progress(ball.waypoint, ball.ball.pos) < pusher_progress
            };
            if !blocked {
                break;
            }

            steps += 1;
            if steps > MAX_PUSH_STEPS {
                panic!("chain push did not clear after {MAX_PUSH_STEPS} steps");
            }
            let ball = &mut chain.balls[ahead];
            if chain.path.advance(&mut ball.ball.pos, &mut ball.waypoint, PUSH_STEP)
                == Advance::Exhausted
            {
                chain.detach(ahead);
                reached_end = true;
            }
        }
        behind = chain.balls.prev(pusher);
    }
    reached_end
}

/// Move a merging ball's settle point forward along the path until it sits
/// clear of `anchor` and at least `anchor_progress` along. Stops at the path
/// end.
///
/// # Panics
/// If the walk takes more than [`MAX_WALK_STEPS`] steps.
fn clear_settle_point(
    chain: &mut Chain,
    id: NodeId,
    anchor: Vec2,
    anchor_progress: f32,
    radius: f32,
) {
    let path = &chain.path;
    let ChainedBall {
        insertion, waypoint, ..
    } = &mut chain.balls[id];
    let Some(target) = insertion.as_mut() else {
        return;
    };
    for _ in 0..MAX_WALK_STEPS {
        if !balls_collide(*target, anchor, radius)
            && path.progress(*waypoint, *target) >= anchor_progress
        {
            return;
        }
        if path.advance(target, waypoint, PUSH_STEP) == Advance::Exhausted {
            return;
        }
    }
    panic!("settle point behind {anchor} did not clear after {MAX_WALK_STEPS} steps");
}
