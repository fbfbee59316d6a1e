//! Free ball vs chain collisions
//!
//! A launched ball that touches a chain ball is absorbed: it is backed off
//! until it just touches, spliced into the chain on the side it hit, and
//! given a settle point along the path that the movement engine then walks
//! it to.

use glam::Vec2;

use super::chain::{ChainedBall, FreeBall};
use super::events::{EventSink, GameEvent};
use super::list::{Direction, NodeId};
use super::path::{Advance, Path};
use super::state::GameState;
use crate::balls_collide;
use crate::consts::{MAX_BACKOFF_STEPS, MAX_COLLISION_PASSES, MAX_WALK_STEPS, PUSH_STEP};

/// Result of a collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// At least one free ball was absorbed
    pub has_collision: bool,
}

/// A free ball overlapping a chain ball
#[derive(Debug, Clone, Copy)]
struct Hit {
    free: usize,
    chain: usize,
    struck: NodeId,
}

/// Absorb every free ball that overlaps a chain ball.
///
/// Scans until a full pass finds nothing. Each pass makes at most one
/// structural change, so indices found by the scan stay valid.
///
/// # Panics
/// If the scan does not settle within [`MAX_COLLISION_PASSES`], or a backoff
/// or settle-point walk exceeds its cap.
pub fn resolve_collisions(state: &mut GameState, sink: &mut impl EventSink) -> CollisionReport {
    let mut report = CollisionReport::default();
    if state.free_balls.is_empty() || state.chains.is_empty() {
        return report;
    }

    let mut passes = 0;
    while let Some(hit) = find_collision(state) {
        passes += 1;
        if passes > MAX_COLLISION_PASSES {
            panic!("collision resolution did not settle after {MAX_COLLISION_PASSES} passes");
        }
        absorb(state, hit, sink);
        report.has_collision = true;
    }
    report
}

/// First free ball (in launch order) that overlaps any chain ball, paired
/// with the nearest ball it overlaps. Ties go to the earlier chain, then to
/// the ball closer to the head.
fn find_collision(state: &GameState) -> Option<Hit> {
    let radius = state.ball_radius;
    for (free_idx, free) in state.free_balls.iter().enumerate() {
        let mut best: Option<(f32, usize, NodeId)> = None;
        for (chain_idx, chain) in state.chains.iter().enumerate() {
            for (id, chained) in chain.iter() {
                if !balls_collide(free.ball.pos, chained.ball.pos, radius) {
                    continue;
                }
                let dist = free.ball.pos.distance(chained.ball.pos);
                if best.is_none_or(|(best_dist, _, _)| dist < best_dist) {
                    best = Some((dist, chain_idx, id));
                }
            }
        }
        if let Some((_, chain, struck)) = best {
            return Some(Hit {
                free: free_idx,
                chain,
                struck,
            });
        }
    }
    None
}

fn absorb(state: &mut GameState, hit: Hit, sink: &mut impl EventSink) {
    let radius = state.ball_radius;
    let mut free = state.free_balls.remove(hit.free);
    let origin = free.ball.pos;

    let chain = &mut state.chains[hit.chain];
    let struck = chain.balls[hit.struck].clone();

    back_off(&mut free, struck.ball.pos, radius);

    let sole = chain.head == Some(hit.struck) && chain.foot == Some(hit.struck);
    let before = if sole {
        forward_is_nearer(&chain.path, &struck, origin)
    } else {
        should_insert_before(free.ball.pos, &struck, &chain.path)
    };

    // The new ball heads for where the struck ball sits on the path, which
    // for a ball still merging is its own settle point
    let anchor = struck.insertion.unwrap_or(struck.ball.pos);
    let mut incoming = ChainedBall::new(free.ball, struck.waypoint);
    incoming.insertion = Some(anchor);
    let id = if before {
        chain.insert_before(incoming, hit.struck)
    } else {
        chain.insert_after(incoming, hit.struck)
    };

    // Only a ball landing ahead of the struck one, or behind the foot, needs
    // its settle point moved clear of it
    let walk = if before {
        Some(Direction::Forward)
    } else if chain.foot == Some(id) {
        Some(Direction::Backward)
    } else {
        None
    };
    if let Some(direction) = walk {
        let (target, waypoint) =
            walk_clear(&chain.path, anchor, struck.waypoint, direction, radius);
        let ball = &mut chain.balls[id];
        ball.insertion = Some(target);
        ball.waypoint = waypoint;
    }

    log::debug!(
        "{:?} ball absorbed into chain {} ({} struck ball)",
        free.ball.color,
        hit.chain,
        if before { "ahead of" } else { "behind" }
    );
    sink.emit(GameEvent::BallCollision { chain: hit.chain });
}

/// Step the free ball back along its velocity until it only just clears
/// the struck ball
fn back_off(free: &mut FreeBall, struck: Vec2, radius: f32) {
    let back = -free.vel.normalize_or_zero();
    for _ in 0..MAX_BACKOFF_STEPS {
        if !balls_collide(free.ball.pos, struck, radius) {
            return;
        }
        free.ball.pos += back;
    }
    panic!(
        "free ball at {} still overlaps chain ball at {} after {MAX_BACKOFF_STEPS} backoff steps",
        free.ball.pos, struck
    );
}

/// Decide which side of `struck` a ball touching it at `free_pos` joins.
///
/// The contact point is projected onto the struck ball's heading; contact
/// ahead of its motion means the new ball goes before it (toward the head).
pub fn should_insert_before(free_pos: Vec2, struck: &ChainedBall, path: &Path) -> bool {
    let Some(waypoint) = struck.waypoint else {
        return false;
    };
    let heading = (path.point(waypoint) - struck.ball.pos).normalize_or_zero();
    let contact = (free_pos + struck.ball.pos) * 0.5;
    (contact - struck.ball.pos).dot(heading) > 0.0
}

/// For a lone struck ball: is its next waypoint closer to `origin` than the
/// one behind it?
fn forward_is_nearer(path: &Path, struck: &ChainedBall, origin: Vec2) -> bool {
    let Some(ahead) = struck.waypoint else {
        return false;
    };
    match path.previous(ahead) {
        Some(behind) => {
            origin.distance(path.point(ahead)) <= origin.distance(path.point(behind))
        }
        None => true,
    }
}

/// Walk from `from` along the path until clear of a ball sitting at `from`.
/// Stops early at either end of the path.
fn walk_clear(
    path: &Path,
    from: Vec2,
    waypoint: Option<NodeId>,
    direction: Direction,
    radius: f32,
) -> (Vec2, Option<NodeId>) {
    let mut pos = from;
    let mut next = waypoint;
    for _ in 0..MAX_WALK_STEPS {
        if !balls_collide(pos, from, radius) {
            return (pos, next);
        }
        let last = next;
        let step = match direction {
            Direction::Forward => path.advance(&mut pos, &mut next, PUSH_STEP),
            Direction::Backward => path.retreat(&mut pos, &mut next, PUSH_STEP),
        };
        if step == Advance::Exhausted {
            return (pos, next.or(last));
        }
    }
    panic!("settle point walk from {from} did not clear after {MAX_WALK_STEPS} steps");
}
