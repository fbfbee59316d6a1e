//! Balls and the chains they form
//!
//! A chain is ordered head to foot along `next` links. The head is the ball
//! furthest along the path; the foot trails behind and drives the whole chain
//! forward by pushing.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::list::{Direction, List, NodeId};
use super::path::Path;

/// Ball colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    White,
}

/// Special effect carried by a chained ball, fired when it gets matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Clears nearby balls
    Bomb,
    /// Slows the chain down for a while
    Slow,
    /// Pulls the chain backwards for a while
    Reverse,
    /// Shows an aiming guide
    Accuracy,
}

/// A ball entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub color: Color,
}

impl Ball {
    pub fn new(pos: Vec2, color: Color) -> Self {
        Self { pos, color }
    }
}

/// A launched ball that is not part of any chain yet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeBall {
    pub ball: Ball,
    /// Displacement per tick
    pub vel: Vec2,
}

/// A ball that belongs to a chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainedBall {
    pub ball: Ball,
    /// Next waypoint this ball walks toward; `None` once past the last one
    pub waypoint: Option<NodeId>,
    /// Settle point while the ball is being merged into the chain
    pub insertion: Option<Vec2>,
    pub effect: Option<Effect>,
}

impl ChainedBall {
    pub fn new(ball: Ball, waypoint: Option<NodeId>) -> Self {
        Self {
            ball,
            waypoint,
            insertion: None,
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: Option<Effect>) -> Self {
        self.effect = effect;
        self
    }

    pub fn is_inserting(&self) -> bool {
        self.insertion.is_some()
    }
}

/// An ordered run of balls following one path
#[derive(Debug, Clone)]
pub struct Chain {
    pub path: Arc<Path>,
    pub balls: List<ChainedBall>,
    pub head: Option<NodeId>,
    pub foot: Option<NodeId>,
    /// Number of balls currently settling into the chain
    pub inserting: u32,
    /// Remaining ticks of the post-match stand-still
    pub pause_steps_after_match: Option<u32>,
}

impl Chain {
    /// An empty chain bound to `path`
    pub fn new(path: Arc<Path>) -> Self {
        Self {
            path,
            balls: List::new(),
            head: None,
            foot: None,
            inserting: 0,
            pause_steps_after_match: None,
        }
    }

    /// Lay `balls` out back-to-back from the path start. The first entry
    /// ends up at the head (furthest along), the last one at the foot.
    pub fn seeded(
        path: Arc<Path>,
        balls: impl IntoIterator<Item = (Color, Option<Effect>)>,
        spacing: f32,
    ) -> Self {
        let balls: Vec<_> = balls.into_iter().collect();
        let mut chain = Self::new(path);
        let count = balls.len();
        for (i, (color, effect)) in balls.into_iter().enumerate() {
            let distance = (count - 1 - i) as f32 * spacing;
            let (pos, waypoint) = chain.path.locate(distance);
            chain.push_foot(
                ChainedBall::new(Ball::new(pos, color), Some(waypoint)).with_effect(effect),
            );
        }
        chain
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    /// Balls from head to foot
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ChainedBall)> {
        self.balls.iter(self.head, Direction::Forward)
    }

    /// Append behind the current foot
    pub fn push_foot(&mut self, ball: ChainedBall) -> NodeId {
        match self.foot {
            Some(foot) => self.insert_after(ball, foot),
            None => {
                if ball.is_inserting() {
                    self.inserting += 1;
                }
                let id = self.balls.insert_detached(ball);
                self.head = Some(id);
                self.foot = Some(id);
                id
            }
        }
    }

    /// Splice a ball in on the head side of `at`
    pub fn insert_before(&mut self, ball: ChainedBall, at: NodeId) -> NodeId {
        if ball.is_inserting() {
            self.inserting += 1;
        }
        let id = self.balls.insert_before(ball, at);
        if self.head == Some(at) {
            self.head = Some(id);
        }
        id
    }

    /// Splice a ball in on the foot side of `at`
    pub fn insert_after(&mut self, ball: ChainedBall, at: NodeId) -> NodeId {
        if ball.is_inserting() {
            self.inserting += 1;
        }
        let id = self.balls.insert_after(ball, at);
        if self.foot == Some(at) {
            self.foot = Some(id);
        }
        id
    }

    /// Remove a single ball, keeping head/foot and the inserting count valid
    pub fn detach(&mut self, id: NodeId) -> ChainedBall {
        let prev = self.balls.prev(id);
        let next = self.balls.next(id);
        let ball = self.balls.remove(id);
        if self.head == Some(id) {
            self.head = next;
        }
        if self.foot == Some(id) {
            self.foot = prev;
        }
        if ball.is_inserting() {
            self.inserting = self.inserting.saturating_sub(1);
        }
        ball
    }

    /// Remove the inclusive run `first..=last`, head side to foot side
    pub fn detach_run(&mut self, first: NodeId, last: NodeId) -> Vec<ChainedBall> {
        let before = self.balls.prev(first);
        let after = self.balls.next(last);
        let removed = self.balls.unlink_run(first, last);
        if self.head == Some(first) {
            self.head = after;
        }
        if self.foot == Some(last) {
            self.foot = before;
        }
        let settling = removed.iter().filter(|b| b.is_inserting()).count() as u32;
        self.inserting = self.inserting.saturating_sub(settling);
        removed
    }

    /// Mark a merging ball as settled
    ///
    /// # Panics
    /// If the ball has no insertion target or the counter is already zero.
    pub fn finish_insertion(&mut self, id: NodeId) {
        let ball = &mut self.balls[id];
        if ball.insertion.take().is_none() {
            panic!("finish_insertion on a ball that is not inserting");
        }
        self.inserting = match self.inserting.checked_sub(1) {
            Some(count) => count,
            None => panic!("chain inserting counter underflow"),
        };
    }

    /// Path progress of a ball
    pub fn progress(&self, id: NodeId) -> f32 {
        let ball = &self.balls[id];
        self.path.progress(ball.waypoint, ball.ball.pos)
    }

    /// True when path progress never increases from head to foot
    pub fn is_ordered(&self) -> bool {
        let progress: Vec<f32> = self.iter().map(|(id, _)| self.progress(id)).collect();
        progress.windows(2).all(|w| w[0] + 1e-3 >= w[1])
    }
}
