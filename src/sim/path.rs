//! Immutable waypoint paths
//!
//! A path is built once per board and never mutated afterwards. Balls refer
//! to their next waypoint by [`NodeId`] and only ever move along it through
//! the path's own `next`/`previous` links.

use std::collections::HashMap;

use glam::Vec2;

use super::list::{Direction, List, NodeId};
use crate::consts::WAYPOINT_EPSILON;
use crate::step_toward;

/// One point along a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Stable identifier used for snapshot lookup
    pub id: u32,
    pub pos: Vec2,
    /// Arc length from the path start to this waypoint
    pub distance: f32,
}

/// Problems with raw waypoint input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("path has no waypoints")]
    Empty,
    #[error("duplicate waypoint id {0}")]
    DuplicateId(u32),
    #[error("zero-length segment ending at waypoint {0}")]
    ZeroLengthSegment(u32),
}

/// Outcome of one step along a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved,
    /// No waypoint left in the walking direction
    Exhausted,
}

/// Ordered waypoint sequence with O(1) lookup by waypoint id
#[derive(Debug, Clone)]
pub struct Path {
    nodes: List<Waypoint>,
    start: NodeId,
    end: NodeId,
    by_id: HashMap<u32, NodeId>,
}

impl Path {
    /// Build a path from `(id, point)` pairs in travel order
    pub fn new(waypoints: impl IntoIterator<Item = (u32, Vec2)>) -> Result<Self, PathError> {
        let mut nodes = List::new();
        let mut by_id = HashMap::new();
        let mut start = None;
        let mut end: Option<NodeId> = None;

        for (id, pos) in waypoints {
            if by_id.contains_key(&id) {
                return Err(PathError::DuplicateId(id));
            }
            let node = match end {
                None => nodes.insert_detached(Waypoint {
                    id,
                    pos,
                    distance: 0.0,
                }),
                Some(last) => {
                    let prev: Waypoint = nodes[last];
                    let segment = prev.pos.distance(pos);
                    if segment <= f32::EPSILON {
                        return Err(PathError::ZeroLengthSegment(id));
                    }
                    nodes.insert_after(
                        Waypoint {
                            id,
                            pos,
                            distance: prev.distance + segment,
                        },
                        last,
                    )
                }
            };
            by_id.insert(id, node);
            start.get_or_insert(node);
            end = Some(node);
        }

        match (start, end) {
            (Some(start), Some(end)) => Ok(Self {
                nodes,
                start,
                end,
                by_id,
            }),
            _ => Err(PathError::Empty),
        }
    }

    /// Build a path from bare points, numbering waypoints from zero
    pub fn from_points(points: &[Vec2]) -> Result<Self, PathError> {
        Self::new(points.iter().enumerate().map(|(i, p)| (i as u32, *p)))
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total arc length
    pub fn length(&self) -> f32 {
        self.nodes[self.end].distance
    }

    pub fn waypoint(&self, node: NodeId) -> &Waypoint {
        &self.nodes[node]
    }

    pub fn point(&self, node: NodeId) -> Vec2 {
        self.nodes[node].pos
    }

    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.next(node)
    }

    pub fn previous(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.prev(node)
    }

    /// Resolve a waypoint id back to its node
    pub fn find(&self, id: u32) -> Option<NodeId> {
        self.by_id.get(&id).copied()
    }

    /// Waypoints from start to end
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Waypoint)> {
        self.nodes.iter(Some(self.start), Direction::Forward)
    }

    /// Approximate arc length covered by a ball at `pos` heading for `next`.
    /// A ball with no next waypoint has finished the path.
    pub fn progress(&self, next: Option<NodeId>, pos: Vec2) -> f32 {
        match next {
            Some(node) => {
                let wp = self.waypoint(node);
                wp.distance - pos.distance(wp.pos)
            }
            None => self.length(),
        }
    }

    /// Move `pos` up to `step` toward `next`, switching to the following
    /// waypoint once within [`WAYPOINT_EPSILON`]. Reports `Exhausted` when
    /// the last waypoint has been reached; `next` is then `None`.
    pub fn advance(&self, pos: &mut Vec2, next: &mut Option<NodeId>, step: f32) -> Advance {
        let Some(target) = *next else {
            return Advance::Exhausted;
        };
        let target_pos = self.point(target);
        *pos = step_toward(*pos, target_pos, step);
        if pos.distance(target_pos) < WAYPOINT_EPSILON {
            *next = self.next(target);
            if next.is_none() {
                return Advance::Exhausted;
            }
        }
        Advance::Moved
    }

    /// Mirror of [`Path::advance`] toward the path start. `next` keeps
    /// meaning "the waypoint ahead", so it becomes each waypoint passed.
    pub fn retreat(&self, pos: &mut Vec2, next: &mut Option<NodeId>, step: f32) -> Advance {
        let Some(behind) = next.and_then(|node| self.previous(node)) else {
            return Advance::Exhausted;
        };
        let behind_pos = self.point(behind);
        *pos = step_toward(*pos, behind_pos, step);
        if pos.distance(behind_pos) < WAYPOINT_EPSILON {
            *next = Some(behind);
        }
        Advance::Moved
    }

    /// Point at arc length `distance` and the waypoint a ball there would
    /// head for next. Clamped to the path ends.
    pub fn locate(&self, distance: f32) -> (Vec2, NodeId) {
        let mut previous: Option<&Waypoint> = None;
        for (node, wp) in self.iter() {
            if wp.distance >= distance {
                let pos = match previous {
                    Some(prev) => {
                        let t = (distance - prev.distance) / (wp.distance - prev.distance);
                        prev.pos.lerp(wp.pos, t.clamp(0.0, 1.0))
                    }
                    None => wp.pos,
                };
                return (pos, node);
            }
            previous = Some(wp);
        }
        (self.point(self.end), self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> Path {
        Path::new([
            (10, Vec2::new(0.0, 0.0)),
            (11, Vec2::new(100.0, 0.0)),
            (12, Vec2::new(100.0, 50.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_find_by_id() {
        let path = straight();
        let node = path.find(11).unwrap();
        assert_eq!(path.point(node), Vec2::new(100.0, 0.0));
        assert_eq!(path.previous(node), Some(path.start()));
        assert_eq!(path.next(node), Some(path.end()));
        assert_eq!(path.find(99), None);
    }

    #[test]
    fn test_length_and_locate() {
        let path = straight();
        assert!((path.length() - 150.0).abs() < 1e-4);

        let (pos, next) = path.locate(30.0);
        assert!((pos - Vec2::new(30.0, 0.0)).length() < 1e-4);
        assert_eq!(path.waypoint(next).id, 11);

        let (pos, next) = path.locate(125.0);
        assert!((pos - Vec2::new(100.0, 25.0)).length() < 1e-4);
        assert_eq!(next, path.end());

        let (pos, _) = path.locate(-5.0);
        assert_eq!(pos, Vec2::ZERO);
    }

    #[test]
    fn test_progress_increases_along_path() {
        let path = straight();
        let a = path.progress(path.find(11), Vec2::new(20.0, 0.0));
        let b = path.progress(path.find(11), Vec2::new(80.0, 0.0));
        let c = path.progress(path.find(12), Vec2::new(100.0, 10.0));
        assert!(a < b && b < c);
        assert_eq!(path.progress(None, Vec2::ZERO), path.length());
    }

    #[test]
    fn test_advance_switches_waypoints() {
        let path = straight();
        let mut pos = Vec2::new(99.0, 0.0);
        let mut next = path.find(11);

        assert_eq!(path.advance(&mut pos, &mut next, 5.0), Advance::Moved);
        assert_eq!(pos, Vec2::new(100.0, 0.0));
        assert_eq!(next, path.find(12));

        assert_eq!(path.advance(&mut pos, &mut next, 5.0), Advance::Moved);
        assert!((pos - Vec2::new(100.0, 5.0)).length() < 1e-4);

        assert_eq!(path.advance(&mut pos, &mut next, 100.0), Advance::Exhausted);
        assert_eq!(pos, Vec2::new(100.0, 50.0));
        assert_eq!(next, None);
        assert_eq!(path.advance(&mut pos, &mut next, 1.0), Advance::Exhausted);
    }

    #[test]
    fn test_retreat_walks_back_to_start() {
        let path = straight();
        let mut pos = Vec2::new(100.0, 2.0);
        let mut next = path.find(12);

        assert_eq!(path.retreat(&mut pos, &mut next, 10.0), Advance::Moved);
        assert_eq!(pos, Vec2::new(100.0, 0.0));
        assert_eq!(next, path.find(11));

        assert_eq!(path.retreat(&mut pos, &mut next, 30.0), Advance::Moved);
        assert!((pos - Vec2::new(70.0, 0.0)).length() < 1e-4);

        assert_eq!(path.retreat(&mut pos, &mut next, 100.0), Advance::Moved);
        assert_eq!(next, Some(path.start()));
        assert_eq!(path.retreat(&mut pos, &mut next, 1.0), Advance::Exhausted);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(Path::new(Vec::<(u32, Vec2)>::new()).unwrap_err(), PathError::Empty);
        assert_eq!(
            Path::new([(1, Vec2::ZERO), (1, Vec2::ONE)]).unwrap_err(),
            PathError::DuplicateId(1)
        );
        assert_eq!(
            Path::new([(1, Vec2::ZERO), (2, Vec2::ZERO)]).unwrap_err(),
            PathError::ZeroLengthSegment(2)
        );
    }
}
