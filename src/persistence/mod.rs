//! Snapshot/restore of simulation state
//!
//! Paths are stored as ordered `{id, x, y}` arrays. Chained balls refer to
//! their next waypoint by id, which is re-resolved against the rebuilt path
//! on restore.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::{Bounds, SpeedOptions};
use crate::sim::{Ball, Chain, ChainedBall, Effect, FreeBall, GameState, Outcome, Path, PathError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

pub type PathSnapshot = Vec<WaypointSnapshot>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub ball: Ball,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion_position: Option<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Index into [`GameSnapshot::paths`]
    pub path: usize,
    pub inserting: u32,
    pub pause_steps_after_match: Option<u32>,
    /// Head to foot
    pub balls: Vec<BallSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub ball_radius: f32,
    pub speeds: SpeedOptions,
    pub bounds: Bounds,
    pub match_cooldown_ticks: u32,
    pub time_ticks: u64,
    pub outcome: Option<Outcome>,
    pub paths: Vec<PathSnapshot>,
    pub chains: Vec<ChainSnapshot>,
    pub free_balls: Vec<FreeBall>,
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("path {index}: {source}")]
    Path {
        index: usize,
        #[source]
        source: PathError,
    },
    #[error("chain {chain} refers to missing path {path}")]
    UnknownPath { chain: usize, path: usize },
    #[error("chain {chain} refers to unknown waypoint {id}")]
    UnknownWaypoint { chain: usize, id: u32 },
    #[error("chain {chain} declares {declared} inserting balls but has {actual}")]
    InsertingMismatch {
        chain: usize,
        declared: u32,
        actual: u32,
    },
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let paths = state.paths();
        let chains = state
            .chains
            .iter()
            .map(|chain| {
                let path = paths
                    .iter()
                    .position(|p| Arc::ptr_eq(p, &chain.path))
                    .unwrap_or_default();
                ChainSnapshot {
                    path,
                    inserting: chain.inserting,
                    pause_steps_after_match: chain.pause_steps_after_match,
                    balls: chain
                        .iter()
                        .map(|(_, chained)| BallSnapshot {
                            ball: chained.ball,
                            effect: chained.effect,
                            waypoint_id: chained.waypoint.map(|wp| chain.path.waypoint(wp).id),
                            insertion_position: chained.insertion,
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            ball_radius: state.ball_radius,
            speeds: state.speeds,
            bounds: state.bounds,
            match_cooldown_ticks: state.match_cooldown_ticks,
            time_ticks: state.time_ticks,
            outcome: state.outcome,
            paths: paths.iter().map(|path| snapshot_path(path)).collect(),
            chains,
            free_balls: state.free_balls.clone(),
        }
    }

    pub fn restore(&self) -> Result<GameState, RestoreError> {
        let paths = self
            .paths
            .iter()
            .enumerate()
            .map(|(index, waypoints)| {
                Path::new(waypoints.iter().map(|w| (w.id, Vec2::new(w.x, w.y))))
                    .map(Arc::new)
                    .map_err(|source| RestoreError::Path { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut chains = Vec::with_capacity(self.chains.len());
        for (index, snapshot) in self.chains.iter().enumerate() {
            let Some(path) = paths.get(snapshot.path) else {
                return Err(RestoreError::UnknownPath {
                    chain: index,
                    path: snapshot.path,
                });
            };
            let mut chain = Chain::new(Arc::clone(path));
            for ball in &snapshot.balls {
                let waypoint = match ball.waypoint_id {
                    Some(id) => Some(
                        path.find(id)
                            .ok_or(RestoreError::UnknownWaypoint { chain: index, id })?,
                    ),
                    None => None,
                };
                let mut chained = ChainedBall::new(ball.ball, waypoint).with_effect(ball.effect);
                chained.insertion = ball.insertion_position;
                chain.push_foot(chained);
            }
            if chain.inserting != snapshot.inserting {
                return Err(RestoreError::InsertingMismatch {
                    chain: index,
                    declared: snapshot.inserting,
                    actual: chain.inserting,
                });
            }
            chain.pause_steps_after_match = snapshot.pause_steps_after_match;
            chains.push(chain);
        }

        Ok(GameState {
            ball_radius: self.ball_radius,
            chains,
            free_balls: self.free_balls.clone(),
            speeds: self.speeds,
            bounds: self.bounds,
            match_cooldown_ticks: self.match_cooldown_ticks,
            time_ticks: self.time_ticks,
            outcome: self.outcome,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, RestoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn snapshot_path(path: &Path) -> PathSnapshot {
    path.iter()
        .map(|(_, wp)| WaypointSnapshot {
            id: wp.id,
            x: wp.pos.x,
            y: wp.pos.y,
        })
        .collect()
}
