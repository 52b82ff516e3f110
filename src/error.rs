use thiserror::Error;

use crate::types::{Coord, EntityId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("coordinate ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Coord),
    #[error("entity {0:?} is already placed; remove it first")]
    InvalidPlacement(EntityId),
    #[error("entity {0:?} is not placed on any cell")]
    NotPlaced(EntityId),
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: i32, height: i32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("entity {0:?} is not a ghost")]
    NotAGhost(EntityId),
    #[error("entity {0:?} is not a player")]
    NotAPlayer(EntityId),
    #[error("level needs at least one start cell")]
    NoStartCells,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("level driver has shut down")]
    Closed,
    #[error(transparent)]
    Level(#[from] LevelError),
}
