//! What happens when a mover lands on an occupied cell.

use serde::Serialize;

use crate::grid::{Entity, Grid};
use crate::types::{EntityClass, EntityId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Consume {
        consumer: EntityId,
        pellet: EntityId,
        points: u32,
    },
    Kill {
        victim: EntityId,
        killer: EntityId,
    },
}

/// Pure mapping from a (mover, occupant) pair to at most one effect.
pub trait CollisionPolicy: Send {
    fn collide(&self, mover: &Entity, occupant: &Entity) -> Option<Effect>;
}

/// Players eat pellets and die to ghosts, whoever moved.
#[derive(Clone, Copy, Debug)]
pub struct PlayerCollisions {
    pub pellet_points: u32,
}

impl CollisionPolicy for PlayerCollisions {
    fn collide(&self, mover: &Entity, occupant: &Entity) -> Option<Effect> {
        match (mover.kind.class(), occupant.kind.class()) {
            (EntityClass::Player, EntityClass::Ghost) => Some(Effect::Kill {
                victim: mover.id,
                killer: occupant.id,
            }),
            (EntityClass::Ghost, EntityClass::Player) => Some(Effect::Kill {
                victim: occupant.id,
                killer: mover.id,
            }),
            (EntityClass::Player, EntityClass::Pellet) => Some(Effect::Consume {
                consumer: mover.id,
                pellet: occupant.id,
                points: self.pellet_points,
            }),
            _ => None,
        }
    }
}

/// Runs the policy against each earlier occupant, in occupant order.
pub fn resolve(
    policy: &dyn CollisionPolicy,
    grid: &Grid,
    mover: EntityId,
    occupants: &[EntityId],
) -> Vec<Effect> {
    let Ok(mover) = grid.entity(mover) else {
        return Vec::new();
    };
    occupants
        .iter()
        .filter(|id| **id != mover.id)
        .filter_map(|id| grid.entity(*id).ok())
        .filter_map(|occupant| policy.collide(mover, occupant))
        .collect()
}
