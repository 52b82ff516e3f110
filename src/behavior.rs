//! Ghost target selection.
//!
//! Every ghost is the same [`Agent`] shape; only its [`TargetStrategy`]
//! differs. The strategy picks a target cell, then the shared step walks one
//! cell along the shortest passable route toward it.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::grid::Grid;
use crate::navigation::{
    cell_ahead, find_nearest_matching, nearest_passable, path_length, shortest_path,
};
use crate::types::{Coord, Direction, EntityId, EntityKind, GhostKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetStrategy {
    /// Head straight for the player.
    DirectPursuit,
    /// Aim `ahead` cells in front of the player.
    Ambush { ahead: u32 },
    /// Reflect the `reference` ghost through a pivot `ahead` cells in front
    /// of the player.
    Flank { reference: GhostKind, ahead: u32 },
    /// Chase while farther than `threshold` steps, otherwise retreat to the
    /// bottom-left corner.
    ShyPursuit { threshold: u32 },
}

impl TargetStrategy {
    pub fn for_kind(kind: GhostKind, config: &EngineConfig) -> Self {
        match kind {
            GhostKind::Blinky => Self::DirectPursuit,
            GhostKind::Pinky => Self::Ambush {
                ahead: config.ambush_distance,
            },
            GhostKind::Inky => Self::Flank {
                reference: GhostKind::Blinky,
                ahead: config.flank_distance,
            },
            GhostKind::Clyde => Self::ShyPursuit {
                threshold: config.shy_distance,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub entity: EntityId,
    pub kind: GhostKind,
    pub strategy: TargetStrategy,
}

impl Agent {
    pub fn new(entity: EntityId, kind: GhostKind, config: &EngineConfig) -> Self {
        Self {
            entity,
            kind,
            strategy: TargetStrategy::for_kind(kind, config),
        }
    }

    /// Cell this agent wants to reach, or `None` when there is nobody to
    /// hunt.
    pub fn target(&self, grid: &Grid, prey: &[EntityId]) -> Option<Coord> {
        let own = grid.position(self.entity)?;
        let victim = find_nearest_matching(grid, own, |id| prey.contains(&id))
            .or_else(|| prey.iter().copied().find(|id| grid.position(*id).is_some()))?;
        let victim_at = grid.position(victim)?;
        let facing = grid.entity(victim).ok()?.facing;

        let target = match self.strategy {
            TargetStrategy::DirectPursuit => victim_at,
            TargetStrategy::Ambush { ahead } => cell_ahead(grid, victim_at, facing, ahead),
            TargetStrategy::Flank { reference, ahead } => {
                match grid
                    .find_entity(EntityKind::Ghost(reference))
                    .and_then(|id| grid.position(id))
                {
                    Some(partner) => {
                        let pivot = cell_ahead(grid, victim_at, facing, ahead);
                        let reflected =
                            Coord::new(2 * pivot.x - partner.x, 2 * pivot.y - partner.y);
                        nearest_passable(grid, reflected).unwrap_or(victim_at)
                    }
                    None => victim_at,
                }
            }
            TargetStrategy::ShyPursuit { threshold } => {
                match path_length(grid, own, victim_at, Some(self.entity)) {
                    Some(steps) if steps <= threshold as usize => {
                        let corner = Coord::new(0, grid.height() - 1);
                        nearest_passable(grid, corner).unwrap_or(own)
                    }
                    _ => victim_at,
                }
            }
        };
        Some(target)
    }

    /// First step toward the target, or `None` to stay put this tick.
    pub fn next_direction(&self, grid: &Grid, prey: &[EntityId]) -> Option<Direction> {
        let own = grid.position(self.entity)?;
        let target = self.target(grid, prey)?;
        let path = shortest_path(grid, own, target, Some(self.entity))?;
        path.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::board;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn place_player(grid: &mut Grid, at: Coord, facing: Direction) -> EntityId {
        let id = grid.spawn(EntityKind::Player, at).expect("player in range");
        grid.set_facing(id, facing).expect("player exists");
        id
    }

    #[test]
    fn default_strategies_follow_ghost_kind() {
        let config = config();
        assert_eq!(
            TargetStrategy::for_kind(GhostKind::Blinky, &config),
            TargetStrategy::DirectPursuit
        );
        assert_eq!(
            TargetStrategy::for_kind(GhostKind::Pinky, &config),
            TargetStrategy::Ambush { ahead: 4 }
        );
        assert_eq!(
            TargetStrategy::for_kind(GhostKind::Inky, &config),
            TargetStrategy::Flank {
                reference: GhostKind::Blinky,
                ahead: 2
            }
        );
        assert_eq!(
            TargetStrategy::for_kind(GhostKind::Clyde, &config),
            TargetStrategy::ShyPursuit { threshold: 8 }
        );
    }

    #[test]
    fn direct_pursuit_targets_player_cell() {
        let mut b = board(&["#######", "#B    #", "#######"]);
        let player = place_player(&mut b.grid, Coord::new(5, 1), Direction::West);
        let agent = Agent::new(b.ghosts[0], GhostKind::Blinky, &config());
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(5, 1)));
        assert_eq!(agent.next_direction(&b.grid, &[player]), Some(Direction::East));
    }

    #[test]
    fn ambush_targets_cells_ahead_of_player() {
        let mut b = board(&[
            "#########",
            "#K      #",
            "#       #",
            "#########",
        ]);
        let player = place_player(&mut b.grid, Coord::new(2, 2), Direction::East);
        let agent = Agent::new(b.ghosts[0], GhostKind::Pinky, &config());
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(6, 2)));
    }

    #[test]
    fn ambush_target_stops_at_wall() {
        let mut b = board(&["#######", "#K    #", "#######"]);
        let player = place_player(&mut b.grid, Coord::new(4, 1), Direction::East);
        let agent = Agent::new(b.ghosts[0], GhostKind::Pinky, &config());
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(5, 1)));
    }

    #[test]
    fn flank_reflects_reference_ghost_through_pivot() {
        let mut b = board(&[
            "###########",
            "#B        #",
            "#         #",
            "#        I#",
            "###########",
        ]);
        let player = place_player(&mut b.grid, Coord::new(3, 1), Direction::East);
        let inky = b.ghosts[1];
        let agent = Agent::new(inky, GhostKind::Inky, &config());
        // Pivot (5,1), Blinky (1,1): reflection lands on (9,1).
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(9, 1)));
    }

    #[test]
    fn flank_without_reference_falls_back_to_pursuit() {
        let mut b = board(&["#######", "#I    #", "#######"]);
        let player = place_player(&mut b.grid, Coord::new(4, 1), Direction::West);
        let agent = Agent::new(b.ghosts[0], GhostKind::Inky, &config());
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(4, 1)));
    }

    #[test]
    fn shy_ghost_chases_from_afar_and_retreats_up_close() {
        let mut b = board(&[
            "##############",
            "#C           #",
            "#            #",
            "##############",
        ]);
        let player = place_player(&mut b.grid, Coord::new(12, 1), Direction::West);
        let agent = Agent::new(b.ghosts[0], GhostKind::Clyde, &config());
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(12, 1)));

        b.grid.remove(player).expect("placed");
        b.grid.place(player, Coord::new(3, 1)).expect("free");
        assert_eq!(agent.target(&b.grid, &[player]), Some(Coord::new(1, 2)));
    }

    #[test]
    fn unreachable_target_keeps_agent_in_place() {
        let mut b = board(&["#####", "#B#P#", "#####"]);
        let player = place_player(&mut b.grid, Coord::new(3, 1), Direction::West);
        let agent = Agent::new(b.ghosts[0], GhostKind::Blinky, &config());
        assert_eq!(agent.next_direction(&b.grid, &[player]), None);
    }

    #[test]
    fn no_prey_means_no_target() {
        let b = board(&["#####", "#B  #", "#####"]);
        let agent = Agent::new(b.ghosts[0], GhostKind::Blinky, &config());
        assert_eq!(agent.target(&b.grid, &[]), None);
        assert_eq!(agent.next_direction(&b.grid, &[]), None);
    }
}
