//! Board occupancy model: a fixed rectangle of cells plus the registry of
//! every entity that can stand on them.
//!
//! Each cell keeps its occupants in arrival order. An entity records the
//! coordinate it stands on, never the cell itself, so the grid stays the
//! single owner of occupancy state.

use crate::error::GridError;
use crate::types::{Coord, Direction, EntityClass, EntityId, EntityKind};

#[derive(Clone, Debug)]
pub struct Cell {
    pub coord: Coord,
    passable: bool,
    occupants: Vec<EntityId>,
}

impl Cell {
    pub fn is_passable(&self) -> bool {
        self.passable
    }

    pub fn occupants(&self) -> &[EntityId] {
        &self.occupants
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub cell: Option<Coord>,
    pub facing: Direction,
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    entities: Vec<Entity>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Result<Self, GridError> {
        Self::with_walls(width, height, std::iter::empty())
    }

    pub fn with_walls(
        width: i32,
        height: i32,
        walls: impl IntoIterator<Item = Coord>,
    ) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell {
                    coord: Coord::new(x, y),
                    passable: true,
                    occupants: Vec::new(),
                });
            }
        }
        let mut grid = Self {
            width,
            height,
            cells,
            entities: Vec::new(),
        };
        for wall in walls {
            let idx = grid.index(wall)?;
            grid.cells[idx].passable = false;
        }
        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> Result<usize, GridError> {
        if !self.contains(coord) {
            return Err(GridError::OutOfBounds(coord));
        }
        Ok((coord.y * self.width + coord.x) as usize)
    }

    pub fn cell(&self, coord: Coord) -> Result<&Cell, GridError> {
        let idx = self.index(coord)?;
        Ok(&self.cells[idx])
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn occupants_at(&self, coord: Coord) -> Result<&[EntityId], GridError> {
        Ok(self.cell(coord)?.occupants())
    }

    /// Walls and out-of-range coordinates are never passable. Occupants
    /// do not block: cells stack.
    pub fn is_passable(&self, coord: Coord) -> bool {
        self.cell(coord).map(Cell::is_passable).unwrap_or(false)
    }

    /// Adjacent coordinate, or `None` at the grid edge. No wraparound.
    pub fn neighbor(&self, coord: Coord, dir: Direction) -> Option<Coord> {
        let next = coord.step(dir);
        self.contains(next).then_some(next)
    }

    pub fn add_entity(&mut self, kind: EntityKind) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(Entity {
            id,
            kind,
            cell: None,
            facing: Direction::East,
        });
        id
    }

    pub fn spawn(&mut self, kind: EntityKind, at: Coord) -> Result<EntityId, GridError> {
        self.index(at)?;
        let id = self.add_entity(kind);
        self.place(id, at)?;
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity, GridError> {
        self.entities
            .get(id.0 as usize)
            .ok_or(GridError::UnknownEntity(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, GridError> {
        self.entities
            .get_mut(id.0 as usize)
            .ok_or(GridError::UnknownEntity(id))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn position(&self, id: EntityId) -> Option<Coord> {
        self.entity(id).ok().and_then(|entity| entity.cell)
    }

    pub fn place(&mut self, id: EntityId, at: Coord) -> Result<(), GridError> {
        let idx = self.index(at)?;
        let entity = self.entity_mut(id)?;
        if entity.cell.is_some() {
            return Err(GridError::InvalidPlacement(id));
        }
        entity.cell = Some(at);
        self.cells[idx].occupants.push(id);
        Ok(())
    }

    /// Takes the entity off its cell and returns where it stood.
    pub fn remove(&mut self, id: EntityId) -> Result<Coord, GridError> {
        let entity = self.entity_mut(id)?;
        let at = entity.cell.take().ok_or(GridError::NotPlaced(id))?;
        let idx = self.index(at)?;
        self.cells[idx].occupants.retain(|occupant| *occupant != id);
        Ok(at)
    }

    pub fn set_facing(&mut self, id: EntityId, dir: Direction) -> Result<(), GridError> {
        self.entity_mut(id)?.facing = dir;
        Ok(())
    }

    /// First placed entity of exactly `kind`, scanning cells row-major.
    pub fn find_entity(&self, kind: EntityKind) -> Option<EntityId> {
        self.cells.iter().find_map(|cell| {
            cell.occupants
                .iter()
                .copied()
                .find(|id| self.kind_of(*id) == Some(kind))
        })
    }

    pub fn count(&self, class: EntityClass) -> usize {
        self.entities
            .iter()
            .filter(|entity| entity.cell.is_some() && entity.kind.class() == class)
            .count()
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.entity(id).ok().map(|entity| entity.kind)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::GhostKind;

    #[test]
    fn occupants_keep_arrival_order() {
        let mut grid = Grid::new(3, 3).expect("grid");
        let at = Coord::new(1, 1);
        let a = grid.spawn(EntityKind::Pellet, at).expect("spawn a");
        let b = grid.spawn(EntityKind::Player, at).expect("spawn b");
        assert_eq!(grid.occupants_at(at).expect("in range"), &[a, b]);

        grid.remove(a).expect("remove a");
        assert_eq!(grid.occupants_at(at).expect("in range"), &[b]);
        assert_eq!(grid.position(a), None);
    }

    #[test]
    fn placing_twice_is_rejected() {
        let mut grid = Grid::new(2, 1).expect("grid");
        let id = grid.spawn(EntityKind::Player, Coord::new(0, 0)).expect("spawn");
        assert_eq!(
            grid.place(id, Coord::new(1, 0)),
            Err(GridError::InvalidPlacement(id))
        );
        assert!(grid
            .occupants_at(Coord::new(1, 0))
            .expect("in range")
            .is_empty());
    }

    #[test]
    fn removing_unplaced_entity_reports_not_placed() {
        let mut grid = Grid::new(2, 2).expect("grid");
        let id = grid.add_entity(EntityKind::Player);
        assert_eq!(grid.remove(id), Err(GridError::NotPlaced(id)));
    }

    #[test]
    fn out_of_range_lookups_fail() {
        let grid = Grid::new(2, 2).expect("grid");
        assert_eq!(
            grid.occupants_at(Coord::new(2, 0)),
            Err(GridError::OutOfBounds(Coord::new(2, 0)))
        );
        assert!(grid.cell(Coord::new(-1, 0)).is_err());
        assert!(!grid.is_passable(Coord::new(0, 5)));
        assert!(Grid::new(0, 3).is_err());
    }

    #[test]
    fn neighbor_does_not_wrap() {
        let grid = Grid::new(3, 2).expect("grid");
        assert_eq!(grid.neighbor(Coord::new(0, 0), Direction::West), None);
        assert_eq!(grid.neighbor(Coord::new(0, 0), Direction::North), None);
        assert_eq!(
            grid.neighbor(Coord::new(0, 0), Direction::East),
            Some(Coord::new(1, 0))
        );
        assert_eq!(grid.neighbor(Coord::new(2, 1), Direction::South), None);
    }

    #[test]
    fn walls_are_impassable_and_occupied_floor_is_not() {
        let mut grid = Grid::with_walls(3, 1, [Coord::new(1, 0)]).expect("grid");
        grid.spawn(EntityKind::Ghost(GhostKind::Blinky), Coord::new(2, 0))
            .expect("spawn");
        assert!(grid.is_passable(Coord::new(0, 0)));
        assert!(!grid.is_passable(Coord::new(1, 0)));
        assert!(grid.is_passable(Coord::new(2, 0)));
    }

    #[test]
    fn find_entity_scans_row_major() {
        let mut grid = Grid::new(4, 2).expect("grid");
        let late = grid
            .spawn(EntityKind::Ghost(GhostKind::Inky), Coord::new(3, 1))
            .expect("spawn");
        let early = grid
            .spawn(EntityKind::Ghost(GhostKind::Inky), Coord::new(0, 1))
            .expect("spawn");
        assert_eq!(grid.find_entity(EntityKind::Ghost(GhostKind::Inky)), Some(early));
        grid.remove(early).expect("remove");
        assert_eq!(grid.find_entity(EntityKind::Ghost(GhostKind::Inky)), Some(late));
        assert_eq!(grid.find_entity(EntityKind::Ghost(GhostKind::Clyde)), None);
    }

    #[test]
    fn count_ignores_unplaced_entities() {
        let mut grid = Grid::new(2, 2).expect("grid");
        grid.spawn(EntityKind::Pellet, Coord::new(0, 0)).expect("spawn");
        let eaten = grid.spawn(EntityKind::Pellet, Coord::new(1, 0)).expect("spawn");
        grid.remove(eaten).expect("remove");
        grid.add_entity(EntityKind::Pellet);
        assert_eq!(grid.count(EntityClass::Pellet), 1);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Place(usize, i32, i32),
        Remove(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..5usize, 0..3i32, 0..3i32).prop_map(|(e, x, y)| Op::Place(e, x, y)),
            (0..5usize).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn occupancy_matches_arrival_order_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut grid = Grid::new(3, 3).expect("grid");
            let ids: Vec<EntityId> = (0..5).map(|_| grid.add_entity(EntityKind::Player)).collect();
            let mut model: Vec<Vec<EntityId>> = vec![Vec::new(); 9];
            let mut placed: Vec<Option<usize>> = vec![None; 5];

            for op in ops {
                match op {
                    Op::Place(e, x, y) => {
                        let result = grid.place(ids[e], Coord::new(x, y));
                        if placed[e].is_some() {
                            prop_assert_eq!(result, Err(GridError::InvalidPlacement(ids[e])));
                        } else {
                            prop_assert!(result.is_ok());
                            let idx = (y * 3 + x) as usize;
                            model[idx].push(ids[e]);
                            placed[e] = Some(idx);
                        }
                    }
                    Op::Remove(e) => {
                        let result = grid.remove(ids[e]);
                        match placed[e].take() {
                            Some(idx) => {
                                prop_assert!(result.is_ok());
                                model[idx].retain(|id| *id != ids[e]);
                            }
                            None => prop_assert_eq!(result, Err(GridError::NotPlaced(ids[e]))),
                        }
                    }
                }
            }

            for (idx, cell) in grid.cells().enumerate() {
                prop_assert_eq!(cell.occupants(), model[idx].as_slice());
                let mut seen = cell.occupants().to_vec();
                seen.sort();
                seen.dedup();
                prop_assert_eq!(seen.len(), cell.occupants().len());
            }
        }
    }
}
