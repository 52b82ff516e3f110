//! Breadth-first searches over the grid.
//!
//! Every search expands neighbours in [`Direction::ALL`] order, so among
//! equal-length routes the same one is always returned.

use std::collections::VecDeque;

use crate::grid::Grid;
use crate::types::{Coord, Direction, EntityClass, EntityId};

/// Shortest route from `from` to `to` as a list of steps.
///
/// With a traveller the search only enters passable cells. `None` as the
/// traveller makes the search terrain-blind, for internal distance queries.
/// Returns `None` when `to` cannot be reached and an empty route when
/// `from == to`.
pub fn shortest_path(
    grid: &Grid,
    from: Coord,
    to: Coord,
    traveller: Option<EntityId>,
) -> Option<Vec<Direction>> {
    if from == to {
        return Some(Vec::new());
    }
    if !grid.contains(from) || !grid.contains(to) {
        return None;
    }
    let respect_terrain = traveller.is_some();
    let width = grid.width() as usize;
    let index = |c: Coord| c.y as usize * width + c.x as usize;

    // Parent pointer per cell: the cell we came from and the step taken.
    let mut came_from: Vec<Option<(Coord, Direction)>> =
        vec![None; width * grid.height() as usize];
    let mut visited = vec![false; came_from.len()];
    let mut queue = VecDeque::new();
    visited[index(from)] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for dir in Direction::ALL {
            let Some(next) = grid.neighbor(current, dir) else {
                continue;
            };
            if visited[index(next)] {
                continue;
            }
            if respect_terrain && !grid.is_passable(next) {
                continue;
            }
            visited[index(next)] = true;
            came_from[index(next)] = Some((current, dir));
            if next == to {
                return Some(rebuild_path(&came_from, index, from, to));
            }
            queue.push_back(next);
        }
    }
    None
}

fn rebuild_path(
    came_from: &[Option<(Coord, Direction)>],
    index: impl Fn(Coord) -> usize,
    from: Coord,
    to: Coord,
) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut cursor = to;
    while cursor != from {
        let Some((prev, dir)) = came_from[index(cursor)] else {
            break;
        };
        path.push(dir);
        cursor = prev;
    }
    path.reverse();
    path
}

pub fn path_length(
    grid: &Grid,
    from: Coord,
    to: Coord,
    traveller: Option<EntityId>,
) -> Option<usize> {
    shortest_path(grid, from, to, traveller).map(|path| path.len())
}

/// Nearest placed entity of `class`, searching outward from `from` through
/// passable cells. Occupants on `from` itself count.
pub fn find_nearest(grid: &Grid, class: EntityClass, from: Coord) -> Option<EntityId> {
    find_nearest_matching(grid, from, |id| {
        grid.kind_of(id).map(|kind| kind.class()) == Some(class)
    })
}

pub fn find_nearest_matching(
    grid: &Grid,
    from: Coord,
    mut accept: impl FnMut(EntityId) -> bool,
) -> Option<EntityId> {
    if !grid.contains(from) {
        return None;
    }
    let width = grid.width() as usize;
    let index = |c: Coord| c.y as usize * width + c.x as usize;
    let mut visited = vec![false; width * grid.height() as usize];
    let mut queue = VecDeque::new();
    visited[index(from)] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        let occupants = grid.occupants_at(current).ok()?;
        if let Some(found) = occupants.iter().copied().find(|id| accept(*id)) {
            return Some(found);
        }
        for dir in Direction::ALL {
            let Some(next) = grid.neighbor(current, dir) else {
                continue;
            };
            if visited[index(next)] || !grid.is_passable(next) {
                continue;
            }
            visited[index(next)] = true;
            queue.push_back(next);
        }
    }
    None
}

/// Walks up to `steps` cells from `from`, stopping before the grid edge or
/// a wall. Returns the last cell reached.
pub fn cell_ahead(grid: &Grid, from: Coord, dir: Direction, steps: u32) -> Coord {
    let mut cursor = from;
    for _ in 0..steps {
        match grid.neighbor(cursor, dir) {
            Some(next) if grid.is_passable(next) => cursor = next,
            _ => break,
        }
    }
    cursor
}

/// Closest passable cell to `from` by terrain-blind distance.
pub fn nearest_passable(grid: &Grid, from: Coord) -> Option<Coord> {
    let clamped = Coord::new(
        from.x.clamp(0, grid.width() - 1),
        from.y.clamp(0, grid.height() - 1),
    );
    let width = grid.width() as usize;
    let index = |c: Coord| c.y as usize * width + c.x as usize;
    let mut visited = vec![false; width * grid.height() as usize];
    let mut queue = VecDeque::new();
    visited[index(clamped)] = true;
    queue.push_back(clamped);

    while let Some(current) = queue.pop_front() {
        if grid.is_passable(current) {
            return Some(current);
        }
        for dir in Direction::ALL {
            let Some(next) = grid.neighbor(current, dir) else {
                continue;
            };
            if visited[index(next)] {
                continue;
            }
            visited[index(next)] = true;
            queue.push_back(next);
        }
    }
    None
}
