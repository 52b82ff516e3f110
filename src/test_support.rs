//! Grid fixtures drawn as ASCII rows.
//!
//! `#` wall, `.` pellet, `P` start cell, `B`/`G` Blinky, `K` Pinky,
//! `I` Inky, `C` Clyde, anything else empty floor.

use crate::grid::Grid;
use crate::types::{Coord, EntityId, EntityKind, GhostKind};

pub(crate) struct Fixture {
    pub grid: Grid,
    pub start_cells: Vec<Coord>,
    pub ghosts: Vec<EntityId>,
}

pub(crate) fn board(rows: &[&str]) -> Fixture {
    let height = rows.len() as i32;
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0) as i32;
    let mut walls = Vec::new();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.bytes().enumerate() {
            if ch == b'#' {
                walls.push(Coord::new(x as i32, y as i32));
            }
        }
    }
    let mut grid = Grid::with_walls(width, height, walls).expect("fixture dimensions");
    let mut start_cells = Vec::new();
    let mut ghosts = Vec::new();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.bytes().enumerate() {
            let at = Coord::new(x as i32, y as i32);
            let ghost_kind = match ch {
                b'B' | b'G' => Some(GhostKind::Blinky),
                b'K' => Some(GhostKind::Pinky),
                b'I' => Some(GhostKind::Inky),
                b'C' => Some(GhostKind::Clyde),
                _ => None,
            };
            if let Some(kind) = ghost_kind {
                ghosts.push(grid.spawn(EntityKind::Ghost(kind), at).expect("ghost in range"));
                continue;
            }
            match ch {
                b'.' => {
                    grid.spawn(EntityKind::Pellet, at).expect("pellet in range");
                }
                b'P' => start_cells.push(at),
                _ => {}
            }
        }
    }
    Fixture {
        grid,
        start_cells,
        ghosts,
    }
}
