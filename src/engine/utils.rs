use crate::constants::{ACTOR_PX, BACKGROUND_COLOR, POINT_COLOR, TILE_PX, WALL_COLOR};
use crate::grid::{Cell, Grid};
use crate::types::{Color, Tile, Vec2};

pub(super) fn tile_color(tile: Tile) -> Color {
    match tile {
        Tile::Wall => WALL_COLOR,
        Tile::Point => POINT_COLOR,
        Tile::Empty | Tile::Spawn | Tile::EnemySpawn | Tile::ConsumedPoint => BACKGROUND_COLOR,
    }
}

/// Map cells touched by an actor box at `pos`.
pub(super) fn covered_cells(grid: &Grid, pos: Vec2) -> Vec<(Cell, Tile)> {
    let x0 = pos.x.div_euclid(TILE_PX);
    let x1 = (pos.x + ACTOR_PX - 1).div_euclid(TILE_PX);
    let y0 = pos.y.div_euclid(TILE_PX);
    let y1 = (pos.y + ACTOR_PX - 1).div_euclid(TILE_PX);
    let mut cells = Vec::with_capacity(4);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if let Some(tile) = grid.tile(x, y) {
                cells.push((
                    Cell {
                        x: x as usize,
                        y: y as usize,
                    },
                    tile,
                ));
            }
        }
    }
    cells
}
