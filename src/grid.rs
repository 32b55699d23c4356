use thiserror::Error;

use crate::constants::{MAP_SIZE, MAX_GHOSTS, TILE_PX};
use crate::types::{Tile, Vec2};

const DEFAULT_LEVEL: [&str; MAP_SIZE] = [
    "################################",
    "# #     #..............#     # #",
    "# #     #.##.######.##.#     # #",
    "# #     #.##.######.##.#     # #",
    "# #     #.##...##...##.#     # #",
    "# #######.####.##.####.####### #",
    "# #.......####.##.####.......# #",
    "# ###.######........####.###.# #",
    "# ###.######.######.####.###.# #",
    "# #.......##.######.##.......# #",
    "# #.#####.##...##...##.#####.# #",
    "# #.#####.####.##.####.#####.# #",
    "# #....##.####.##.####.##....# #",
    "# ####.##.....EEEE.....##.#### #",
    "# ####.####.########.####.#### #",
    "# #.##.####.########.####.##.# #",
    "# #.##......########......##.# #",
    "# #.##.####.########.####.##.# #",
    "# #....####.########.####....# #",
    "# #.##.##..............##.##.# #",
    "# #.##.##.############.##.##.# #",
    "# #.##.##.############.##.##.# #",
    "# #.##.##......##......##.##.# #",
    "# ####.#######.##.#######.#### #",
    "# ####.#######.##.#######.#### #",
    "# #............S.............# #",
    "# #.##.##################.##.# #",
    "# #.##.##################.##.# #",
    "# #.##.##################.##.# #",
    "# #.##.##################.##.# #",
    "# #....##################....# #",
    "################################",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level must have {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("row {row} must be {expected} cells wide, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile {symbol:?} at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, symbol: char },
    #[error("level has no player spawn")]
    MissingSpawn,
    #[error("level has {0} player spawns, expected exactly one")]
    MultipleSpawns(usize),
    #[error("level has {0} enemy spawns, at most four are allowed")]
    TooManyEnemySpawns(usize),
    #[error("level has no points to collect")]
    NoPoints,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn pixel_origin(self) -> Vec2 {
        Vec2 {
            x: self.x as i32 * TILE_PX,
            y: self.y as i32 * TILE_PX,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    level: Vec<Tile>,
    tiles: Vec<Tile>,
    remaining_points: usize,
    player_spawn: Cell,
    enemy_spawns: Vec<Cell>,
}

impl Grid {
    pub fn default_level() -> Self {
        Self::parse(&DEFAULT_LEVEL.join("\n")).expect("bundled level is valid")
    }

    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != MAP_SIZE {
            return Err(LevelError::RowCount {
                expected: MAP_SIZE,
                found: rows.len(),
            });
        }

        let mut level = Vec::with_capacity(MAP_SIZE * MAP_SIZE);
        let mut spawns = Vec::new();
        let mut enemy_spawns = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            let width = line.chars().count();
            if width != MAP_SIZE {
                return Err(LevelError::RowWidth {
                    row,
                    expected: MAP_SIZE,
                    found: width,
                });
            }
            for (col, symbol) in line.chars().enumerate() {
                let tile = Tile::parse(symbol).ok_or(LevelError::UnknownTile { row, col, symbol })?;
                match tile {
                    Tile::Spawn => spawns.push(Cell { x: col, y: row }),
                    Tile::EnemySpawn => enemy_spawns.push(Cell { x: col, y: row }),
                    _ => {}
                }
                level.push(tile);
            }
        }

        let player_spawn = match spawns.as_slice() {
            [] => return Err(LevelError::MissingSpawn),
            [only] => *only,
            many => return Err(LevelError::MultipleSpawns(many.len())),
        };
        if enemy_spawns.len() > MAX_GHOSTS {
            return Err(LevelError::TooManyEnemySpawns(enemy_spawns.len()));
        }
        if !level
            .iter()
            .any(|tile| matches!(tile, Tile::Point | Tile::ConsumedPoint))
        {
            return Err(LevelError::NoPoints);
        }

        let mut grid = Self {
            tiles: level.clone(),
            level,
            remaining_points: 0,
            player_spawn,
            enemy_spawns,
        };
        grid.reset_points();
        Ok(grid)
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        if x < 0 || y < 0 || x >= MAP_SIZE as i32 || y >= MAP_SIZE as i32 {
            return None;
        }
        self.tiles.get(y as usize * MAP_SIZE + x as usize).copied()
    }

    /// Cells outside the map count as walls.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_none_or(|tile| tile == Tile::Wall)
    }

    /// Consumes a point at `cell`; returns whether one was there.
    pub fn collect_point(&mut self, cell: Cell) -> bool {
        if cell.x >= MAP_SIZE || cell.y >= MAP_SIZE {
            return false;
        }
        let tile = &mut self.tiles[cell.y * MAP_SIZE + cell.x];
        if *tile != Tile::Point {
            return false;
        }
        *tile = Tile::ConsumedPoint;
        self.remaining_points = self.remaining_points.saturating_sub(1);
        true
    }

    pub fn reset_points(&mut self) {
        for (tile, original) in self.tiles.iter_mut().zip(self.level.iter()) {
            *tile = match original {
                Tile::ConsumedPoint => Tile::Point,
                other => *other,
            };
        }
        self.remaining_points = self
            .tiles
            .iter()
            .filter(|tile| **tile == Tile::Point)
            .count();
    }

    pub fn remaining_points(&self) -> usize {
        self.remaining_points
    }

    pub fn is_cleared(&self) -> bool {
        self.remaining_points == 0
    }

    pub fn player_spawn(&self) -> Cell {
        self.player_spawn
    }

    pub fn enemy_spawns(&self) -> &[Cell] {
        &self.enemy_spawns
    }

    pub fn cells(&self) -> impl Iterator<Item = (Cell, Tile)> + '_ {
        self.tiles.iter().enumerate().map(|(idx, tile)| {
            (
                Cell {
                    x: idx % MAP_SIZE,
                    y: idx / MAP_SIZE,
                },
                *tile,
            )
        })
    }

    #[cfg(test)]
    pub(crate) fn set_tile(&mut self, x: usize, y: usize, tile: Tile) {
        self.tiles[y * MAP_SIZE + x] = tile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_level() -> Vec<String> {
        let mut rows = Vec::new();
        for y in 0..MAP_SIZE {
            let row: String = (0..MAP_SIZE)
                .map(|x| {
                    if x == 0 || y == 0 || x == MAP_SIZE - 1 || y == MAP_SIZE - 1 {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect();
            rows.push(row);
        }
        rows[5].replace_range(5..6, "S");
        rows
    }

    #[test]
    fn default_level_matches_bundled_maze() {
        let grid = Grid::default_level();
        assert_eq!(grid.player_spawn(), Cell { x: 15, y: 25 });
        assert_eq!(grid.enemy_spawns().len(), 4);
        assert_eq!(grid.enemy_spawns()[0], Cell { x: 14, y: 13 });
        assert_eq!(grid.remaining_points(), 265);
        assert_eq!(grid.tile(0, 0), Some(Tile::Wall));
        assert_eq!(grid.tile(1, 1), Some(Tile::Empty));
    }

    #[test]
    fn out_of_range_cells_are_walls() {
        let grid = Grid::default_level();
        assert!(grid.is_wall(-1, 4));
        assert!(grid.is_wall(4, MAP_SIZE as i32));
        assert_eq!(grid.tile(MAP_SIZE as i32, 0), None);
    }

    #[test]
    fn points_are_consumed_once_and_restored_on_reset() {
        let mut grid = Grid::default_level();
        let before = grid.remaining_points();
        let cell = Cell { x: 9, y: 1 };
        assert!(grid.collect_point(cell));
        assert!(!grid.collect_point(cell));
        assert_eq!(grid.tile(9, 1), Some(Tile::ConsumedPoint));
        assert_eq!(grid.remaining_points(), before - 1);

        grid.reset_points();
        assert_eq!(grid.tile(9, 1), Some(Tile::Point));
        assert_eq!(grid.remaining_points(), before);
    }

    #[test]
    fn walls_never_collect() {
        let mut grid = Grid::default_level();
        assert!(!grid.collect_point(Cell { x: 0, y: 0 }));
        assert_eq!(grid.tile(0, 0), Some(Tile::Wall));
    }

    #[test]
    fn parse_accepts_consumed_points_as_resettable() {
        let mut rows = open_level();
        rows[2].replace_range(2..3, "o");
        let grid = Grid::parse(&rows.join("\n")).expect("level should parse");
        assert_eq!(grid.tile(2, 2), Some(Tile::Point));
    }

    #[test]
    fn parse_rejects_malformed_levels() {
        let rows = open_level();
        assert_eq!(
            Grid::parse(&rows[..10].join("\n")).unwrap_err(),
            LevelError::RowCount {
                expected: MAP_SIZE,
                found: 10
            }
        );

        let mut narrow = rows.clone();
        narrow[3].pop();
        assert!(matches!(
            Grid::parse(&narrow.join("\n")),
            Err(LevelError::RowWidth { row: 3, .. })
        ));

        let mut unknown = rows.clone();
        unknown[4].replace_range(4..5, "?");
        assert_eq!(
            Grid::parse(&unknown.join("\n")).unwrap_err(),
            LevelError::UnknownTile {
                row: 4,
                col: 4,
                symbol: '?'
            }
        );

        let mut no_spawn = rows.clone();
        no_spawn[5].replace_range(5..6, ".");
        assert_eq!(
            Grid::parse(&no_spawn.join("\n")).unwrap_err(),
            LevelError::MissingSpawn
        );

        let mut two_spawns = rows.clone();
        two_spawns[6].replace_range(6..7, "S");
        assert_eq!(
            Grid::parse(&two_spawns.join("\n")).unwrap_err(),
            LevelError::MultipleSpawns(2)
        );

        let mut crowded = rows.clone();
        crowded[8].replace_range(2..7, "EEEEE");
        assert_eq!(
            Grid::parse(&crowded.join("\n")).unwrap_err(),
            LevelError::TooManyEnemySpawns(5)
        );
    }

    #[test]
    fn parse_rejects_level_without_points() {
        let rows: Vec<String> = open_level()
            .into_iter()
            .map(|row| row.replace('.', " "))
            .collect();
        assert_eq!(
            Grid::parse(&rows.join("\n")).unwrap_err(),
            LevelError::NoPoints
        );
    }
}
