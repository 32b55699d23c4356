use std::collections::VecDeque;

use crate::collision::{is_blocked, try_move, MoveOutcome};
use crate::constants::{GHOST_MAX_STEP, QUEUE_CAPACITY, READY_SENTINEL, TILE_PX};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{Axis, Direction, GhostView, ValidMoves, Vec2, Velocity};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectionQueue {
    codes: VecDeque<Direction>,
}

impl DirectionQueue {
    /// Parses a queue value of direction codes, front to back. Empty values,
    /// the ready sentinel, and anything with a non-code character are rejected.
    /// Codes beyond the queue capacity are dropped.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || text == READY_SENTINEL {
            return None;
        }
        let mut queue = Self::default();
        for code in text.chars() {
            let dir = Direction::from_code(code)?;
            queue.push(dir);
        }
        Some(queue)
    }

    pub fn push(&mut self, dir: Direction) -> bool {
        if self.codes.len() >= QUEUE_CAPACITY {
            return false;
        }
        self.codes.push_back(dir);
        true
    }

    pub fn pop(&mut self) -> Option<Direction> {
        self.codes.pop_front()
    }

    pub fn peek(&self) -> Option<Direction> {
        self.codes.front().copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostMode {
    Idle,
    /// A queue was accepted but nothing has been popped yet.
    Queued,
    Draining,
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: usize,
    pub pos: Vec2,
    pub vel: Velocity,
    pub valid_moves: ValidMoves,
    spawn: Vec2,
    queue: DirectionQueue,
    draining: bool,
    ready: bool,
    announced: bool,
}

impl Ghost {
    pub fn new(id: usize, spawn: Vec2, grid: &Grid) -> Self {
        let mut ghost = Self {
            id,
            pos: spawn,
            vel: Velocity::ZERO,
            valid_moves: ValidMoves::default(),
            spawn,
            queue: DirectionQueue::default(),
            draining: false,
            ready: true,
            announced: false,
        };
        ghost.determine_valid_moves(grid);
        ghost
    }

    pub fn reset(&mut self, grid: &Grid) {
        self.pos = self.spawn;
        self.vel = Velocity::ZERO;
        self.queue.clear();
        self.draining = false;
        self.ready = true;
        self.announced = false;
        self.determine_valid_moves(grid);
    }

    pub fn mode(&self) -> GhostMode {
        match (self.queue.is_empty(), self.draining) {
            (true, _) => GhostMode::Idle,
            (false, false) => GhostMode::Queued,
            (false, true) => GhostMode::Draining,
        }
    }

    pub fn determine_valid_moves(&mut self, grid: &Grid) -> ValidMoves {
        let mut moves = [false; 4];
        for dir in Direction::ALL {
            let vel = dir.velocity();
            let (axis, delta) = if vel.dx != 0 {
                (Axis::X, vel.dx)
            } else {
                (Axis::Y, vel.dy)
            };
            moves[dir.index()] = !is_blocked(grid, self.pos, axis, delta);
        }
        self.valid_moves = ValidMoves(moves);
        self.valid_moves
    }

    /// Next direction: the oldest queued command if any (taken on trust, even
    /// when the valid-move set rules it out), otherwise a random valid
    /// direction. `None` means every direction is blocked this tick.
    pub fn decide_direction(&mut self, rng: &mut Rng) -> Option<Direction> {
        if let Some(dir) = self.queue.pop() {
            self.draining = true;
            if self.queue.is_empty() {
                self.draining = false;
                self.ready = true;
                self.announced = false;
            }
            return Some(dir);
        }

        let start = rng.below(4) as usize;
        (0..4)
            .map(|offset| Direction::ALL[(start + offset) % 4])
            .find(|dir| self.valid_moves.allows(*dir))
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// A ghost takes a new queue only after its ready sentinel reached the
    /// remote side; a queue still mirrored from before the drain is ignored.
    pub fn accepts_queue(&self) -> bool {
        self.ready && self.announced
    }

    pub fn mark_announced(&mut self) {
        if self.ready {
            self.announced = true;
        }
    }

    /// Replaces the pending commands with `text`; returns the accepted length.
    pub fn load_queue(&mut self, text: &str) -> Option<usize> {
        if !self.accepts_queue() {
            return None;
        }
        let queue = DirectionQueue::parse(text)?;
        let len = queue.len();
        self.queue = queue;
        self.draining = false;
        self.ready = false;
        self.announced = false;
        Some(len)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Ghosts only turn on cell boundaries or when stopped.
    pub fn at_decision_point(&self) -> bool {
        self.vel.is_zero() || (self.pos.x % TILE_PX == 0 && self.pos.y % TILE_PX == 0)
    }

    pub fn step(&mut self, grid: &Grid, rng: &mut Rng) -> MoveOutcome {
        if self.at_decision_point() {
            self.vel = self
                .decide_direction(rng)
                .map(Direction::velocity)
                .unwrap_or(Velocity::ZERO);
        }
        let outcome = try_move(grid, self.pos, self.vel, GHOST_MAX_STEP);
        self.pos = outcome.pos;
        self.vel = outcome.vel;
        if outcome.moved {
            self.determine_valid_moves(grid);
        }
        outcome
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            queued: self.queue.len(),
            ready: self.ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::overlaps_wall;
    use crate::grid::Cell;

    /// A single vertical corridor at x = 5 from y = 3 down to y = 10.
    fn corridor_grid() -> Grid {
        let rows: Vec<String> = (0..32)
            .map(|y| {
                (0..32)
                    .map(|x| match (x, y) {
                        (5, 10) => 'S',
                        (5, 3..=9) => '.',
                        _ => '#',
                    })
                    .collect()
            })
            .collect();
        Grid::parse(&rows.join("\n")).expect("corridor level should parse")
    }

    fn announced_ghost(grid: &Grid, cell: Cell) -> Ghost {
        let mut ghost = Ghost::new(0, cell.pixel_origin(), grid);
        ghost.mark_announced();
        ghost
    }

    #[test]
    fn queue_parse_accepts_only_direction_codes() {
        let queue = DirectionQueue::parse("0123").expect("codes should parse");
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.peek(), Some(Direction::Up));
        assert!(DirectionQueue::parse("").is_none());
        assert!(DirectionQueue::parse("ready").is_none());
        assert!(DirectionQueue::parse("014").is_none());
        assert!(DirectionQueue::parse("0 1").is_none());
    }

    #[test]
    fn queue_is_bounded() {
        let long = "0".repeat(QUEUE_CAPACITY + 5);
        let queue = DirectionQueue::parse(&long).expect("long queue should parse");
        assert_eq!(queue.len(), QUEUE_CAPACITY);
    }

    #[test]
    fn queue_drains_fifo_and_sets_ready_after_last_pop() {
        let grid = Grid::default_level();
        let mut ghost = announced_ghost(&grid, Cell { x: 14, y: 13 });
        let mut rng = Rng::new(1);
        assert_eq!(ghost.load_queue("021"), Some(3));
        assert!(!ghost.is_ready());
        assert_eq!(ghost.mode(), GhostMode::Queued);

        assert_eq!(ghost.decide_direction(&mut rng), Some(Direction::Up));
        assert!(!ghost.is_ready());
        assert_eq!(ghost.mode(), GhostMode::Draining);
        assert_eq!(ghost.decide_direction(&mut rng), Some(Direction::Right));
        assert!(!ghost.is_ready());
        assert_eq!(ghost.decide_direction(&mut rng), Some(Direction::Left));
        assert!(ghost.is_ready());
        assert_eq!(ghost.mode(), GhostMode::Idle);
    }

    #[test]
    fn code_order_maps_up_left_right_down() {
        let grid = Grid::default_level();
        let mut ghost = announced_ghost(&grid, Cell { x: 14, y: 13 });
        let mut rng = Rng::new(1);
        ghost.load_queue("0123");
        let drained: Vec<_> = (0..4)
            .filter_map(|_| ghost.decide_direction(&mut rng))
            .collect();
        assert_eq!(
            drained,
            vec![Direction::Up, Direction::Left, Direction::Right, Direction::Down]
        );
    }

    #[test]
    fn queue_needs_announced_ready_ghost() {
        let grid = Grid::default_level();
        let mut ghost = Ghost::new(0, Cell { x: 14, y: 13 }.pixel_origin(), &grid);
        assert!(ghost.is_ready());
        assert_eq!(ghost.load_queue("33"), None);

        ghost.mark_announced();
        assert_eq!(ghost.load_queue("33"), Some(2));
        // Busy ghosts ignore further queues until drained and re-announced.
        ghost.mark_announced();
        assert_eq!(ghost.load_queue("00"), None);
        assert_eq!(ghost.queued(), 2);
    }

    #[test]
    fn rejected_values_leave_ghost_ready() {
        let grid = Grid::default_level();
        let mut ghost = announced_ghost(&grid, Cell { x: 14, y: 13 });
        assert_eq!(ghost.load_queue("ready"), None);
        assert_eq!(ghost.load_queue("9"), None);
        assert!(ghost.accepts_queue());
    }

    #[test]
    fn valid_moves_are_idempotent() {
        let grid = Grid::default_level();
        let mut ghost = Ghost::new(0, Cell { x: 15, y: 13 }.pixel_origin(), &grid);
        let first = ghost.determine_valid_moves(&grid);
        let second = ghost.determine_valid_moves(&grid);
        assert_eq!(first, second);
        // (15, 13) sits inside the ghost pen row, walled above and below.
        assert!(first.allows(Direction::Left));
        assert!(first.allows(Direction::Right));
        assert!(!first.allows(Direction::Up));
        assert!(!first.allows(Direction::Down));
    }

    #[test]
    fn dead_end_ghost_always_takes_only_exit() {
        let grid = corridor_grid();
        for seed in 0..200u32 {
            let mut rng = Rng::new(seed);
            let mut ghost = Ghost::new(0, Cell { x: 5, y: 3 }.pixel_origin(), &grid);
            assert_eq!(ghost.valid_moves.count(), 1);
            let outcome = ghost.step(&grid, &mut rng);
            assert!(outcome.moved);
            assert_eq!(ghost.vel, Direction::Down.velocity());
            assert_eq!(ghost.pos, Vec2 { x: 20, y: 13 });
        }
    }

    #[test]
    fn fully_enclosed_ghost_stays_put() {
        let rows: Vec<String> = (0..32)
            .map(|y| {
                (0..32)
                    .map(|x| match (x, y) {
                        (2, 2) => 'S',
                        (4, 4) => 'E',
                        (20, 20) => '.',
                        _ => '#',
                    })
                    .collect()
            })
            .collect();
        let grid = Grid::parse(&rows.join("\n")).expect("boxed level should parse");
        let mut ghost = Ghost::new(0, Cell { x: 4, y: 4 }.pixel_origin(), &grid);
        let mut rng = Rng::new(3);
        assert_eq!(ghost.valid_moves.count(), 0);
        assert_eq!(ghost.decide_direction(&mut rng), None);
        let outcome = ghost.step(&grid, &mut rng);
        assert!(!outcome.moved);
        assert!(ghost.vel.is_zero());
    }

    #[test]
    fn invalid_queued_direction_stalls_one_tick() {
        let grid = corridor_grid();
        let mut rng = Rng::new(5);
        let mut ghost = announced_ghost(&grid, Cell { x: 5, y: 3 });
        ghost.load_queue("13");
        let first = ghost.step(&grid, &mut rng);
        assert!(!first.moved);
        assert_eq!(ghost.queued(), 1);
        let second = ghost.step(&grid, &mut rng);
        assert!(second.moved);
        assert_eq!(ghost.vel, Direction::Down.velocity());
        assert!(ghost.is_ready());
    }

    #[test]
    fn ghost_keeps_heading_between_cells() {
        let grid = corridor_grid();
        let mut rng = Rng::new(11);
        let mut ghost = Ghost::new(0, Cell { x: 5, y: 3 }.pixel_origin(), &grid);
        for _ in 0..TILE_PX {
            ghost.step(&grid, &mut rng);
            assert_eq!(ghost.vel, Direction::Down.velocity());
        }
        assert_eq!(ghost.pos, Cell { x: 5, y: 4 }.pixel_origin());
    }

    #[test]
    fn random_walk_stays_out_of_walls() {
        let grid = Grid::default_level();
        let mut rng = Rng::new(77);
        let mut ghosts: Vec<Ghost> = grid
            .enemy_spawns()
            .iter()
            .enumerate()
            .map(|(id, cell)| Ghost::new(id, cell.pixel_origin(), &grid))
            .collect();
        for _ in 0..3_000 {
            for ghost in &mut ghosts {
                ghost.step(&grid, &mut rng);
                assert!(!overlaps_wall(&grid, ghost.pos));
                assert!(ghost.pos.x % TILE_PX == 0 || ghost.pos.y % TILE_PX == 0);
            }
        }
    }

    #[test]
    fn reset_returns_to_spawn_and_clears_queue() {
        let grid = Grid::default_level();
        let mut ghost = announced_ghost(&grid, Cell { x: 14, y: 13 });
        let mut rng = Rng::new(9);
        ghost.load_queue("2222");
        ghost.step(&grid, &mut rng);
        ghost.reset(&grid);
        assert_eq!(ghost.pos, Cell { x: 14, y: 13 }.pixel_origin());
        assert!(ghost.vel.is_zero());
        assert_eq!(ghost.queued(), 0);
        assert!(ghost.is_ready());
        assert!(!ghost.accepts_queue());
    }
}
