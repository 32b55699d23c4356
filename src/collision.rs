//! Actors are `ACTOR_PX` squares addressed by their top-left pixel and are
//! always aligned on at least one axis after a committed move.

use crate::constants::{ACTOR_PX, FIELD_PX, TILE_PX};
use crate::grid::{Cell, Grid};
use crate::types::{Axis, Velocity, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub pos: Vec2,
    pub vel: Velocity,
    pub moved: bool,
}

pub fn clamp_velocity(vel: Velocity, max_step: i32) -> Velocity {
    Velocity {
        dx: vel.dx.clamp(-max_step, max_step),
        dy: vel.dy.clamp(-max_step, max_step),
    }
}

pub fn clamp_to_field(pos: Vec2) -> Vec2 {
    Vec2 {
        x: pos.x.clamp(0, FIELD_PX - ACTOR_PX),
        y: pos.y.clamp(0, FIELD_PX - ACTOR_PX),
    }
}

pub fn snap_to_rail(coord: i32) -> i32 {
    (coord + ACTOR_PX / 2).div_euclid(ACTOR_PX) * ACTOR_PX
}

/// Whether shifting the actor by `delta` pixels along `axis` would put its
/// leading edge into a wall. A zero delta never makes progress and counts as
/// blocked.
pub fn is_blocked(grid: &Grid, pos: Vec2, axis: Axis, delta: i32) -> bool {
    if delta == 0 {
        return true;
    }
    let (along, across) = match axis {
        Axis::X => (pos.x, pos.y),
        Axis::Y => (pos.y, pos.x),
    };
    let leading = if delta > 0 {
        along + ACTOR_PX - 1 + delta
    } else {
        along + delta
    };
    let lead_cell = leading.div_euclid(TILE_PX);
    let first = across.div_euclid(TILE_PX);
    let last = (across + ACTOR_PX - 1).div_euclid(TILE_PX);
    (first..=last).any(|cross_cell| match axis {
        Axis::X => grid.is_wall(lead_cell, cross_cell),
        Axis::Y => grid.is_wall(cross_cell, lead_cell),
    })
}

/// Longest move of at most `delta` pixels along `axis` that stays clear of
/// walls, so an actor closes the gap to a wall instead of stopping short.
pub fn free_step(grid: &Grid, pos: Vec2, axis: Axis, delta: i32) -> i32 {
    let sign = delta.signum();
    (1..=delta.abs())
        .rev()
        .map(|step| step * sign)
        .find(|&step| !is_blocked(grid, pos, axis, step))
        .unwrap_or(0)
}

/// Moves an actor by at most `max_step` pixels per axis.
///
/// Only one axis moves per call. The axis with the larger requested speed wins
/// when it can move; otherwise the other axis moves, which lets a tilted player
/// slide around corners. Each axis is tested from the position it would commit
/// to, with the other coordinate already on its rail. The returned velocity is
/// the step actually applied (zero when nothing moved).
pub fn try_move(grid: &Grid, pos: Vec2, requested: Velocity, max_step: i32) -> MoveOutcome {
    let vel = clamp_velocity(requested, max_step);
    let along_x = Vec2 {
        x: pos.x,
        y: snap_to_rail(pos.y),
    };
    let along_y = Vec2 {
        x: snap_to_rail(pos.x),
        y: pos.y,
    };
    let dx = free_step(grid, along_x, Axis::X, vel.dx);
    let dy = free_step(grid, along_y, Axis::Y, vel.dy);
    let dominant = if vel.dx.abs() >= vel.dy.abs() {
        Axis::X
    } else {
        Axis::Y
    };

    match (dominant, dx != 0, dy != 0) {
        (_, false, false) => MoveOutcome {
            pos,
            vel: Velocity::ZERO,
            moved: false,
        },
        (Axis::X, true, _) | (Axis::Y, true, false) => MoveOutcome {
            pos: Vec2 {
                x: along_x.x + dx,
                y: along_x.y,
            },
            vel: Velocity { dx, dy: 0 },
            moved: true,
        },
        _ => MoveOutcome {
            pos: Vec2 {
                x: along_y.x,
                y: along_y.y + dy,
            },
            vel: Velocity { dx: 0, dy },
            moved: true,
        },
    }
}

pub fn center_cell(pos: Vec2) -> Cell {
    Cell {
        x: ((pos.x + ACTOR_PX / 2).max(0) / TILE_PX) as usize,
        y: ((pos.y + ACTOR_PX / 2).max(0) / TILE_PX) as usize,
    }
}

pub fn actors_overlap(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() < ACTOR_PX && (a.y - b.y).abs() < ACTOR_PX
}

pub fn overlaps_wall(grid: &Grid, pos: Vec2) -> bool {
    let x0 = pos.x.div_euclid(TILE_PX);
    let x1 = (pos.x + ACTOR_PX - 1).div_euclid(TILE_PX);
    let y0 = pos.y.div_euclid(TILE_PX);
    let y1 = (pos.y + ACTOR_PX - 1).div_euclid(TILE_PX);
    (y0..=y1).any(|y| (x0..=x1).any(|x| grid.is_wall(x, y)))
}
