use super::utils::{covered_cells, tile_color};
use crate::constants::{
    ghost_color, ACTOR_PX, BACKGROUND_COLOR, FIELD_PX, PLAYER_COLOR, TEXT_COLOR,
};
use crate::devices::Renderer;
use crate::ghost::Ghost;
use crate::grid::Grid;
use crate::types::Vec2;

const TITLE_TEXT: &str = "SHADOW MAZE";
const GAME_OVER_TEXT: &str = "GAME OVER";

pub(super) fn draw_title(renderer: &mut dyn Renderer) {
    renderer.clear(BACKGROUND_COLOR);
    renderer.draw_text(FIELD_PX / 2 - 33, FIELD_PX / 2 - 4, TITLE_TEXT, TEXT_COLOR);
}

pub(super) fn draw_game_over(renderer: &mut dyn Renderer, score: u32) {
    renderer.clear(BACKGROUND_COLOR);
    renderer.draw_text(FIELD_PX / 2 - 27, FIELD_PX / 2 - 12, GAME_OVER_TEXT, TEXT_COLOR);
    renderer.draw_text(
        FIELD_PX / 2 - 27,
        FIELD_PX / 2,
        &format!("SCORE {score}"),
        TEXT_COLOR,
    );
}

pub(super) fn draw_field(renderer: &mut dyn Renderer, grid: &Grid) {
    renderer.clear(BACKGROUND_COLOR);
    for (cell, tile) in grid.cells() {
        renderer.draw_tile(cell.x, cell.y, tile_color(tile));
    }
}

pub(super) fn erase_actor(renderer: &mut dyn Renderer, grid: &Grid, pos: Vec2) {
    for (cell, tile) in covered_cells(grid, pos) {
        renderer.draw_tile(cell.x, cell.y, tile_color(tile));
    }
}

pub(super) fn draw_player(renderer: &mut dyn Renderer, pos: Vec2) {
    renderer.draw_actor(pos.x, pos.y, ACTOR_PX, PLAYER_COLOR);
}

pub(super) fn draw_ghost(renderer: &mut dyn Renderer, ghost: &Ghost) {
    renderer.draw_actor(ghost.pos.x, ghost.pos.y, ACTOR_PX, ghost_color(ghost.id));
}
