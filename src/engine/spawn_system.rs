use super::*;

pub(super) fn spawn_ghosts(grid: &Grid) -> Vec<Ghost> {
    grid.enemy_spawns()
        .iter()
        .enumerate()
        .map(|(id, cell)| Ghost::new(id, cell.pixel_origin(), grid))
        .collect()
}

impl Game {
    /// Restores every point, puts the actors back on their spawns and zeroes
    /// the score. The sync exchange in flight, if any, carries on.
    pub(super) fn reset_round(&mut self) {
        self.grid.reset_points();
        self.player.pos = self.grid.player_spawn().pixel_origin();
        self.player.score = 0;
        self.outcome = None;
        for ghost in &mut self.ghosts {
            ghost.reset(&self.grid);
        }
    }
}
