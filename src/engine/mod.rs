use crate::collision::{actors_overlap, center_cell, clamp_to_field, try_move};
use crate::config::GameOptions;
use crate::constants::{PLAYER_MAX_STEP, POINT_SCORE};
use crate::devices::{axis_velocity, Peripherals};
use crate::frame::{FrameClock, FramePlan};
use crate::ghost::Ghost;
use crate::grid::{Grid, LevelError};
use crate::rng::Rng;
use crate::sound::SoundId;
use crate::sync::{SyncOutcome, SyncProtocol};
use crate::types::{
    Axis, GameEvent, GamePhase, GameSnapshot, PlayerView, RoundOutcome, Vec2, Velocity,
};

mod render_system;
mod spawn_system;
mod utils;

#[derive(Clone, Debug)]
struct Player {
    pos: Vec2,
    score: u32,
}

/// Owns every piece of game state; hosts drive it one tick (or one frame) at a
/// time and hand in the peripherals for that call.
#[derive(Clone, Debug)]
pub struct Game {
    options: GameOptions,
    grid: Grid,
    player: Player,
    ghosts: Vec<Ghost>,
    sync: SyncProtocol,
    rng: Rng,
    clock: FrameClock,

    phase: GamePhase,
    phase_ticks: u32,
    outcome: Option<RoundOutcome>,
    tick_counter: u64,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(options: GameOptions) -> Result<Self, LevelError> {
        let grid = match options.level.as_deref() {
            Some(text) => Grid::parse(text)?,
            None => Grid::default_level(),
        };
        let ghosts = spawn_system::spawn_ghosts(&grid);
        let player = Player {
            pos: grid.player_spawn().pixel_origin(),
            score: 0,
        };
        Ok(Self {
            sync: SyncProtocol::new(options.sync.clone()),
            rng: Rng::new(options.seed),
            clock: FrameClock::new(options.tick_ms, options.max_catch_up_ticks),
            options,
            grid,
            player,
            ghosts,
            phase: GamePhase::Title,
            phase_ticks: 0,
            outcome: None,
            tick_counter: 0,
            events: Vec::new(),
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.player.score
    }

    pub fn player_pos(&self) -> Vec2 {
        self.player.pos
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn sync(&self) -> &SyncProtocol {
        &self.sync
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn select_ghost(&mut self, ghost: usize) {
        self.sync.select_ghost(ghost);
    }

    pub fn start(&mut self) {
        self.set_phase(GamePhase::Start);
    }

    /// Runs the ticks owed for a frame that took `elapsed_ms`.
    pub fn run_frame(&mut self, elapsed_ms: u64, io: &mut Peripherals<'_>) -> FramePlan {
        let plan = self.clock.plan(elapsed_ms);
        for _ in 0..plan.ticks {
            self.tick(io);
        }
        plan
    }

    pub fn tick(&mut self, io: &mut Peripherals<'_>) {
        self.tick_counter += 1;
        match self.phase {
            GamePhase::Title => self.title_tick(io),
            GamePhase::Start => self.start_round(io),
            GamePhase::Playing => self.play_tick(io),
            GamePhase::GameOver => self.game_over_tick(io),
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            tick: self.tick_counter,
            phase: self.phase,
            remaining_points: self.grid.remaining_points(),
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                score: self.player.score,
            },
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            sync: self.sync.view(),
        }
    }

    fn set_phase(&mut self, next: GamePhase) {
        if next != self.phase {
            self.events.push(GameEvent::PhaseChanged {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        self.phase_ticks = 0;
    }

    fn title_tick(&mut self, io: &mut Peripherals<'_>) {
        if self.phase_ticks == 0 {
            render_system::draw_title(io.renderer);
        }
        self.phase_ticks += 1;
        if self.phase_ticks >= self.options.title_ticks {
            self.set_phase(GamePhase::Start);
        }
    }

    fn start_round(&mut self, io: &mut Peripherals<'_>) {
        self.reset_round();
        render_system::draw_field(io.renderer, &self.grid);
        self.draw_actors(io);
        io.audio.play_sound(SoundId::Start);
        self.set_phase(GamePhase::Playing);
    }

    fn play_tick(&mut self, io: &mut Peripherals<'_>) {
        let old_player = self.player.pos;
        let old_ghosts: Vec<Vec2> = self.ghosts.iter().map(|ghost| ghost.pos).collect();

        self.move_player(io);
        self.collect_point(io);
        for ghost in &mut self.ghosts {
            ghost.step(&self.grid, &mut self.rng);
        }

        render_system::erase_actor(io.renderer, &self.grid, old_player);
        for pos in old_ghosts {
            render_system::erase_actor(io.renderer, &self.grid, pos);
        }
        self.draw_actors(io);

        let catcher = self
            .ghosts
            .iter()
            .find(|ghost| actors_overlap(ghost.pos, self.player.pos))
            .map(|ghost| ghost.id);
        if let Some(ghost) = catcher {
            self.events.push(GameEvent::PlayerCaught { ghost });
            self.end_round(RoundOutcome::Caught, io);
            return;
        }
        if self.grid.is_cleared() {
            self.events.push(GameEvent::LevelCleared {
                score: self.player.score,
            });
            self.end_round(RoundOutcome::Cleared, io);
            return;
        }

        let outcome = self.sync.tick(
            self.player.pos,
            self.player.score,
            &mut self.ghosts,
            io.link,
        );
        self.record_sync(outcome);
    }

    fn move_player(&mut self, io: &mut Peripherals<'_>) {
        let factor = self.options.velocity_factor;
        let requested = Velocity {
            dx: axis_velocity(io.tilt.read_axis(Axis::X), factor),
            dy: axis_velocity(io.tilt.read_axis(Axis::Y), factor),
        };
        let start = clamp_to_field(self.player.pos);
        let moved = try_move(&self.grid, start, requested, PLAYER_MAX_STEP);
        self.player.pos = moved.pos;
    }

    fn collect_point(&mut self, io: &mut Peripherals<'_>) {
        let cell = center_cell(self.player.pos);
        if !self.grid.collect_point(cell) {
            return;
        }
        self.player.score += POINT_SCORE;
        self.events.push(GameEvent::PointEaten {
            x: cell.x,
            y: cell.y,
            remaining: self.grid.remaining_points(),
        });
        io.audio.play_sound(SoundId::Point);
    }

    fn end_round(&mut self, outcome: RoundOutcome, io: &mut Peripherals<'_>) {
        self.outcome = Some(outcome);
        io.audio.play_sound(match outcome {
            RoundOutcome::Caught => SoundId::Caught,
            RoundOutcome::Cleared => SoundId::Cleared,
        });
        self.set_phase(GamePhase::GameOver);
    }

    fn game_over_tick(&mut self, io: &mut Peripherals<'_>) {
        if self.phase_ticks == 0 {
            render_system::draw_game_over(io.renderer, self.player.score);
        }
        self.phase_ticks += 1;
        if self.phase_ticks < self.options.game_over_ticks {
            return;
        }
        match self.outcome {
            Some(RoundOutcome::Cleared) => self.set_phase(GamePhase::Start),
            _ => self.set_phase(GamePhase::Title),
        }
    }

    fn draw_actors(&self, io: &mut Peripherals<'_>) {
        render_system::draw_player(io.renderer, self.player.pos);
        for ghost in &self.ghosts {
            render_system::draw_ghost(io.renderer, ghost);
        }
    }

    fn record_sync(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Idle | SyncOutcome::Waiting => {}
            SyncOutcome::Started(phase) => self.events.push(GameEvent::ExchangeStarted { phase }),
            SyncOutcome::Rejected(phase) => self.events.push(GameEvent::SendRejected { phase }),
            SyncOutcome::TimedOut(phase) => {
                self.events.push(GameEvent::ExchangeTimedOut { phase })
            }
            SyncOutcome::Resolved {
                phase,
                entries,
                accepted,
            } => {
                self.events
                    .push(GameEvent::ExchangeResolved { phase, entries });
                if let Some((ghost, length)) = accepted {
                    self.events.push(GameEvent::QueueAccepted { ghost, length });
                }
            }
        }
    }
}
