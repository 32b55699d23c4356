use crate::types::Color;

pub const MAP_SIZE: usize = 32;
pub const TILE_PX: i32 = 4;
pub const FIELD_PX: i32 = MAP_SIZE as i32 * TILE_PX;
pub const ACTOR_PX: i32 = 4;
pub const MAX_GHOSTS: usize = 4;

pub const TICK_MS: u64 = 33;
pub const MAX_CATCH_UP_TICKS: u32 = 4;
pub const TITLE_TICKS: u32 = 90;
pub const GAME_OVER_TICKS: u32 = 150;

pub const VELOCITY_FACTOR: i32 = 15;
pub const AXIS_HALF_RANGE: i32 = 255 / 2;
pub const PLAYER_MAX_STEP: i32 = 2;
pub const GHOST_MAX_STEP: i32 = 1;
pub const POINT_SCORE: u32 = 10;

pub const SYNC_CADENCE_TICKS: u32 = 45;
pub const MIN_RESPONSE_LEN: usize = 16;
pub const RESPONSE_TIMEOUT_TICKS: u32 = 90;

pub const SHADOW_TABLE_CAPACITY: usize = 10;
pub const SHADOW_TOKEN_MAX: usize = 19;
pub const QUEUE_CAPACITY: usize = SHADOW_TOKEN_MAX;
pub const READY_SENTINEL: &str = "ready";
pub const PLAYER_LOCATION_KEY: &str = "pac_loc";
pub const SCORE_KEY: &str = "score";

pub const BACKGROUND_COLOR: Color = Color(0x0000);
pub const WALL_COLOR: Color = Color(0x00D0);
pub const POINT_COLOR: Color = Color(0xF5C0);
pub const PLAYER_COLOR: Color = Color(0xEFE0);
pub const TEXT_COLOR: Color = Color(0xFFFF);
pub const GHOST_COLORS: [Color; MAX_GHOSTS] = [
    Color(0xE800),
    Color(0x075A),
    Color(0xECA0),
    Color(0xE814),
];

pub fn ghost_location_key(ghost_id: usize) -> String {
    format!("b{}_loc", ghost_id + 1)
}

pub fn ghost_queue_key(ghost_id: usize) -> String {
    format!("b{}_q", ghost_id + 1)
}

pub fn ghost_color(ghost_id: usize) -> Color {
    GHOST_COLORS[ghost_id % MAX_GHOSTS]
}
