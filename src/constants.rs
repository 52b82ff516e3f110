use crate::config::Difficulty;

pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const PELLET_POINTS: u32 = 10;

pub const GHOST_MOVE_INTERVAL_MS: u64 = 250;
pub const GHOST_INTERVAL_VARIATION_MS: u64 = 50;

/// Cells ahead of the player an ambusher aims for.
pub const AMBUSH_DISTANCE: u32 = 4;
/// Cells ahead of the player used as the flanker's reflection pivot.
pub const FLANK_DISTANCE: u32 = 2;
/// Path length below which a shy ghost gives up the chase.
pub const SHY_DISTANCE: u32 = 8;

pub fn get_difficulty_interval_multiplier(difficulty: Difficulty) -> f32 {
    match difficulty {
        Difficulty::Casual => 1.25,
        Difficulty::Normal => 1.0,
        Difficulty::Hard => 0.8,
        Difficulty::Nightmare => 0.6,
    }
}

pub fn scale_interval(interval_ms: u64, difficulty: Difficulty) -> u64 {
    let scaled = interval_ms as f32 * get_difficulty_interval_multiplier(difficulty);
    (scaled.round() as u64).max(1)
}
