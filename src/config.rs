use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    scale_interval, AMBUSH_DISTANCE, FLANK_DISTANCE, GHOST_INTERVAL_VARIATION_MS,
    GHOST_MOVE_INTERVAL_MS, PELLET_POINTS, SHY_DISTANCE, TICK_MS,
};
use crate::error::ConfigError;
use crate::types::GhostKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Casual,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "casual" => Some(Self::Casual),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            "nightmare" => Some(Self::Nightmare),
            _ => None,
        }
    }
}

/// Tunables for one level. Passed at construction; never global.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub tick_ms: u64,
    pub pellet_points: u32,
    pub ghost_interval_ms: u64,
    pub interval_variation_ms: u64,
    pub ghost_intervals: BTreeMap<GhostKind, u64>,
    pub ambush_distance: u32,
    pub flank_distance: u32,
    pub shy_distance: u32,
    pub difficulty: Difficulty,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            pellet_points: PELLET_POINTS,
            ghost_interval_ms: GHOST_MOVE_INTERVAL_MS,
            interval_variation_ms: GHOST_INTERVAL_VARIATION_MS,
            ghost_intervals: BTreeMap::new(),
            ambush_distance: AMBUSH_DISTANCE,
            flank_distance: FLANK_DISTANCE,
            shy_distance: SHY_DISTANCE,
            difficulty: Difficulty::Normal,
            seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tickMs must be positive".to_string()));
        }
        if self.ghost_interval_ms == 0 || self.ghost_intervals.values().any(|ms| *ms == 0) {
            return Err(ConfigError::Invalid(
                "ghost intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Unscaled interval for a ghost kind.
    pub fn base_interval(&self, kind: GhostKind) -> u64 {
        self.ghost_intervals
            .get(&kind)
            .copied()
            .unwrap_or(self.ghost_interval_ms)
    }

    /// Interval for a ghost kind after difficulty scaling.
    pub fn interval_for(&self, kind: GhostKind) -> u64 {
        scale_interval(self.base_interval(kind), self.difficulty)
    }
}
