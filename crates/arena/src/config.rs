//! Arena configuration

use serde::{Deserialize, Serialize};
use sprite_engine::config::{Config, EngineConfig};

/// Arena configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Engine settings
    pub engine: EngineConfig,

    /// Frames to run before the headless window "closes"
    pub frames: u32,

    /// Player speed in pixels per second
    pub player_speed: f32,

    /// Enemy chase speed in pixels per second
    pub enemy_speed: f32,

    /// Seconds an explosion keeps emitting
    pub explosion_time: f32,

    /// Seed for the scripted input
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            frames: 600,
            player_speed: 160.0,
            enemy_speed: 60.0,
            explosion_time: 0.5,
            seed: 7,
        }
    }
}

impl Config for ArenaConfig {}
