//! Configuration system
//!
//! Engine configuration is plain serde data. Files are loaded by extension:
//! `.toml` through `toml`, `.ron` through `ron`. Every section carries
//! defaults so a partial file only overrides what it names.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its valid range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window configuration
    pub window: WindowConfig,

    /// Physics world configuration
    pub physics: PhysicsConfig,

    /// Gameplay simulation configuration
    pub simulation: SimulationConfig,

    /// Renderer configuration
    pub renderer: RendererConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Reject values the frame loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.physics.timestep <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "physics.timestep must be positive, got {}",
                self.physics.timestep
            )));
        }
        if self.simulation.fixed_tick <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "simulation.fixed_tick must be positive, got {}",
                self.simulation.fixed_tick
            )));
        }
        let drift = (self.physics.timestep - self.simulation.fixed_tick).abs();
        if drift > self.simulation.fixed_tick * 1e-4 {
            return Err(ConfigError::Invalid(format!(
                "physics.timestep ({}) must equal simulation.fixed_tick ({}); each tick runs one physics step",
                self.physics.timestep, self.simulation.fixed_tick
            )));
        }
        if self.physics.pixels_per_meter <= 0.0 {
            return Err(ConfigError::Invalid("physics.pixels_per_meter must be positive".into()));
        }
        if self.renderer.max_frames_in_flight == 0 {
            return Err(ConfigError::Invalid("renderer.max_frames_in_flight must be at least 1".into()));
        }
        Ok(())
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,

    /// Window width
    pub width: u32,

    /// Window height
    pub height: u32,

    /// VSync setting
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Sprite Engine Application".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Physics world configuration
///
/// Stepping is deterministic for identical inputs: the world always advances
/// by `timestep` with the configured iteration counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity in pixels per second squared
    pub gravity: [f32; 2],

    /// Fixed physics sub-step in seconds
    pub timestep: f32,

    /// Velocity solver iterations
    pub velocity_iterations: usize,

    /// Position (stabilization) solver iterations
    pub position_iterations: usize,

    /// Scale between engine units (pixels) and physics units (metres)
    pub pixels_per_meter: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0],
            timestep: 1.0 / 60.0,
            velocity_iterations: 6,
            position_iterations: 2,
            pixels_per_meter: 32.0,
        }
    }
}

/// Gameplay simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed tick used by the animation, particle and move managers
    pub fixed_tick: f32,

    /// Upper bound of fixed ticks run to catch up after a slow frame
    pub max_ticks_per_frame: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_tick: 1.0 / 60.0,
            max_ticks_per_frame: 5,
        }
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Maximum number of frames in flight
    pub max_frames_in_flight: usize,

    /// Group sprites sharing a material into one instanced draw
    pub batching: bool,

    /// How long to wait for a swapchain image before reporting a timeout
    pub acquire_timeout_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_frames_in_flight: 2,
            batching: false,
            acquire_timeout_ms: 1000,
        }
    }
}
