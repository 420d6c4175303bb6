//! Application trait and lifecycle management

use crate::config::ConfigError;
use crate::ecs::EcsError;
use crate::input::InputState;
use crate::render::{RenderError, Renderer};
use crate::scene::{Scene, SceneError};
use thiserror::Error;

/// What the engine lends an application for one callback
pub struct AppContext<'a> {
    /// The scene being simulated
    pub scene: &'a mut Scene,
    /// Renderer, for creating materials and buffers
    pub renderer: &'a mut Renderer,
    /// Input as of this frame
    pub input: &'a InputState,
}

/// Application lifecycle trait
///
/// Implement this trait to create a game on top of the engine.
pub trait Application {
    /// Called once before the first frame
    ///
    /// Register materials, build the scene and spawn the initial entities.
    fn initialize(&mut self, ctx: &mut AppContext<'_>) -> Result<(), AppError>;

    /// Called once per fixed tick, before the scene simulates it
    fn update(&mut self, ctx: &mut AppContext<'_>, delta_time: f32) -> Result<(), AppError>;

    /// Called once after the last frame
    fn cleanup(&mut self, ctx: &mut AppContext<'_>);

    /// Polled every frame; returning true ends the loop
    fn should_quit(&self) -> bool {
        false
    }
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Scene error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Entity setup error
    #[error("Entity error: {0}")]
    Ecs(#[from] EcsError),

    /// Render resource error
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}
