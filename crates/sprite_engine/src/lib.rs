//! # Sprite Engine
//!
//! A 2D game engine built around entity systems: entities are ids, their
//! state lives in per-system component stores, and per-type gameplay logic
//! is an [`ecs::EntityBehavior`] the scene calls back into.
//!
//! ## Features
//!
//! - **Entity systems**: transforms with parent hierarchies, colliders,
//!   sprites, sprite-sheet animators, particle emitters and movers
//! - **Physics**: rapier2d rigid bodies with symmetric collision callbacks
//! - **Rendering**: a Vulkan-shaped [`render::RenderBackend`] seam with
//!   per-material pipelines, optional instanced batching and a headless
//!   backend for tests and servers
//! - **Scenes**: JSON scene definitions, tilemaps, multiple cameras
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sprite_engine::prelude::*;
//!
//! struct Game;
//!
//! impl Application for Game {
//!     fn initialize(&mut self, ctx: &mut AppContext<'_>) -> Result<(), AppError> {
//!         let system = ctx.scene.add_system("props");
//!         ctx.scene.spawn(system, ())?.attach_transform(Transform::at(0.0, 0.0))?.build();
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _ctx: &mut AppContext<'_>, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _ctx: &mut AppContext<'_>) {}
//! }
//!
//! struct Window;
//!
//! impl Platform for Window {
//!     fn poll_events(&mut self, _input: &mut InputState) -> PlatformEvents {
//!         PlatformEvents::default()
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let backend = HeadlessBackend::new(config.window.width, config.window.height);
//!     let mut engine = Engine::new(config, backend)?;
//!     engine.run(&mut Window, &mut Game)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;

mod application;
mod engine;

pub use application::{AppContext, AppError, Application};
pub use engine::{Engine, EngineError, EngineStats, Platform, PlatformEvents};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig},
        ecs::{
            components::{Animation, Animator, EmitterDesc, Mover, SpriteDesc, Transform},
            CollisionContext, EcsError, EntityBehavior, EntityId, EntityKey, InitContext, SystemId, UpdateContext,
        },
        foundation::math::{Mat4, Vec2, Vec3, Vec4},
        input::{ButtonState, InputState, KeyCode, MouseButton},
        physics::{BodyDesc, BodyType, CollisionLayers, LayerFilter, Shape},
        render::{Camera2D, FrameStatus, HeadlessBackend, MaterialDesc, RenderBackend, Renderer, TextureDesc},
        scene::{EntityFactories, EntitySpawn, Scene, SceneDefinition, SceneError},
        AppContext, AppError, Application, Engine, EngineError, Platform, PlatformEvents,
    };
}
