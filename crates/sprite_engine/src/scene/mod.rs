//! Scene
//!
//! A scene owns the physics world, any number of entity systems, tilemaps
//! and cameras. One simulation tick runs, in order:
//!
//! 1. physics step, collecting collision-begin pairs
//! 2. collision dispatch, both directions for every pair
//! 3. behavior updates
//! 4. deferred commands, then pending removals
//! 5. transform resync from physics bodies
//! 6. animation, particle and movement managers
//!
//! Submission (camera plus draw enqueue) is separate so an engine running
//! several fixed ticks per frame only queues one frame's worth of draws.

mod camera;
mod definition;
mod tilemap;

#[cfg(test)]
mod tests;

pub use camera::{CameraId, CameraSet};
pub use definition::{
    EntityDefinition, EntityFactories, EntityFactory, EntitySpawn, InstanceDefinition, LayerDefinition,
    PopulateReport, SceneDefinition, TileGroupDefinition,
};
pub use tilemap::{Tile, TileGroup, TileLayer, Tilemap};

use crate::config::EngineConfig;
use crate::ecs::{Command, CommandQueue, EcsError, EntityBehavior, EntityBuilder, EntityKey, EntitySystem, SystemId};
use crate::foundation::logging::fatal;
use crate::input::InputState;
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::render::{Camera2D, RenderError, Renderer};

/// Scene errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Scene description could not be parsed
    #[error("Scene definition error: {0}")]
    Definition(#[from] serde_json::Error),

    /// No factory registered for an entity type
    #[error("No entity factory registered for '{0}'")]
    UnknownFactory(String),

    /// System id not in this scene
    #[error("Unknown entity system {0:?}")]
    UnknownSystem(SystemId),

    /// Entity layer error
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Render resource error
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Counters for one simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Collision-begin pairs reported by the physics step
    pub collisions: usize,
    /// Behaviors updated
    pub updated: usize,
    /// Deferred commands applied
    pub commands: usize,
    /// Entities removed
    pub removed: usize,
    /// Transforms rewritten from physics
    pub synced: usize,
}

/// Scene
pub struct Scene {
    physics: PhysicsWorld,
    systems: Vec<EntitySystem>,
    tilemaps: Vec<Tilemap>,
    cameras: CameraSet,
    commands: CommandQueue,
    tick: f32,
    ticks: u64,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("systems", &self.systems.len())
            .field("bodies", &self.physics.body_count())
            .field("tilemaps", &self.tilemaps.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Empty scene with a "main" camera covering the window
    pub fn new(config: &EngineConfig) -> Self {
        let mut cameras = CameraSet::new();
        cameras.add(
            "main",
            Camera2D::new(config.window.width as f32, config.window.height as f32),
        );
        Self {
            physics: PhysicsWorld::new(&config.physics),
            systems: Vec::new(),
            tilemaps: Vec::new(),
            cameras,
            commands: CommandQueue::new(),
            tick: config.simulation.fixed_tick,
            ticks: 0,
        }
    }

    /// Create an entity system
    pub fn add_system(&mut self, name: impl Into<String>) -> SystemId {
        let id = SystemId(u32::try_from(self.systems.len()).unwrap_or_else(|_| fatal("entity system ids exhausted")));
        let system = EntitySystem::new(id, name);
        log::debug!("Scene: added entity system '{}' as {:?}", system.name(), id);
        self.systems.push(system);
        id
    }

    /// Entity system by id
    pub fn system(&self, id: SystemId) -> Option<&EntitySystem> {
        self.systems.get(id.0 as usize)
    }

    /// Entity system by id, mutably
    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut EntitySystem> {
        self.systems.get_mut(id.0 as usize)
    }

    /// Entity system id by name
    pub fn system_by_name(&self, name: &str) -> Option<SystemId> {
        self.systems.iter().find(|s| s.name() == name).map(EntitySystem::id)
    }

    /// All entity systems
    pub fn systems(&self) -> &[EntitySystem] {
        &self.systems
    }

    /// Physics world
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Physics world, mutably
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Queue for commands issued outside behaviors
    pub fn commands_mut(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    /// Cameras
    pub fn cameras(&self) -> &CameraSet {
        &self.cameras
    }

    /// Cameras, mutably
    pub fn cameras_mut(&mut self) -> &mut CameraSet {
        &mut self.cameras
    }

    /// Add a tilemap
    pub fn add_tilemap(&mut self, tilemap: Tilemap) -> usize {
        self.tilemaps.push(tilemap);
        self.tilemaps.len() - 1
    }

    /// Tilemaps
    pub fn tilemaps(&self) -> &[Tilemap] {
        &self.tilemaps
    }

    /// Tilemaps, mutably
    pub fn tilemaps_mut(&mut self) -> &mut [Tilemap] {
        &mut self.tilemaps
    }

    /// Fixed tick handed to the managers
    pub fn tick(&self) -> f32 {
        self.tick
    }

    /// Number of simulation ticks run
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Start building an entity in `system`
    pub fn spawn(
        &mut self,
        system: SystemId,
        behavior: impl EntityBehavior,
    ) -> Result<EntityBuilder<'_>, SceneError> {
        let target = self
            .systems
            .get_mut(system.0 as usize)
            .ok_or(SceneError::UnknownSystem(system))?;
        Ok(target.new_entity(&mut self.physics, behavior))
    }

    /// Whether `key` names a live entity
    pub fn contains(&self, key: EntityKey) -> bool {
        self.system(key.system).is_some_and(|s| s.contains(key.entity))
    }

    /// Total live entities across systems
    pub fn entity_count(&self) -> usize {
        self.systems.iter().map(EntitySystem::len).sum()
    }

    /// Remove an entity immediately
    ///
    /// Only safe between ticks. Behaviors remove through the command queue.
    pub fn remove_entity(&mut self, key: EntityKey) -> bool {
        match self.systems.get_mut(key.system.0 as usize) {
            Some(system) => system.remove_entity(key.entity, &mut self.physics),
            None => false,
        }
    }

    /// Remove every entity, tilemap and queued command
    pub fn clear(&mut self) {
        for system in &mut self.systems {
            system.clear(&mut self.physics);
        }
        self.tilemaps.clear();
        let dropped = self.commands.drain().len();
        if dropped > 0 {
            log::debug!("Scene: dropped {dropped} queued commands on clear");
        }
    }

    /// Run one simulation tick
    pub fn simulate(&mut self, input: &InputState) -> Result<TickStats, SceneError> {
        let mut stats = TickStats::default();

        let pairs = self.physics.step();
        stats.collisions = pairs.len();
        for pair in pairs {
            self.dispatch_collision(pair.a, pair.b);
            self.dispatch_collision(pair.b, pair.a);
        }

        for system in &mut self.systems {
            stats.updated += system.run_update(&self.physics, input, &mut self.commands, self.tick);
        }

        stats.commands = self.apply_commands()?;
        stats.removed = self.apply_removals();

        for system in &mut self.systems {
            stats.synced += system.sync_from_physics(&self.physics);
        }

        for system in &mut self.systems {
            system.simulate_managers(self.tick);
        }

        self.ticks += 1;
        Ok(stats)
    }

    /// Point the renderer at the active camera and queue every drawable
    pub fn submit(&mut self, renderer: &mut Renderer) -> usize {
        if let Some(camera) = self.cameras.active() {
            renderer.set_camera(camera);
        }
        let mut queued = 0;
        for tilemap in &self.tilemaps {
            queued += tilemap.submit(renderer);
        }
        for system in &mut self.systems {
            queued += system.submit(renderer);
        }
        queued
    }

    /// Simulate one tick and queue its drawables
    pub fn do_update(&mut self, input: &InputState, renderer: &mut Renderer) -> Result<TickStats, SceneError> {
        let stats = self.simulate(input)?;
        self.submit(renderer);
        Ok(stats)
    }

    fn dispatch_collision(&mut self, target: EntityKey, other: EntityKey) {
        let Some(system) = self.systems.get_mut(target.system.0 as usize) else {
            fatal(format!("collision reported for {target}, whose entity system does not exist"));
        };
        system.dispatch_collision(target.entity, other, &self.physics, &mut self.commands);
    }

    /// Apply queued commands until the queue stays empty
    ///
    /// Spawn closures may queue further commands; those run in the same pass.
    fn apply_commands(&mut self) -> Result<usize, SceneError> {
        let mut applied = 0;
        loop {
            let batch = self.commands.drain();
            if batch.is_empty() {
                return Ok(applied);
            }
            for command in batch {
                self.apply_command(command)?;
                applied += 1;
            }
        }
    }

    fn apply_command(&mut self, command: Command) -> Result<(), SceneError> {
        match command {
            Command::Despawn(key) => {
                if let Some(system) = self.systems.get_mut(key.system.0 as usize) {
                    if system.contains(key.entity) {
                        system.mark_for_removal(key.entity);
                        return Ok(());
                    }
                }
                log::debug!("Scene: despawn of {key} ignored, entity is gone");
            }
            Command::ApplyImpulse { target, impulse } => match self.body_of(target) {
                Some(body) => self.physics.apply_impulse(body, impulse),
                None => log::debug!("Scene: impulse for {target} ignored, no body"),
            },
            Command::SetLinearVelocity { target, velocity } => match self.body_of(target) {
                Some(body) => self.physics.set_linear_velocity(body, velocity),
                None => log::debug!("Scene: velocity for {target} ignored, no body"),
            },
            Command::Teleport { target, position } => {
                if let Some(body) = self.body_of(target) {
                    self.physics.teleport(body, position);
                } else if let Some(transform) = self
                    .system_mut(target.system)
                    .and_then(|s| s.find_transform_mut(target.entity))
                {
                    transform.set_position_2d(position);
                } else {
                    log::debug!("Scene: teleport of {target} ignored, no transform");
                }
            }
            Command::Spawn(spawn) => spawn(self)?,
        }
        Ok(())
    }

    fn apply_removals(&mut self) -> usize {
        let mut removed = 0;
        for system in &mut self.systems {
            removed += system.drain_removals(&mut self.physics);
        }
        removed
    }

    fn body_of(&self, key: EntityKey) -> Option<BodyHandle> {
        self.system(key.system)?
            .find_collider(key.entity)
            .map(crate::ecs::components::Collider::body)
    }
}
