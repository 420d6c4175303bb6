//! Deferred commands
//!
//! Callbacks run while the scene is mid-update, some of them straight after
//! a physics step. Anything that changes the structure of the world
//! (removing an entity, spawning one, touching a physics body) is queued
//! here and applied by the scene after the update pass, before the next
//! physics step.

use super::EntityKey;
use crate::foundation::math::Vec2;
use crate::scene::{Scene, SceneError};
use std::fmt;

/// Deferred spawn: runs with full access to the scene
pub type SpawnFn = Box<dyn FnOnce(&mut Scene) -> Result<(), SceneError>>;

/// A deferred world mutation
pub enum Command {
    /// Remove an entity and everything attached to it
    Despawn(EntityKey),
    /// Apply a linear impulse (pixel units) to an entity's body
    ApplyImpulse {
        /// Target entity
        target: EntityKey,
        /// Impulse
        impulse: Vec2,
    },
    /// Replace an entity's body velocity (pixels per second)
    SetLinearVelocity {
        /// Target entity
        target: EntityKey,
        /// New velocity
        velocity: Vec2,
    },
    /// Move an entity (and its body, if any) to a position
    Teleport {
        /// Target entity
        target: EntityKey,
        /// New position
        position: Vec2,
    },
    /// Create entities
    Spawn(SpawnFn),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Despawn(key) => f.debug_tuple("Despawn").field(key).finish(),
            Self::ApplyImpulse { target, impulse } => f
                .debug_struct("ApplyImpulse")
                .field("target", target)
                .field("impulse", impulse)
                .finish(),
            Self::SetLinearVelocity { target, velocity } => f
                .debug_struct("SetLinearVelocity")
                .field("target", target)
                .field("velocity", velocity)
                .finish(),
            Self::Teleport { target, position } => f
                .debug_struct("Teleport")
                .field("target", target)
                .field("position", position)
                .finish(),
            Self::Spawn(_) => f.write_str("Spawn(..)"),
        }
    }
}

/// FIFO of deferred commands
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Queue removal of an entity
    pub fn despawn(&mut self, target: EntityKey) {
        self.push(Command::Despawn(target));
    }

    /// Queue an impulse
    pub fn apply_impulse(&mut self, target: EntityKey, impulse: Vec2) {
        self.push(Command::ApplyImpulse { target, impulse });
    }

    /// Queue a velocity change
    pub fn set_linear_velocity(&mut self, target: EntityKey, velocity: Vec2) {
        self.push(Command::SetLinearVelocity { target, velocity });
    }

    /// Queue a teleport
    pub fn teleport(&mut self, target: EntityKey, position: Vec2) {
        self.push(Command::Teleport { target, position });
    }

    /// Queue a spawn
    pub fn spawn(&mut self, spawn: impl FnOnce(&mut Scene) -> Result<(), SceneError> + 'static) {
        self.push(Command::Spawn(Box::new(spawn)));
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command in submission order
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}
