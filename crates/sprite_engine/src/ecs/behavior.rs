//! Entity behaviors
//!
//! Every entity carries one [`EntityBehavior`], the per-type gameplay logic
//! the engine calls back into. While a behavior runs it is taken out of its
//! slot, so the context can hand it the whole entity system mutably.
//!
//! Callbacks see the physics world read-only. Structural changes (despawn,
//! spawn, impulses, teleports) go through the context's command queue and
//! take effect after the update pass.

use super::components::{Animator, Transform};
use super::{CommandQueue, EcsError, EntityId, EntityKey, EntitySystem};
use crate::input::InputState;
use crate::physics::PhysicsWorld;
use std::any::Any;

/// Gameplay logic attached to an entity
pub trait EntityBehavior: Any {
    /// Called once when the entity is built
    fn init(&mut self, _ctx: &mut InitContext<'_>) {}

    /// Called once per simulation tick
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Called when this entity's collider starts touching `other`'s
    fn on_collision(&mut self, _ctx: &mut CollisionContext<'_>, _other: EntityKey) {}

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

/// Entities without gameplay logic
impl EntityBehavior for () {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Context for [`EntityBehavior::init`]
pub struct InitContext<'a> {
    /// Entity being initialised
    pub entity: EntityId,
    /// Owning system
    pub system: &'a mut EntitySystem,
    /// Physics world
    pub physics: &'a mut PhysicsWorld,
}

impl InitContext<'_> {
    /// Scene-wide key of the entity
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.system.id(), self.entity)
    }

    /// The entity's transform
    pub fn transform(&self) -> Option<&Transform> {
        self.system.find_transform(self.entity)
    }

    /// Select the entity's animation
    pub fn set_animation(&mut self, name: &str, single_play: bool) -> Result<(), EcsError> {
        self.system.set_animation(self.entity, name, single_play)
    }
}

/// Context for [`EntityBehavior::update`]
pub struct UpdateContext<'a> {
    /// Entity being updated
    pub entity: EntityId,
    /// Owning system
    pub system: &'a mut EntitySystem,
    /// Physics world (read-only during callbacks)
    pub physics: &'a PhysicsWorld,
    /// Input for this frame
    pub input: &'a InputState,
    /// Deferred commands
    pub commands: &'a mut CommandQueue,
    /// Fixed tick length in seconds
    pub delta_time: f32,
}

impl UpdateContext<'_> {
    /// Scene-wide key of the entity
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.system.id(), self.entity)
    }

    /// The entity's transform
    pub fn transform(&self) -> Option<&Transform> {
        self.system.find_transform(self.entity)
    }

    /// The entity's transform, mutably
    ///
    /// For entities with a physics body the body wins: move those with
    /// [`CommandQueue::teleport`] instead.
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.system.find_transform_mut(self.entity)
    }

    /// The entity's animator
    pub fn animator(&self) -> Option<&Animator> {
        self.system.find_animator(self.entity)
    }

    /// Select the entity's animation
    pub fn set_animation(&mut self, name: &str, single_play: bool) -> Result<(), EcsError> {
        self.system.set_animation(self.entity, name, single_play)
    }

    /// Remove this entity after the update pass
    pub fn despawn_self(&mut self) {
        self.system.mark_for_removal(self.entity);
    }
}

/// Context for [`EntityBehavior::on_collision`]
pub struct CollisionContext<'a> {
    /// Entity being notified
    pub entity: EntityId,
    /// Owning system
    pub system: &'a mut EntitySystem,
    /// Physics world (read-only during callbacks)
    pub physics: &'a PhysicsWorld,
    /// Deferred commands
    pub commands: &'a mut CommandQueue,
}

impl CollisionContext<'_> {
    /// Scene-wide key of the entity
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.system.id(), self.entity)
    }

    /// The entity's transform
    pub fn transform(&self) -> Option<&Transform> {
        self.system.find_transform(self.entity)
    }

    /// Remove this entity after the update pass
    pub fn despawn_self(&mut self) {
        self.system.mark_for_removal(self.entity);
    }
}
