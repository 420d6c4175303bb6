//! Fluent entity construction
//!
//! ```ignore
//! let id = system
//!     .new_entity(&mut physics, Ship::default())
//!     .attach_transform(Transform::at(100.0, 100.0))?
//!     .attach_collider(BodyDesc::new(Shape::rect(32.0, 32.0)))?
//!     .attach_sprite(&sprite)?
//!     .attach_animator(animator)?
//!     .build();
//! ```
//!
//! Each `attach_*` checks the components it depends on. A failed attach
//! drops the builder, and dropping an unfinished builder removes the
//! partially built entity, physics body included, so an error never leaves
//! a half-configured entity behind.

use super::components::{Animator, Collider, EmitterDesc, Mover, ParticleEmitter, RenderComponent, SpriteDesc, Transform};
use super::{EcsError, EntityBehavior, EntityId, EntityKey, EntitySystem, InitContext};
use crate::physics::{BodyDesc, PhysicsWorld};

/// Builder returned by [`EntitySystem::new_entity`]
pub struct EntityBuilder<'a> {
    system: &'a mut EntitySystem,
    physics: &'a mut PhysicsWorld,
    entity: EntityId,
    behavior: Option<Box<dyn EntityBehavior>>,
    built: bool,
}

impl<'a> EntityBuilder<'a> {
    pub(super) fn new(
        system: &'a mut EntitySystem,
        physics: &'a mut PhysicsWorld,
        behavior: Box<dyn EntityBehavior>,
    ) -> Self {
        let entity = system.allocator.allocate();
        system.entities.insert(entity);
        system.behaviors.insert(entity, None);
        Self {
            system,
            physics,
            entity,
            behavior: Some(behavior),
            built: false,
        }
    }

    /// Id of the entity under construction
    pub fn id(&self) -> EntityId {
        self.entity
    }

    /// Scene-wide key of the entity under construction
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.system.id(), self.entity)
    }

    /// Attach (or replace) the transform
    ///
    /// Once a collider is attached the body owns the pose, so the transform
    /// can no longer be replaced.
    pub fn attach_transform(self, transform: Transform) -> Result<Self, EcsError> {
        if self.system.colliders.contains(self.entity) {
            return Err(self.conflict("Transform", "Collider"));
        }
        self.system.transforms.insert(self.entity, transform);
        Ok(self)
    }

    /// Create a physics body at the transform's position and attach it
    pub fn attach_collider(self, desc: BodyDesc) -> Result<Self, EcsError> {
        let transform = self.require_transform("Collider")?;
        if transform.parent().is_some() {
            return Err(EcsError::ConflictingComponent {
                entity: self.entity,
                component: "Collider",
                existing: "parented Transform",
            });
        }
        if self.system.colliders.contains(self.entity) {
            return Err(self.duplicate("Collider"));
        }
        if self.system.managers.movers.contains(self.entity) {
            return Err(self.conflict("Collider", "Mover"));
        }
        let (position, rotation) = (transform.position_2d(), transform.rotation());
        let key = self.key();
        let body = self.physics.create_body(&desc, position, rotation, key)?;
        self.system.colliders.insert(self.entity, Collider::new(body, &desc));
        Ok(self)
    }

    /// Attach a sprite
    pub fn attach_sprite(self, desc: &SpriteDesc) -> Result<Self, EcsError> {
        self.require_transform("Sprite")?;
        if self.system.managers.render.contains(self.entity) {
            return Err(self.duplicate("Sprite"));
        }
        self.system.managers.render.add(self.entity, RenderComponent::new(desc));
        Ok(self)
    }

    /// Attach an animator; the entity must already have a sprite to drive
    pub fn attach_animator(self, animator: Animator) -> Result<Self, EcsError> {
        if !self.system.managers.render.contains(self.entity) {
            return Err(EcsError::MissingComponent {
                entity: self.entity,
                component: "Sprite",
                required_by: "Animator",
            });
        }
        if self.system.managers.animators.contains(self.entity) {
            return Err(self.duplicate("Animator"));
        }
        self.system.managers.animators.add(self.entity, animator);
        Ok(self)
    }

    /// Attach a particle emitter
    pub fn attach_emitter(self, desc: EmitterDesc) -> Result<Self, EcsError> {
        self.require_transform("ParticleEmitter")?;
        if self.system.managers.emitters.contains(self.entity) {
            return Err(self.duplicate("ParticleEmitter"));
        }
        self.system.managers.emitters.add(self.entity, ParticleEmitter::new(desc));
        Ok(self)
    }

    /// Attach a kinematic mover; entities with a collider move through physics
    pub fn attach_mover(self, mover: Mover) -> Result<Self, EcsError> {
        self.require_transform("Mover")?;
        if self.system.colliders.contains(self.entity) {
            return Err(self.conflict("Mover", "Collider"));
        }
        if self.system.managers.movers.contains(self.entity) {
            return Err(self.duplicate("Mover"));
        }
        self.system.managers.movers.add(self.entity, mover);
        Ok(self)
    }

    /// Run the behavior's `init` and finish the entity
    pub fn build(mut self) -> EntityId {
        let entity = self.entity;
        let mut behavior = self.behavior.take().unwrap_or_else(|| Box::new(()));
        behavior.init(&mut InitContext {
            entity,
            system: &mut *self.system,
            physics: &mut *self.physics,
        });
        self.system.restore_behavior(entity, behavior);
        self.built = true;
        log::debug!("Entity {} built in system '{}'", entity, self.system.name());
        entity
    }

    fn require_transform(&self, required_by: &'static str) -> Result<&Transform, EcsError> {
        self.system.transforms.get(self.entity).ok_or(EcsError::MissingComponent {
            entity: self.entity,
            component: "Transform",
            required_by,
        })
    }

    fn duplicate(&self, component: &'static str) -> EcsError {
        EcsError::DuplicateComponent {
            entity: self.entity,
            component,
        }
    }

    fn conflict(&self, component: &'static str, existing: &'static str) -> EcsError {
        EcsError::ConflictingComponent {
            entity: self.entity,
            component,
            existing,
        }
    }
}

impl Drop for EntityBuilder<'_> {
    fn drop(&mut self) {
        if !self.built {
            log::debug!("Entity {} not built; rolling back", self.entity);
            self.system.remove_entity(self.entity, &mut *self.physics);
        }
    }
}
