//! Entity system
//!
//! Owns entity identity for one group of entities plus every component
//! store and manager those entities use. A scene holds several systems
//! (players, enemies, pickups) that share one physics world.

use super::components::{Animator, Collider, Mover, ParticleEmitter, RenderComponent, Transform};
use super::{
    CollisionContext, CommandQueue, ComponentStore, EcsError, EntityAllocator, EntityBehavior, EntityBuilder,
    EntityId, EntityKey, Managers, SystemId, UpdateContext,
};
use crate::foundation::logging::fatal;
use crate::foundation::math::Vec3;
use crate::input::InputState;
use crate::physics::PhysicsWorld;
use crate::render::Renderer;
use std::collections::BTreeSet;
use std::fmt;

/// A group of entities with their components
pub struct EntitySystem {
    id: SystemId,
    name: String,
    pub(super) allocator: EntityAllocator,
    pub(super) entities: BTreeSet<EntityId>,
    pub(super) transforms: ComponentStore<Transform>,
    pub(super) colliders: ComponentStore<Collider>,
    pub(super) behaviors: ComponentStore<Option<Box<dyn EntityBehavior>>>,
    pub(super) managers: Managers,
    pending_removal: BTreeSet<EntityId>,
}

impl fmt::Debug for EntitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySystem")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entities", &self.entities.len())
            .field("pending_removal", &self.pending_removal)
            .finish_non_exhaustive()
    }
}

impl EntitySystem {
    /// Create an empty system
    pub fn new(id: SystemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            allocator: EntityAllocator::new(),
            entities: BTreeSet::new(),
            transforms: ComponentStore::new(),
            colliders: ComponentStore::new(),
            behaviors: ComponentStore::new(),
            managers: Managers::new(),
            pending_removal: BTreeSet::new(),
        }
    }

    /// System id within the scene
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// System name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start building a new entity
    pub fn new_entity<'a>(
        &'a mut self,
        physics: &'a mut PhysicsWorld,
        behavior: impl EntityBehavior,
    ) -> EntityBuilder<'a> {
        EntityBuilder::new(self, physics, Box::new(behavior))
    }

    /// Whether `id` is alive
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is alive
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live entity ids in creation order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().copied().collect()
    }

    /// Transform store
    pub fn transforms(&self) -> &ComponentStore<Transform> {
        &self.transforms
    }

    /// Managers
    pub fn managers(&self) -> &Managers {
        &self.managers
    }

    /// Managers, mutably
    pub fn managers_mut(&mut self) -> &mut Managers {
        &mut self.managers
    }

    /// Transform of `id`
    pub fn find_transform(&self, id: EntityId) -> Option<&Transform> {
        self.transforms.get(id)
    }

    /// Transform of `id`, mutably
    pub fn find_transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        self.transforms.get_mut(id)
    }

    /// World position of `id`, composed through its parents
    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.transforms.world_position(id)
    }

    /// Collider of `id`
    pub fn find_collider(&self, id: EntityId) -> Option<&Collider> {
        self.colliders.get(id)
    }

    /// Sprite of `id`
    pub fn find_sprite(&self, id: EntityId) -> Option<&RenderComponent> {
        self.managers.render.find(id)
    }

    /// Sprite of `id`, mutably
    pub fn find_sprite_mut(&mut self, id: EntityId) -> Option<&mut RenderComponent> {
        self.managers.render.find_mut(id)
    }

    /// Animator of `id`
    pub fn find_animator(&self, id: EntityId) -> Option<&Animator> {
        self.managers.animators.find(id)
    }

    /// Animator of `id`, mutably
    pub fn find_animator_mut(&mut self, id: EntityId) -> Option<&mut Animator> {
        self.managers.animators.find_mut(id)
    }

    /// Particle emitter of `id`
    pub fn find_emitter(&self, id: EntityId) -> Option<&ParticleEmitter> {
        self.managers.emitters.find(id)
    }

    /// Particle emitter of `id`, mutably
    pub fn find_emitter_mut(&mut self, id: EntityId) -> Option<&mut ParticleEmitter> {
        self.managers.emitters.find_mut(id)
    }

    /// Mover of `id`
    pub fn find_mover(&self, id: EntityId) -> Option<&Mover> {
        self.managers.movers.find(id)
    }

    /// Mover of `id`, mutably
    pub fn find_mover_mut(&mut self, id: EntityId) -> Option<&mut Mover> {
        self.managers.movers.find_mut(id)
    }

    /// Behavior of `id` downcast to its concrete type
    ///
    /// `None` while the behavior is running or when the type does not match.
    pub fn behavior<T: EntityBehavior>(&self, id: EntityId) -> Option<&T> {
        self.behaviors.get(id)?.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Select the animation of `id`
    pub fn set_animation(&mut self, id: EntityId, name: &str, single_play: bool) -> Result<(), EcsError> {
        if !self.contains(id) {
            return Err(EcsError::UnknownEntity(id));
        }
        self.managers.animators.set_animation(id, name, single_play)
    }

    /// Bounds overlap of two entities' colliders at their current positions
    ///
    /// `None` when either entity lacks a collider or transform.
    pub fn colliders_overlap(&self, a: EntityId, b: EntityId) -> Option<bool> {
        let (collider_a, collider_b) = (self.colliders.get(a)?, self.colliders.get(b)?);
        let (position_a, position_b) = (self.world_position(a)?, self.world_position(b)?);
        Some(collider_a.collides(position_a.xy(), collider_b, position_b.xy()))
    }

    /// Queue `id` for removal after the current update pass
    pub fn mark_for_removal(&mut self, id: EntityId) {
        if self.contains(id) {
            self.pending_removal.insert(id);
        }
    }

    /// Whether `id` is queued for removal
    pub fn is_marked_for_removal(&self, id: EntityId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Remove an entity from every store, destroying its physics body
    ///
    /// Returns false when `id` was not alive.
    pub fn remove_entity(&mut self, id: EntityId, physics: &mut PhysicsWorld) -> bool {
        if !self.entities.remove(&id) {
            return false;
        }
        self.transforms.remove(id);
        if let Some(collider) = self.colliders.remove(id) {
            physics.remove_body(collider.body());
        }
        self.behaviors.remove(id);
        self.managers.release(id);
        self.pending_removal.remove(&id);
        log::debug!("Entity {} removed from system '{}'", id, self.name);
        true
    }

    /// Remove every entity queued with [`Self::mark_for_removal`]
    pub fn drain_removals(&mut self, physics: &mut PhysicsWorld) -> usize {
        let pending: Vec<EntityId> = self.pending_removal.iter().copied().collect();
        pending.into_iter().filter(|&id| self.remove_entity(id, physics)).count()
    }

    /// Remove every entity
    pub fn clear(&mut self, physics: &mut PhysicsWorld) {
        for (_, collider) in self.colliders.iter() {
            physics.remove_body(collider.body());
        }
        self.entities.clear();
        self.transforms.clear();
        self.colliders.clear();
        self.behaviors.clear();
        self.managers.clear();
        self.pending_removal.clear();
        log::debug!("System '{}' cleared", self.name);
    }

    pub(super) fn restore_behavior(&mut self, id: EntityId, behavior: Box<dyn EntityBehavior>) {
        if let Some(slot) = self.behaviors.get_mut(id) {
            *slot = Some(behavior);
        }
    }

    fn take_behavior(&mut self, id: EntityId) -> Option<Box<dyn EntityBehavior>> {
        self.behaviors.get_mut(id).and_then(Option::take)
    }

    /// Run `update` on every live entity not queued for removal
    pub(crate) fn run_update(
        &mut self,
        physics: &PhysicsWorld,
        input: &InputState,
        commands: &mut CommandQueue,
        delta_time: f32,
    ) -> usize {
        let mut updated = 0;
        for id in self.entity_ids() {
            if self.pending_removal.contains(&id) {
                continue;
            }
            let Some(mut behavior) = self.take_behavior(id) else {
                continue;
            };
            behavior.update(&mut UpdateContext {
                entity: id,
                system: &mut *self,
                physics,
                input,
                commands: &mut *commands,
                delta_time,
            });
            self.restore_behavior(id, behavior);
            updated += 1;
        }
        updated
    }

    /// Deliver a collision-begin to `id`
    ///
    /// The physics world only reports bodies of live entities, so an unknown
    /// id means removal and body destruction went out of step.
    pub(crate) fn dispatch_collision(
        &mut self,
        id: EntityId,
        other: EntityKey,
        physics: &PhysicsWorld,
        commands: &mut CommandQueue,
    ) {
        if !self.contains(id) {
            fatal(format!(
                "collision reported for entity {} of system '{}', which no longer exists",
                id, self.name
            ));
        }
        let Some(mut behavior) = self.take_behavior(id) else {
            return;
        };
        behavior.on_collision(
            &mut CollisionContext {
                entity: id,
                system: &mut *self,
                physics,
                commands: &mut *commands,
            },
            other,
        );
        self.restore_behavior(id, behavior);
    }

    /// Copy resolved body poses into transforms
    ///
    /// Only transforms whose pose actually changed are touched. Returns the
    /// number of transforms updated.
    pub(crate) fn sync_from_physics(&mut self, physics: &PhysicsWorld) -> usize {
        let mut synced = 0;
        for (id, collider) in self.colliders.iter() {
            let Some((position, rotation)) = physics.body_position(collider.body()) else {
                fatal(format!("entity {} of system '{}' lost its physics body", id, self.name));
            };
            let Some(transform) = self.transforms.get_mut(id) else {
                continue;
            };
            if transform.position_2d() != position || transform.rotation() != rotation {
                transform.set_pose(position, rotation);
                synced += 1;
            }
        }
        synced
    }

    /// Run the manager simulation passes
    pub(crate) fn simulate_managers(&mut self, tick: f32) {
        self.managers.simulate(tick, &mut self.transforms);
    }

    /// Queue visible sprites and particles
    pub(crate) fn submit(&mut self, renderer: &mut Renderer) -> usize {
        self.managers.submit(renderer, &self.transforms)
    }
}
