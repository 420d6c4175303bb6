//! Emitter manager: advances particle emitters around their entities

use crate::ecs::components::{ParticleEmitter, Transform};
use crate::ecs::{ComponentStore, EntityId};
use crate::render::Renderer;

/// Emitter store plus simulation pass
#[derive(Debug, Default)]
pub struct EmitterManager {
    emitters: ComponentStore<ParticleEmitter>,
}

impl EmitterManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an emitter
    pub fn add(&mut self, id: EntityId, emitter: ParticleEmitter) -> Option<ParticleEmitter> {
        self.emitters.insert(id, emitter)
    }

    /// Release an emitter; absent ids are ignored
    pub fn remove(&mut self, id: EntityId) -> Option<ParticleEmitter> {
        self.emitters.remove(id)
    }

    /// Emitter of `id`
    pub fn find(&self, id: EntityId) -> Option<&ParticleEmitter> {
        self.emitters.get(id)
    }

    /// Emitter of `id`, mutably
    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut ParticleEmitter> {
        self.emitters.get_mut(id)
    }

    /// Whether `id` has an emitter
    pub fn contains(&self, id: EntityId) -> bool {
        self.emitters.contains(id)
    }

    /// Number of emitters
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// Whether there are no emitters
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Live particles across all emitters
    pub fn particle_count(&self) -> usize {
        self.emitters.iter().map(|(_, emitter)| emitter.alive_count()).sum()
    }

    /// Drop every emitter
    pub fn clear(&mut self) {
        self.emitters.clear();
    }

    /// Advance every emitter by one tick around its entity's world position
    pub fn simulate(&mut self, tick: f32, transforms: &ComponentStore<Transform>) {
        for (id, emitter) in self.emitters.iter_mut() {
            let Some(origin) = transforms.world_position(id) else {
                continue;
            };
            emitter.simulate(tick, origin.xy());
        }
    }

    /// Queue every live particle
    pub fn submit(&self, renderer: &mut Renderer) -> usize {
        let mut submitted = 0;
        for (_, emitter) in self.emitters.iter() {
            for drawable in emitter.drawables() {
                renderer.submit_sprite(drawable);
                submitted += 1;
            }
        }
        submitted
    }
}
