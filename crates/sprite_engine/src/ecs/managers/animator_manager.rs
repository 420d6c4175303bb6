//! Animator manager: advances sprite-sheet animators and writes the result
//! into the paired sprites

use super::RenderManager;
use crate::ecs::components::Animator;
use crate::ecs::{ComponentStore, EcsError, EntityId};

/// Animator store plus simulation pass
#[derive(Debug, Default)]
pub struct AnimatorManager {
    animators: ComponentStore<Animator>,
}

impl AnimatorManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an animator
    pub fn add(&mut self, id: EntityId, animator: Animator) -> Option<Animator> {
        self.animators.insert(id, animator)
    }

    /// Release an animator; absent ids are ignored
    pub fn remove(&mut self, id: EntityId) -> Option<Animator> {
        self.animators.remove(id)
    }

    /// Animator of `id`
    pub fn find(&self, id: EntityId) -> Option<&Animator> {
        self.animators.get(id)
    }

    /// Animator of `id`, mutably
    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Animator> {
        self.animators.get_mut(id)
    }

    /// Whether `id` has an animator
    pub fn contains(&self, id: EntityId) -> bool {
        self.animators.contains(id)
    }

    /// Select the animation of `id`
    pub fn set_animation(&mut self, id: EntityId, name: &str, single_play: bool) -> Result<(), EcsError> {
        self.animators
            .get_mut(id)
            .ok_or(EcsError::MissingComponent {
                entity: id,
                component: "Animator",
                required_by: "set_animation",
            })?
            .set_animation(name, single_play)
    }

    /// Number of animators
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    /// Whether there are no animators
    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    /// Drop every animator
    pub fn clear(&mut self) {
        self.animators.clear();
    }

    /// Advance every animator by one tick, updating sprite tiles
    pub fn simulate(&mut self, tick: f32, render: &mut RenderManager) {
        for (id, animator) in self.animators.iter_mut() {
            if let Some(tile) = animator.simulate(tick) {
                if let Some(sprite) = render.find_mut(id) {
                    sprite.set_tile_offset(tile);
                }
            }
        }
    }
}
