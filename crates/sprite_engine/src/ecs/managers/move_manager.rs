//! Move manager: integrates kinematic movers into transforms

use crate::ecs::components::{Mover, Transform};
use crate::ecs::{ComponentStore, EntityId};

/// Mover store plus integration pass
#[derive(Debug, Default)]
pub struct MoveManager {
    movers: ComponentStore<Mover>,
}

impl MoveManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mover
    pub fn add(&mut self, id: EntityId, mover: Mover) -> Option<Mover> {
        self.movers.insert(id, mover)
    }

    /// Release a mover; absent ids are ignored
    pub fn remove(&mut self, id: EntityId) -> Option<Mover> {
        self.movers.remove(id)
    }

    /// Mover of `id`
    pub fn find(&self, id: EntityId) -> Option<&Mover> {
        self.movers.get(id)
    }

    /// Mover of `id`, mutably
    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Mover> {
        self.movers.get_mut(id)
    }

    /// Whether `id` has a mover
    pub fn contains(&self, id: EntityId) -> bool {
        self.movers.contains(id)
    }

    /// Number of movers
    pub fn len(&self) -> usize {
        self.movers.len()
    }

    /// Whether there are no movers
    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }

    /// Drop every mover
    pub fn clear(&mut self) {
        self.movers.clear();
    }

    /// Integrate every mover by one tick and apply the motion
    ///
    /// Transforms are only touched when the mover actually moved them, so a
    /// resting entity keeps its version.
    pub fn simulate(&mut self, tick: f32, transforms: &mut ComponentStore<Transform>) {
        for (id, mover) in self.movers.iter_mut() {
            mover.integrate(tick);
            let Some(transform) = transforms.get_mut(id) else {
                continue;
            };
            let delta = mover.position_delta(tick);
            if delta != crate::foundation::math::Vec2::zeros() {
                transform.translate(delta);
            }
            let spin = mover.rotation_delta(tick);
            if spin != 0.0 {
                transform.rotate(spin);
            }
        }
    }
}
