//! Per-system managers
//!
//! Each manager owns one cross-cutting concern (rendering, animation,
//! particles, movement) for every entity of its [`crate::ecs::EntitySystem`].
//! They are plain values bundled in [`Managers`] and threaded through the
//! update loop explicitly; nothing here is global.

pub mod animator_manager;
pub mod emitter_manager;
pub mod move_manager;
pub mod render_manager;

pub use animator_manager::AnimatorManager;
pub use emitter_manager::EmitterManager;
pub use move_manager::MoveManager;
pub use render_manager::{RenderManager, SpriteResources};

use super::components::Transform;
use super::{ComponentStore, EntityId};
use crate::render::Renderer;

/// All managers of one entity system
#[derive(Debug, Default)]
pub struct Managers {
    /// Sprites
    pub render: RenderManager,
    /// Sprite-sheet animators
    pub animators: AnimatorManager,
    /// Particle emitters
    pub emitters: EmitterManager,
    /// Kinematic movers
    pub movers: MoveManager,
}

impl Managers {
    /// Create empty managers
    pub fn new() -> Self {
        Self::default()
    }

    /// Release everything held for `id`; absent ids are ignored
    pub fn release(&mut self, id: EntityId) {
        self.render.remove(id);
        self.animators.remove(id);
        self.emitters.remove(id);
        self.movers.remove(id);
    }

    /// Release everything
    pub fn clear(&mut self) {
        self.render.clear();
        self.animators.clear();
        self.emitters.clear();
        self.movers.clear();
    }

    /// Advance movement, then animation, then particles by one fixed tick
    pub fn simulate(&mut self, tick: f32, transforms: &mut ComponentStore<Transform>) {
        self.movers.simulate(tick, transforms);
        self.animators.simulate(tick, &mut self.render);
        self.emitters.simulate(tick, transforms);
    }

    /// Queue every visible sprite and live particle
    pub fn submit(&mut self, renderer: &mut Renderer, transforms: &ComponentStore<Transform>) -> usize {
        self.render.submit(renderer, transforms) + self.emitters.submit(renderer)
    }
}
