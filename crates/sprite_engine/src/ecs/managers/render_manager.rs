//! Render manager: owns the sprites of one entity system

use crate::ecs::components::{RenderComponent, Transform};
use crate::ecs::{ComponentStore, EntityId};
use crate::render::{IndexBufferId, MaterialId, Renderer, VertexBufferId};

/// GPU resources a sprite refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteResources {
    /// Material
    pub material: MaterialId,
    /// Vertex buffer
    pub vertex_buffer: VertexBufferId,
    /// Index buffer
    pub index_buffer: IndexBufferId,
}

/// Sprite store plus submission
#[derive(Debug, Default)]
pub struct RenderManager {
    sprites: ComponentStore<RenderComponent>,
}

impl RenderManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sprite, returning the one it replaced
    pub fn add(&mut self, id: EntityId, sprite: RenderComponent) -> Option<RenderComponent> {
        self.sprites.insert(id, sprite)
    }

    /// Release a sprite; absent ids are ignored
    pub fn remove(&mut self, id: EntityId) -> Option<RenderComponent> {
        self.sprites.remove(id)
    }

    /// Sprite of `id`
    pub fn find(&self, id: EntityId) -> Option<&RenderComponent> {
        self.sprites.get(id)
    }

    /// Sprite of `id`, mutably
    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut RenderComponent> {
        self.sprites.get_mut(id)
    }

    /// Whether `id` has a sprite
    pub fn contains(&self, id: EntityId) -> bool {
        self.sprites.contains(id)
    }

    /// GPU resources held for `id`, if it still has a sprite
    pub fn resources_for(&self, id: EntityId) -> Option<SpriteResources> {
        self.sprites.get(id).map(|sprite| SpriteResources {
            material: sprite.material(),
            vertex_buffer: sprite.vertex_buffer(),
            index_buffer: sprite.index_buffer(),
        })
    }

    /// Number of sprites
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Whether there are no sprites
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Iterate sprites
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &RenderComponent)> {
        self.sprites.iter()
    }

    /// Drop every sprite
    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    /// Queue every visible sprite that has a transform
    pub fn submit(&mut self, renderer: &mut Renderer, transforms: &ComponentStore<Transform>) -> usize {
        let mut submitted = 0;
        for (id, sprite) in self.sprites.iter_mut() {
            if !sprite.is_visible() {
                continue;
            }
            let (Some(world), Some(version)) = (transforms.world_matrix(id), transforms.world_version(id)) else {
                continue;
            };
            renderer.submit_sprite(sprite.drawable(&world, version));
            submitted += 1;
        }
        submitted
    }
}
