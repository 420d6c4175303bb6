//! Sprite render component
//!
//! Holds what the renderer needs to draw one entity: material and buffer
//! handles, colour, the current sprite-sheet tile and a cached uniform blob.
//! The blob is rebuilt lazily when the world transform version moves or
//! when visual state (tile, colour) changes, so a sprite that stands still
//! costs nothing per frame.

use super::TransformTracker;
use crate::foundation::math::{Mat4, Vec2, Vec4};
use crate::render::{Drawable, IndexBufferId, MaterialId, SpriteUniform, VertexBufferId};

/// Description used to attach a sprite
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc {
    /// Material (interned by name in the renderer)
    pub material: MaterialId,
    /// Quad vertex buffer
    pub vertex_buffer: VertexBufferId,
    /// Quad index buffer
    pub index_buffer: IndexBufferId,
    /// Number of indices to draw
    pub index_count: u32,
    /// Colour multiplier
    pub color: Vec4,
    /// Size of one tile in texture space
    pub tile_scale: Vec2,
    /// Draw order; lower layers draw first
    pub layer: i32,
    /// Initial visibility
    pub visible: bool,
}

impl SpriteDesc {
    /// Visible, white, single-tile sprite
    pub fn new(material: MaterialId, vertex_buffer: VertexBufferId, index_buffer: IndexBufferId) -> Self {
        Self {
            material,
            vertex_buffer,
            index_buffer,
            index_count: 6,
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            tile_scale: Vec2::new(1.0, 1.0),
            layer: 0,
            visible: true,
        }
    }

    /// Builder pattern: set colour
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Builder pattern: set sprite-sheet tile size
    pub fn with_tile_scale(mut self, tile_scale: Vec2) -> Self {
        self.tile_scale = tile_scale;
        self
    }

    /// Builder pattern: set draw layer
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Builder pattern: start hidden
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Render component for sprites
#[derive(Debug, Clone)]
pub struct RenderComponent {
    material: MaterialId,
    vertex_buffer: VertexBufferId,
    index_buffer: IndexBufferId,
    index_count: u32,
    color: Vec4,
    tile_offset: Vec2,
    tile_scale: Vec2,
    layer: i32,
    visible: bool,
    uniform: SpriteUniform,
    tracker: TransformTracker,
    content_dirty: bool,
    rebuilds: u64,
}

impl RenderComponent {
    /// Create from a description
    pub fn new(desc: &SpriteDesc) -> Self {
        Self {
            material: desc.material,
            vertex_buffer: desc.vertex_buffer,
            index_buffer: desc.index_buffer,
            index_count: desc.index_count,
            color: desc.color,
            tile_offset: Vec2::zeros(),
            tile_scale: desc.tile_scale,
            layer: desc.layer,
            visible: desc.visible,
            uniform: SpriteUniform::default(),
            tracker: TransformTracker::new(),
            content_dirty: true,
            rebuilds: 0,
        }
    }

    /// Material handle
    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Vertex buffer handle
    pub fn vertex_buffer(&self) -> VertexBufferId {
        self.vertex_buffer
    }

    /// Index buffer handle
    pub fn index_buffer(&self) -> IndexBufferId {
        self.index_buffer
    }

    /// Draw layer
    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// Whether the sprite is drawn
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the sprite
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Colour multiplier
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Set colour multiplier
    pub fn set_color(&mut self, color: Vec4) {
        if self.color != color {
            self.color = color;
            self.content_dirty = true;
        }
    }

    /// Current sprite-sheet tile (column, row)
    pub fn tile_offset(&self) -> Vec2 {
        self.tile_offset
    }

    /// Select a sprite-sheet tile (column, row)
    pub fn set_tile_offset(&mut self, tile_offset: Vec2) {
        if self.tile_offset != tile_offset {
            self.tile_offset = tile_offset;
            self.content_dirty = true;
        }
    }

    /// Uniform blob for the given world transform
    ///
    /// Rebuilt only when `world_version` differs from the last version this
    /// component saw or when tile/colour changed since the last rebuild.
    pub fn uniforms(&mut self, world_matrix: &Mat4, world_version: u64) -> &SpriteUniform {
        let moved = self.tracker.changed(world_version);
        if moved || self.content_dirty {
            let offset = self.tile_offset.component_mul(&self.tile_scale);
            self.uniform = SpriteUniform::new(world_matrix, self.color, offset, self.tile_scale);
            self.content_dirty = false;
            self.rebuilds += 1;
        }
        &self.uniform
    }

    /// Number of times the uniform blob has been rebuilt
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Renderer-facing bundle for this frame
    pub fn drawable(&mut self, world_matrix: &Mat4, world_version: u64) -> Drawable {
        let uniform = *self.uniforms(world_matrix, world_version);
        Drawable {
            material: self.material,
            vertex_buffer: self.vertex_buffer,
            index_buffer: self.index_buffer,
            index_count: self.index_count,
            uniform,
            layer: self.layer,
        }
    }
}
