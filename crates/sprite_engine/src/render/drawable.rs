//! Renderer-facing draw bundle

use super::{IndexBufferId, MaterialId, SpriteUniform, VertexBufferId};

/// Everything needed to draw one visible object this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    /// Material
    pub material: MaterialId,
    /// Vertex buffer
    pub vertex_buffer: VertexBufferId,
    /// Index buffer
    pub index_buffer: IndexBufferId,
    /// Indices to draw
    pub index_count: u32,
    /// Per-object uniform data
    pub uniform: SpriteUniform,
    /// Draw order; lower layers draw first
    pub layer: i32,
}
