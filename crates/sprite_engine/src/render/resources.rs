//! Renderer resource handles and descriptions
//!
//! Handles are slotmap keys issued by the backend. They are cheap to copy
//! and compare, and a key from a destroyed resource never aliases a new one.

use crate::foundation::math::{Vec2, Vec4};
use bytemuck::{Pod, Zeroable};
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a material
    pub struct MaterialId;
    /// Handle to a 2D texture
    pub struct TextureId;
    /// Handle to a vertex buffer
    pub struct VertexBufferId;
    /// Handle to an index buffer
    pub struct IndexBufferId;
}

/// Sprite vertex: position and texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 2],
    /// Texture coordinate
    pub uv: [f32; 2],
}

impl Vertex {
    /// Unit quad centred on the origin, two triangles
    pub fn quad() -> ([Self; 4], [u32; 6]) {
        (
            [
                Self { position: [-0.5, -0.5], uv: [0.0, 0.0] },
                Self { position: [0.5, -0.5], uv: [1.0, 0.0] },
                Self { position: [0.5, 0.5], uv: [1.0, 1.0] },
                Self { position: [-0.5, 0.5], uv: [0.0, 1.0] },
            ],
            [0, 1, 2, 2, 3, 0],
        )
    }
}

/// Texture description; textures are interned by `name`
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// Unique name
    pub name: String,
    /// Source path, resolved by the backend
    pub path: String,
    /// Size in pixels
    pub width: u32,
    /// Size in pixels
    pub height: u32,
}

/// Material description; materials are interned by `name`
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    /// Unique name
    pub name: String,
    /// Texture sampled by the material
    pub texture: Option<TextureId>,
    /// Base colour multiplier
    pub color: Vec4,
    /// Size of one sprite-sheet tile in texture space (1/columns, 1/rows)
    pub tile_size: Vec2,
}

impl MaterialDesc {
    /// Untextured material of a flat colour
    pub fn flat(name: impl Into<String>, color: Vec4) -> Self {
        Self {
            name: name.into(),
            texture: None,
            color,
            tile_size: Vec2::new(1.0, 1.0),
        }
    }

    /// Textured material over a `columns` x `rows` sprite sheet
    pub fn sheet(name: impl Into<String>, texture: TextureId, columns: u32, rows: u32) -> Self {
        Self {
            name: name.into(),
            texture: Some(texture),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            tile_size: Vec2::new(1.0 / columns.max(1) as f32, 1.0 / rows.max(1) as f32),
        }
    }
}
