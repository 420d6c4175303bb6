//! Per-object uniform data layout
//!
//! Every visual component reduces to one [`SpriteUniform`]: 24 floats in a
//! fixed order the backend binds directly.
//!
//! | floats  | field        |
//! |---------|--------------|
//! | 0..16   | model matrix (column-major) |
//! | 16..20  | colour (RGBA) |
//! | 20..22  | tile offset (texture space) |
//! | 22..24  | tile scale (texture space) |

use crate::foundation::math::{Mat4, Vec2, Vec4};
use bytemuck::{Pod, Zeroable};

/// Number of floats in a [`SpriteUniform`]
pub const SPRITE_UNIFORM_FLOATS: usize = 24;

/// Uniform blob for one sprite or particle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteUniform {
    /// Model matrix, column-major
    pub model: [[f32; 4]; 4],
    /// Colour multiplier
    pub color: [f32; 4],
    /// Texture-space offset of the current tile
    pub tile_offset: [f32; 2],
    /// Texture-space size of one tile
    pub tile_scale: [f32; 2],
}

impl Default for SpriteUniform {
    fn default() -> Self {
        Self::new(&Mat4::identity(), Vec4::new(1.0, 1.0, 1.0, 1.0), Vec2::zeros(), Vec2::new(1.0, 1.0))
    }
}

impl SpriteUniform {
    /// Build the blob from its parts
    pub fn new(model: &Mat4, color: Vec4, tile_offset: Vec2, tile_scale: Vec2) -> Self {
        Self {
            model: (*model).into(),
            color: color.into(),
            tile_offset: tile_offset.into(),
            tile_scale: tile_scale.into(),
        }
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Floats in binding order
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(bytemuck::bytes_of(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_layout_is_24_floats() {
        assert_eq!(std::mem::size_of::<SpriteUniform>(), SPRITE_UNIFORM_FLOATS * 4);
        assert_eq!(SpriteUniform::default().as_floats().len(), SPRITE_UNIFORM_FLOATS);
    }

    #[test]
    fn test_field_order() {
        let model = Mat4::new_translation(&Vec3::new(7.0, 8.0, 9.0));
        let uniform = SpriteUniform::new(
            &model,
            Vec4::new(0.1, 0.2, 0.3, 0.4),
            Vec2::new(0.5, 0.25),
            Vec2::new(0.125, 0.5),
        );
        let floats = uniform.as_floats();
        // Column-major: translation sits in the fourth column
        assert_eq!(&floats[12..15], &[7.0, 8.0, 9.0]);
        assert_eq!(&floats[16..20], &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(&floats[20..22], &[0.5, 0.25]);
        assert_eq!(&floats[22..24], &[0.125, 0.5]);
        assert_eq!(uniform.as_bytes().len(), 96);
    }
}
