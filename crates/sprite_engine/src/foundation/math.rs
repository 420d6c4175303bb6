//! Math utilities and types
//!
//! Provides the nalgebra aliases used by the 2D engine and the handful of
//! matrix helpers sprites and cameras need.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Build a 2D model matrix (translate * rotate-about-Z * scale)
///
/// `position.z` is carried into the matrix so sprites can be layered by depth.
pub fn model_matrix(position: Vec3, scale: Vec2, rotation: f32) -> Mat4 {
    Mat4::new_translation(&position)
        * Mat4::from_axis_angle(&Vec3::z_axis(), rotation)
        * Mat4::new_nonuniform_scaling(&Vec3::new(scale.x, scale.y, 1.0))
}

/// Orthographic projection mapping the given box onto Vulkan clip space
///
/// X maps to [-1, 1], Y is flipped so +Y points down on screen (Vulkan
/// convention), and Z maps `near..far` onto [0, 1].
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let mut result = Mat4::identity();
    result[(0, 0)] = 2.0 / (right - left);
    result[(1, 1)] = -2.0 / (top - bottom);
    result[(2, 2)] = 1.0 / (far - near);
    result[(0, 3)] = -(right + left) / (right - left);
    result[(1, 3)] = (top + bottom) / (top - bottom);
    result[(2, 3)] = -near / (far - near);
    result
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_model_matrix_translation_only() {
        let m = model_matrix(Vec3::new(3.0, 4.0, 0.5), Vec2::new(1.0, 1.0), 0.0);
        let p = m.transform_point(&nalgebra::Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(3.0, 4.0, 0.5), epsilon = 1e-6);
    }

    #[test]
    fn test_model_matrix_scale_then_rotate() {
        // Unit X scaled by 2 then rotated 90 degrees lands on +Y * 2
        let m = model_matrix(Vec3::zeros(), Vec2::new(2.0, 1.0), constants::PI / 2.0);
        let v = m.transform_vector(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_maps_corners() {
        let p = orthographic(0.0, 800.0, 0.0, 600.0, 0.0, 1.0);
        let top_right = p.transform_point(&nalgebra::Point3::new(800.0, 600.0, 0.0));
        assert_relative_eq!(top_right.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(top_right.y, -1.0, epsilon = 1e-6);

        let origin = p.transform_point(&nalgebra::Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(origin.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(origin.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(origin.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_utils() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI);
        assert_relative_eq!(utils::lerp(2.0, 4.0, 0.25), 2.5);
    }
}
