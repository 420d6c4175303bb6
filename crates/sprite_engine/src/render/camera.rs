//! 2D camera

use crate::foundation::math::{self, Mat4, Vec2, Vec3};

/// Orthographic camera looking at a point in world space
///
/// One world unit maps to one pixel at zoom 1. The camera position is the
/// centre of the view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    /// Centre of the view in world space
    pub position: Vec2,
    /// Magnification; 2.0 shows half as much of the world
    pub zoom: f32,
    viewport: Vec2,
}

impl Camera2D {
    /// Camera centred on the origin with the given viewport size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            position: Vec2::zeros(),
            zoom: 1.0,
            viewport: Vec2::new(width, height),
        }
    }

    /// Builder pattern: set position
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Track a new surface size
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    /// View matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(-self.position.x, -self.position.y, 0.0))
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        let zoom = self.zoom.max(f32::EPSILON);
        let half = self.viewport * 0.5 / zoom;
        math::orthographic(-half.x, half.x, -half.y, half.y, -100.0, 100.0)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Convert a screen point (pixels, origin top-left) into world space
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let zoom = self.zoom.max(f32::EPSILON);
        let centered = Vec2::new(screen.x - self.viewport.x * 0.5, self.viewport.y * 0.5 - screen.y);
        self.position + centered / zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_centre_maps_to_clip_origin() {
        let camera = Camera2D::new(800.0, 600.0).with_position(Vec2::new(100.0, 50.0));
        let clip = camera.view_projection() * Vec4::new(100.0, 50.0, 0.0, 1.0);
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_view_edges() {
        let camera = Camera2D::new(800.0, 600.0);
        let right = camera.view_projection() * Vec4::new(400.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(right.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_screen_to_world() {
        let mut camera = Camera2D::new(800.0, 600.0).with_position(Vec2::new(10.0, 10.0));
        assert_relative_eq!(camera.screen_to_world(Vec2::new(400.0, 300.0)), Vec2::new(10.0, 10.0));
        camera.zoom = 2.0;
        assert_relative_eq!(camera.screen_to_world(Vec2::new(800.0, 0.0)), Vec2::new(210.0, 160.0));
    }
}
