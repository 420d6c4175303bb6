//! Registered cameras and the active one

use crate::render::Camera2D;

/// Handle of a registered camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(usize);

/// Cameras registered with a scene
///
/// The first camera added becomes active. Switching is just selecting
/// another id; cameras are never dropped while the scene lives.
#[derive(Debug, Default)]
pub struct CameraSet {
    cameras: Vec<(String, Camera2D)>,
    active: Option<CameraId>,
}

impl CameraSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a camera
    pub fn add(&mut self, name: impl Into<String>, camera: Camera2D) -> CameraId {
        let id = CameraId(self.cameras.len());
        self.cameras.push((name.into(), camera));
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    /// Camera by id
    pub fn get(&self, id: CameraId) -> Option<&Camera2D> {
        self.cameras.get(id.0).map(|(_, camera)| camera)
    }

    /// Camera by id, mutably
    pub fn get_mut(&mut self, id: CameraId) -> Option<&mut Camera2D> {
        self.cameras.get_mut(id.0).map(|(_, camera)| camera)
    }

    /// Camera id by name
    pub fn find(&self, name: &str) -> Option<CameraId> {
        self.cameras.iter().position(|(n, _)| n == name).map(CameraId)
    }

    /// Make `id` the active camera; false if it is not registered
    pub fn set_active(&mut self, id: CameraId) -> bool {
        if id.0 < self.cameras.len() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Active camera id
    pub fn active_id(&self) -> Option<CameraId> {
        self.active
    }

    /// Active camera
    pub fn active(&self) -> Option<&Camera2D> {
        self.get(self.active?)
    }

    /// Active camera, mutably
    pub fn active_mut(&mut self) -> Option<&mut Camera2D> {
        let id = self.active?;
        self.get_mut(id)
    }

    /// Resize every camera's viewport
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        for (_, camera) in &mut self.cameras {
            camera.set_viewport(width, height);
        }
    }

    /// Number of cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether no camera is registered
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    #[test]
    fn test_first_camera_is_active_and_switchable() {
        let mut cameras = CameraSet::new();
        assert!(cameras.active().is_none());

        let main = cameras.add("main", Camera2D::new(800.0, 600.0));
        let map = cameras.add("map", Camera2D::new(800.0, 600.0).with_position(Vec2::new(5.0, 5.0)));
        assert_eq!(cameras.active_id(), Some(main));

        assert!(cameras.set_active(map));
        assert_eq!(cameras.active().unwrap().position, Vec2::new(5.0, 5.0));
        assert_eq!(cameras.find("map"), Some(map));
        assert!(!cameras.set_active(CameraId(7)));
        assert_eq!(cameras.active_id(), Some(map));
    }
}
