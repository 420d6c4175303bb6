//! Collider component
//!
//! A view over a rigid body owned by the physics world. The component keeps
//! the handle and a copy of the description it was created from so gameplay
//! code can query shape and layers without touching the physics world.

use crate::physics::{Aabb, BodyDesc, BodyHandle, BodyType, LayerFilter, Shape};
use crate::foundation::math::Vec2;

/// Collider component
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    body: BodyHandle,
    shape: Shape,
    body_type: BodyType,
    sensor: bool,
    layers: LayerFilter,
}

impl Collider {
    /// Wrap a body created from `desc`
    pub fn new(body: BodyHandle, desc: &BodyDesc) -> Self {
        Self {
            body,
            shape: desc.shape.clone(),
            body_type: desc.body_type,
            sensor: desc.sensor,
            layers: desc.layers,
        }
    }

    /// Physics body handle
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Collision shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Body type
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Whether the collider only reports overlaps
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// Layer membership and mask
    pub fn layers(&self) -> LayerFilter {
        self.layers
    }

    /// Bounds when centred at `center`
    pub fn aabb(&self, center: Vec2) -> Aabb {
        Aabb::from_shape(&self.shape, center)
    }

    /// Bounds overlap test against another collider
    pub fn collides(&self, center: Vec2, other: &Self, other_center: Vec2) -> bool {
        self.aabb(center).overlaps(&other.aabb(other_center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::ecs::{EntityId, EntityKey, SystemId};
    use crate::physics::PhysicsWorld;

    #[test]
    fn test_box_collider_overlap() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let desc = BodyDesc::new(Shape::rect(64.0, 64.0));
        let key = EntityKey::new(SystemId(0), EntityId::from_raw(1));
        let handle = world.create_body(&desc, Vec2::zeros(), 0.0, key).unwrap();
        let collider = Collider::new(handle, &desc);

        assert!(collider.collides(Vec2::new(0.0, 0.0), &collider, Vec2::new(32.0, 32.0)));
        assert!(!collider.collides(Vec2::new(0.0, 0.0), &collider, Vec2::new(100.0, 100.0)));
        assert_eq!(collider.body(), handle);
        assert!(!collider.is_sensor());
    }
}
