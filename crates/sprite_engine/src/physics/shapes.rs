//! Collision shapes and axis-aligned bounds
//!
//! Shapes are described in engine units (pixels). Conversion to physics
//! units happens inside [`super::PhysicsWorld`].

use super::PhysicsError;
use crate::foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Collision shape attached to a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box (in body space) of full `width` x `height`
    Box {
        /// Full width
        width: f32,
        /// Full height
        height: f32,
    },
    /// Circle of `radius`
    Circle {
        /// Radius
        radius: f32,
    },
    /// Convex polygon; points relative to the body origin
    Polygon {
        /// Hull points
        points: Vec<Vec2>,
    },
}

impl Shape {
    /// Box from full extents
    pub const fn rect(width: f32, height: f32) -> Self {
        Self::Box { width, height }
    }

    /// Circle from radius
    pub const fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    /// Reject degenerate shapes before they reach the physics engine
    pub fn validate(&self) -> Result<(), PhysicsError> {
        match self {
            Self::Box { width, height } if *width <= 0.0 || *height <= 0.0 => Err(
                PhysicsError::InvalidShape(format!("box extents must be positive, got {width}x{height}")),
            ),
            Self::Circle { radius } if *radius <= 0.0 => Err(PhysicsError::InvalidShape(format!(
                "circle radius must be positive, got {radius}"
            ))),
            Self::Polygon { points } if points.len() < 3 => Err(PhysicsError::InvalidShape(format!(
                "polygon needs at least 3 points, got {}",
                points.len()
            ))),
            _ => Ok(()),
        }
    }

    /// Half extents of the shape's local bounding box
    pub fn half_extents(&self) -> Vec2 {
        match self {
            Self::Box { width, height } => Vec2::new(width * 0.5, height * 0.5),
            Self::Circle { radius } => Vec2::new(*radius, *radius),
            Self::Polygon { points } => points
                .iter()
                .fold(Vec2::zeros(), |acc, p| Vec2::new(acc.x.max(p.x.abs()), acc.y.max(p.y.abs()))),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Box spanning `min..max`
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounds of `shape` centred at `center` (rotation ignored)
    pub fn from_shape(shape: &Shape, center: Vec2) -> Self {
        match shape {
            Shape::Polygon { points } => {
                let mut min = Vec2::new(f32::MAX, f32::MAX);
                let mut max = Vec2::new(f32::MIN, f32::MIN);
                for p in points {
                    min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
                    max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
                }
                Self::new(center + min, center + max)
            }
            _ => {
                let half = shape.half_extents();
                Self::new(center - half, center + half)
            }
        }
    }

    /// Strict overlap test; touching edges do not count
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Whether `point` lies inside (inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Centre point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_boxes() {
        let shape = Shape::rect(64.0, 64.0);
        let a = Aabb::from_shape(&shape, Vec2::new(0.0, 0.0));
        let b = Aabb::from_shape(&shape, Vec2::new(32.0, 32.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_separated_boxes() {
        let shape = Shape::rect(64.0, 64.0);
        let a = Aabb::from_shape(&shape, Vec2::new(0.0, 0.0));
        let b = Aabb::from_shape(&shape, Vec2::new(100.0, 100.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let shape = Shape::rect(64.0, 64.0);
        let a = Aabb::from_shape(&shape, Vec2::new(0.0, 0.0));
        let b = Aabb::from_shape(&shape, Vec2::new(64.0, 0.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_polygon_bounds() {
        let shape = Shape::Polygon {
            points: vec![Vec2::new(-1.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(0.0, 3.0)],
        };
        let aabb = Aabb::from_shape(&shape, Vec2::new(10.0, 10.0));
        assert_eq!(aabb.min, Vec2::new(9.0, 10.0));
        assert_eq!(aabb.max, Vec2::new(12.0, 13.0));
        assert!(aabb.contains(Vec2::new(10.0, 11.0)));
    }

    #[test]
    fn test_validate_rejects_degenerate_shapes() {
        assert!(Shape::rect(0.0, 5.0).validate().is_err());
        assert!(Shape::circle(-1.0).validate().is_err());
        assert!(Shape::Polygon { points: vec![Vec2::zeros(); 2] }.validate().is_err());
        assert!(Shape::circle(3.0).validate().is_ok());
    }
}
