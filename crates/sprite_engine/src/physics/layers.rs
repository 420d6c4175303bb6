//! Collision layer filtering
//!
//! An entity sits on one or more layers and collides with the layers in its
//! mask. Two colliders interact only when each one's layer is in the other's
//! mask.

use bitflags::bitflags;
use rapier2d::prelude::{Group, InteractionGroups};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision layer bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        /// Player character layer
        const PLAYER = 1 << 0;
        /// Enemy character layer
        const ENEMY = 1 << 1;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 2;
        /// Static environment geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger volumes
        const TRIGGER = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 5;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::all()
    }
}

/// Layer membership plus collision mask for one collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFilter {
    /// Layers this collider is on
    pub layer: CollisionLayers,
    /// Layers this collider collides with
    pub mask: CollisionLayers,
}

impl Default for LayerFilter {
    fn default() -> Self {
        Self {
            layer: CollisionLayers::all(),
            mask: CollisionLayers::all(),
        }
    }
}

impl LayerFilter {
    /// Filter on `layer` colliding with `mask`
    pub const fn new(layer: CollisionLayers, mask: CollisionLayers) -> Self {
        Self { layer, mask }
    }

    /// Check if two filters should collide (mutual membership)
    pub fn should_collide(&self, other: &Self) -> bool {
        self.layer.intersects(other.mask) && other.layer.intersects(self.mask)
    }

    /// Convert to rapier interaction groups
    pub fn to_interaction_groups(self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.layer.bits()),
            Group::from_bits_truncate(self.mask.bits()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_collide_mutual() {
        let player = LayerFilter::new(CollisionLayers::PLAYER, CollisionLayers::ENEMY);
        let enemy = LayerFilter::new(CollisionLayers::ENEMY, CollisionLayers::PLAYER);
        assert!(player.should_collide(&enemy));
        assert!(enemy.should_collide(&player));
    }

    #[test]
    fn test_should_not_collide_one_way() {
        let player = LayerFilter::new(CollisionLayers::PLAYER, CollisionLayers::ENEMY);
        let enemy = LayerFilter::new(CollisionLayers::ENEMY, CollisionLayers::PROJECTILE);
        assert!(!player.should_collide(&enemy));
    }

    #[test]
    fn test_default_collides_with_everything() {
        let a = LayerFilter::default();
        let b = LayerFilter::new(CollisionLayers::PICKUP, CollisionLayers::PLAYER);
        assert!(a.should_collide(&b));
    }
}
