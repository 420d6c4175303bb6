//! Transform component
//!
//! Position, scale and rotation of an entity in 2D (with a z used for draw
//! layering), plus an optional parent for hierarchical composition.
//!
//! Change tracking comes in two flavours:
//! - a one-shot `updated` flag, set by every mutator and cleared by
//!   [`Transform::take_updated`]. Only one reader can consume it.
//! - a `version` stamp drawn from one process-wide counter, so it grows
//!   with every change and no two changes share a stamp. Each reader keeps
//!   its own [`TransformTracker`] and asks whether the version moved since
//!   it last looked, so any number of subsystems can observe the same change.

use crate::ecs::{ComponentStore, EntityId};
use crate::foundation::math::{self, Mat4, Vec2, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum parent chain walked before the hierarchy is treated as cyclic
const MAX_HIERARCHY_DEPTH: usize = 32;

/// Low bits of a world version holding the chain depth
const DEPTH_BITS: u32 = 6;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Transform component
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    scale: Vec2,
    rotation: f32,
    parent: Option<EntityId>,
    version: u64,
    updated: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            parent: None,
            version: next_stamp(),
            updated: true,
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform at a 2D position (z = 0)
    pub fn at(x: f32, y: f32) -> Self {
        Self::default().with_position(Vec3::new(x, y, 0.0))
    }

    /// Builder pattern: set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: set scale
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Builder pattern: set rotation in radians
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: set parent entity
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Position projected onto the XY plane
    pub fn position_2d(&self) -> Vec2 {
        self.position.xy()
    }

    /// Scale
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Parent entity, if any
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Set position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.touch();
    }

    /// Set the XY position, keeping z
    pub fn set_position_2d(&mut self, position: Vec2) {
        self.position.x = position.x;
        self.position.y = position.y;
        self.touch();
    }

    /// Move by a delta
    pub fn translate(&mut self, delta: Vec2) {
        self.position.x += delta.x;
        self.position.y += delta.y;
        self.touch();
    }

    /// Set scale
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.touch();
    }

    /// Set rotation in radians
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.touch();
    }

    /// Rotate by a delta in radians
    pub fn rotate(&mut self, delta: f32) {
        self.rotation += delta;
        self.touch();
    }

    /// Set XY position and rotation together (one version bump)
    pub fn set_pose(&mut self, position: Vec2, rotation: f32) {
        self.position.x = position.x;
        self.position.y = position.y;
        self.rotation = rotation;
        self.touch();
    }

    /// Set or clear the parent
    pub fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
        self.touch();
    }

    /// Read and clear the one-shot change flag
    ///
    /// Returns true at most once per mutation. Subsystems that need their
    /// own view of changes use [`TransformTracker`] instead.
    pub fn take_updated(&mut self) -> bool {
        std::mem::replace(&mut self.updated, false)
    }

    /// Change stamp, replaced by a larger one on every mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Local model matrix (no parent applied)
    pub fn local_matrix(&self) -> Mat4 {
        math::model_matrix(self.position, self.scale, self.rotation)
    }

    fn touch(&mut self) {
        self.version = next_stamp();
        self.updated = true;
    }
}

/// Per-reader change detector over a transform version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformTracker {
    last_seen: Option<u64>,
}

impl TransformTracker {
    /// Create a tracker that reports the first version it sees as a change
    pub const fn new() -> Self {
        Self { last_seen: None }
    }

    /// Whether `version` differs from the last one this tracker observed
    pub fn changed(&mut self, version: u64) -> bool {
        if self.last_seen == Some(version) {
            false
        } else {
            self.last_seen = Some(version);
            true
        }
    }

    /// Forget the last observation
    pub fn reset(&mut self) {
        self.last_seen = None;
    }
}

impl ComponentStore<Transform> {
    /// World matrix of `id`, composed through its parent chain
    ///
    /// A parent that no longer exists ends the chain: the entity is treated
    /// as a root. Returns `None` when `id` has no transform.
    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        let mut matrix = self.get(id)?.local_matrix();
        let mut current = self.get(id)?.parent();
        let mut depth = 0;
        while let Some(parent_id) = current {
            if depth == MAX_HIERARCHY_DEPTH {
                log::warn!("Transform hierarchy of {id} deeper than {MAX_HIERARCHY_DEPTH}; truncating");
                break;
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            matrix = parent.local_matrix() * matrix;
            current = parent.parent();
            depth += 1;
        }
        Some(matrix)
    }

    /// World position of `id` (translation column of the world matrix)
    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]))
    }

    /// Combined version of `id` and its ancestors
    ///
    /// The newest stamp on the chain, shifted left, with the chain depth in
    /// the low bits. Any mutation or reparent on the chain produces a stamp
    /// newer than every earlier one, and a removed ancestor shortens the
    /// chain, so either half of the value moves.
    pub fn world_version(&self, id: EntityId) -> Option<u64> {
        let transform = self.get(id)?;
        let mut newest = transform.version();
        let mut current = transform.parent();
        let mut depth: u64 = 0;
        while let Some(parent_id) = current {
            if depth == MAX_HIERARCHY_DEPTH as u64 {
                break;
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            newest = newest.max(parent.version());
            current = parent.parent();
            depth += 1;
        }
        Some((newest << DEPTH_BITS) | depth)
    }
}
