//! Entity/component core
//!
//! Entities are ids; components live in per-type [`ComponentStore`]s owned
//! by an [`EntitySystem`]. Gameplay logic is an [`EntityBehavior`] per
//! entity. Structural changes requested during callbacks go through the
//! [`CommandQueue`] and are applied after the update pass.

pub mod behavior;
pub mod builder;
pub mod commands;
pub mod components;
pub mod entity;
pub mod managers;
pub mod storage;
pub mod system;

pub use behavior::{CollisionContext, EntityBehavior, InitContext, UpdateContext};
pub use builder::EntityBuilder;
pub use commands::{Command, CommandQueue, SpawnFn};
pub use entity::{EntityAllocator, EntityId, EntityKey, SystemId};
pub use managers::Managers;
pub use storage::ComponentStore;
pub use system::EntitySystem;

use crate::physics::PhysicsError;
use thiserror::Error;

/// Entity configuration errors
///
/// These indicate a mistake in client code (wrong attach order, typo in an
/// animation name) and are returned rather than recovered from.
#[derive(Debug, Error)]
pub enum EcsError {
    /// A component was attached before the component it depends on
    #[error("Entity {entity}: {required_by} requires a {component} component")]
    MissingComponent {
        /// Entity being configured
        entity: EntityId,
        /// Component that is missing
        component: &'static str,
        /// What needed it
        required_by: &'static str,
    },

    /// An exclusive component was attached twice
    #[error("Entity {entity} already has a {component} component")]
    DuplicateComponent {
        /// Entity being configured
        entity: EntityId,
        /// Component kind
        component: &'static str,
    },

    /// Two components that cannot coexist on one entity
    #[error("Entity {entity}: {component} cannot be combined with {existing}")]
    ConflictingComponent {
        /// Entity being configured
        entity: EntityId,
        /// Component being attached
        component: &'static str,
        /// Component already present
        existing: &'static str,
    },

    /// Animation name not in the animator's table
    #[error("Unknown animation '{0}'")]
    UnknownAnimation(String),

    /// Entity id not alive in this system
    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    /// Material name never registered
    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    /// Physics rejected a body description
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
