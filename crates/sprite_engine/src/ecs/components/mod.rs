//! Entity components
//!
//! Plain data plus the local logic that belongs to each component. Cross
//! component coordination lives in the managers and the entity system.

pub mod animator;
pub mod collider;
pub mod movement;
pub mod particle_emitter;
pub mod sprite;
pub mod transform;

pub use animator::{Animation, Animator, AnimatorState};
pub use collider::Collider;
pub use movement::Mover;
pub use particle_emitter::{EmitterDesc, Particle, ParticleEmitter};
pub use sprite::{RenderComponent, SpriteDesc};
pub use transform::{Transform, TransformTracker};
