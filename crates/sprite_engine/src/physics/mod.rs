//! Physics module
//!
//! Wraps a rapier2d rigid-body world behind the contract the entity core
//! needs: fixed-step stepping with configured solver iterations, body
//! creation from a shape plus material properties, and collision-begin
//! events resolved back to entity keys.
//!
//! The engine works in pixels; rapier works in metres. Everything crossing
//! this module's API is in pixels and converted with `pixels_per_meter`.

pub mod layers;
pub mod shapes;
pub mod user_data;

pub use layers::{CollisionLayers, LayerFilter};
pub use shapes::{Aabb, Shape};

use crate::config::PhysicsConfig;
use crate::ecs::EntityKey;
use crate::foundation::logging::fatal;
use crate::foundation::math::Vec2;
use rapier2d::prelude::*;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Handle of a rigid body owned by the physics world
pub type BodyHandle = RigidBodyHandle;

/// Physics errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Shape description the physics engine cannot build
    #[error("Invalid collision shape: {0}")]
    InvalidShape(String),
}

/// How the physics engine moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    /// Moved by forces and contacts
    #[default]
    Dynamic,
    /// Never moves
    Fixed,
    /// Moved only by explicit position updates
    Kinematic,
}

/// Description of a body plus its single collider
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Collision shape in pixels
    pub shape: Shape,
    /// Body type
    pub body_type: BodyType,
    /// Density (mass per square metre)
    pub density: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Restitution (bounciness)
    pub restitution: f32,
    /// Sensors report overlaps but produce no contact response
    pub sensor: bool,
    /// Layer membership and mask
    pub layers: LayerFilter,
    /// Prevent the body from rotating
    pub fixed_rotation: bool,
    /// Linear damping
    pub linear_damping: f32,
    /// Multiplier on world gravity
    pub gravity_scale: f32,
}

impl BodyDesc {
    /// Dynamic body with default material
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            body_type: BodyType::Dynamic,
            density: 1.0,
            friction: 0.3,
            restitution: 0.0,
            sensor: false,
            layers: LayerFilter::default(),
            fixed_rotation: false,
            linear_damping: 0.0,
            gravity_scale: 1.0,
        }
    }

    /// Builder pattern: set body type
    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// Builder pattern: set density, friction and restitution
    pub fn with_material(mut self, density: f32, friction: f32, restitution: f32) -> Self {
        self.density = density;
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    /// Builder pattern: make this a sensor
    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Builder pattern: set collision layers
    pub fn with_layers(mut self, layers: LayerFilter) -> Self {
        self.layers = layers;
        self
    }

    /// Builder pattern: lock rotation
    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    /// Builder pattern: set linear damping
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }
}

/// Two entities whose colliders started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    /// First entity
    pub a: EntityKey,
    /// Second entity
    pub b: EntityKey,
}

/// Collects collision-begin events raised during a step
#[derive(Default)]
struct CollisionCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl EventHandler for CollisionCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(first, second, _) = event {
            self.started
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((first, second));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

impl CollisionCollector {
    fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        std::mem::take(&mut *self.started.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Rigid-body world
///
/// Exclusively owns every body. Colliders in the entity core are views that
/// hold a [`BodyHandle`] into this world.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: CollisionCollector,
    pixels_per_meter: f32,
    step_count: u64,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new(config: &PhysicsConfig) -> Self {
        let pixels_per_meter = config.pixels_per_meter;
        let integration_parameters = IntegrationParameters {
            dt: config.timestep,
            max_velocity_iterations: config.velocity_iterations.max(1),
            max_stabilization_iterations: config.position_iterations.max(1),
            ..IntegrationParameters::default()
        };

        log::debug!(
            "Physics world: dt={:.4}s, {} velocity / {} position iterations, {} px/m",
            config.timestep,
            config.velocity_iterations,
            config.position_iterations,
            pixels_per_meter
        );

        Self {
            gravity: vector![
                config.gravity[0] / pixels_per_meter,
                config.gravity[1] / pixels_per_meter
            ],
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: CollisionCollector::default(),
            pixels_per_meter,
            step_count: 0,
        }
    }

    /// Create a body with one collider, tagged with `key`
    pub fn create_body(
        &mut self,
        desc: &BodyDesc,
        position: Vec2,
        rotation: f32,
        key: EntityKey,
    ) -> Result<BodyHandle, PhysicsError> {
        desc.shape.validate()?;
        let collider = self.build_collider(desc, key)?;

        let builder = match desc.body_type {
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
            BodyType::Fixed => RigidBodyBuilder::fixed(),
            BodyType::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let mut builder = builder
            .translation(self.to_physics(position))
            .rotation(rotation)
            .linear_damping(desc.linear_damping)
            .gravity_scale(desc.gravity_scale)
            .user_data(user_data::encode(key));
        if desc.fixed_rotation {
            builder = builder.lock_rotations();
        }

        let handle = self.bodies.insert(builder.build());
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        log::trace!("Created {:?} body for {key}", desc.body_type);
        Ok(handle)
    }

    fn build_collider(&self, desc: &BodyDesc, key: EntityKey) -> Result<Collider, PhysicsError> {
        let scale = self.pixels_per_meter;
        let builder = match &desc.shape {
            Shape::Box { width, height } => ColliderBuilder::cuboid(width * 0.5 / scale, height * 0.5 / scale),
            Shape::Circle { radius } => ColliderBuilder::ball(radius / scale),
            Shape::Polygon { points } => {
                let hull: Vec<Point<Real>> = points.iter().map(|p| point![p.x / scale, p.y / scale]).collect();
                ColliderBuilder::convex_hull(&hull)
                    .ok_or_else(|| PhysicsError::InvalidShape("polygon points have no convex hull".into()))?
            }
        };
        Ok(builder
            .density(desc.density)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .sensor(desc.sensor)
            .collision_groups(desc.layers.to_interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(user_data::encode(key))
            .build())
    }

    /// Destroy a body and its collider; unknown handles are ignored
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let removed = self
            .bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some();
        if removed {
            log::trace!("Removed body {handle:?}");
        }
        removed
    }

    /// Whether the world still holds `handle`
    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Entity key a body was tagged with
    pub fn body_key(&self, handle: BodyHandle) -> Option<EntityKey> {
        self.bodies.get(handle).map(|body| user_data::decode_or_fatal(body.user_data))
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Advance one fixed sub-step and return the pairs that began touching
    ///
    /// Structural changes (body creation/removal) must not happen while this
    /// runs; callers queue them and apply after the step returns.
    pub fn step(&mut self) -> Vec<CollisionPair> {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collector,
        );
        self.step_count += 1;

        let mut pairs = Vec::new();
        for (first, second) in self.collector.drain() {
            let a = self.collider_key(first);
            let b = self.collider_key(second);
            if a != b {
                pairs.push(CollisionPair { a, b });
            }
        }
        pairs
    }

    fn collider_key(&self, handle: ColliderHandle) -> EntityKey {
        match self.colliders.get(handle) {
            Some(collider) => user_data::decode_or_fatal(collider.user_data),
            None => fatal(format!("collision reported for unknown collider {handle:?}")),
        }
    }

    /// Body position (pixels) and rotation (radians)
    pub fn body_position(&self, handle: BodyHandle) -> Option<(Vec2, f32)> {
        self.bodies
            .get(handle)
            .map(|body| (self.to_engine(body.translation()), body.rotation().angle()))
    }

    /// Body linear velocity in pixels per second
    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|body| self.to_engine(body.linvel()))
    }

    /// Apply an impulse (pixel-scaled) at the centre of mass
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        let impulse = self.to_physics(impulse);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(impulse, true);
        }
    }

    /// Set linear velocity in pixels per second
    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        let velocity = self.to_physics(velocity);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(velocity, true);
        }
    }

    /// Move a body to a position without simulating the motion
    pub fn teleport(&mut self, handle: BodyHandle, position: Vec2) {
        let position = self.to_physics(position);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(position, true);
        }
    }

    fn to_physics(&self, v: Vec2) -> Vector<Real> {
        vector![v.x / self.pixels_per_meter, v.y / self.pixels_per_meter]
    }

    fn to_engine(&self, v: &Vector<Real>) -> Vec2 {
        Vec2::new(v.x * self.pixels_per_meter, v.y * self.pixels_per_meter)
    }
}
