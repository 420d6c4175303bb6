//! Arena entity behaviors

use sprite_engine::ecs::{CollisionContext, EntityBehavior, EntityKey, SystemId, UpdateContext};
use sprite_engine::foundation::math::Vec2;
use sprite_engine::input::KeyCode;
use sprite_engine::physics::BodyHandle;
use sprite_engine::prelude::{EmitterDesc, Transform};
use sprite_engine::scene::Scene;
use std::any::Any;

/// Keyboard-steered player
#[derive(Debug)]
pub struct Player {
    /// Pixels per second
    pub speed: f32,
    /// Enemies touched so far
    pub hits: u32,
}

impl EntityBehavior for Player {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let direction = Vec2::new(
            ctx.input.axis(KeyCode::A, KeyCode::D),
            ctx.input.axis(KeyCode::S, KeyCode::W),
        );
        let velocity = if direction == Vec2::zeros() {
            Vec2::zeros()
        } else {
            direction.normalize() * self.speed
        };
        let key = ctx.key();
        ctx.commands.set_linear_velocity(key, velocity);
    }

    fn on_collision(&mut self, _ctx: &mut CollisionContext<'_>, other: EntityKey) {
        self.hits += 1;
        log::debug!("Player touched {other}");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Chases the player; bursts into an explosion on contact
#[derive(Debug)]
pub struct Enemy {
    /// Player body to chase
    pub target: BodyHandle,
    /// System the player lives in
    pub player_system: SystemId,
    /// Pixels per second
    pub speed: f32,
    /// System explosions are spawned into
    pub effects: SystemId,
    /// Explosion particles
    pub explosion: EmitterDesc,
    /// Seconds an explosion lasts
    pub explosion_time: f32,
}

impl EntityBehavior for Enemy {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let (Some((target, _)), Some(transform)) = (ctx.physics.body_position(self.target), ctx.transform()) else {
            return;
        };
        let offset = target - transform.position_2d();
        if offset.norm() > f32::EPSILON {
            let key = ctx.key();
            ctx.commands.set_linear_velocity(key, offset.normalize() * self.speed);
        }
    }

    fn on_collision(&mut self, ctx: &mut CollisionContext<'_>, other: EntityKey) {
        if other.system != self.player_system {
            return;
        }
        let Some(position) = ctx.transform().map(Transform::position_2d) else {
            return;
        };
        let key = ctx.key();
        ctx.commands.despawn(key);

        let effects = self.effects;
        let explosion = self.explosion.clone();
        let ttl = self.explosion_time;
        ctx.commands.spawn(move |scene: &mut Scene| {
            scene
                .spawn(effects, Explosion { ttl })?
                .attach_transform(Transform::at(position.x, position.y))?
                .attach_emitter(explosion)?
                .build();
            Ok(())
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Short-lived particle burst
#[derive(Debug)]
pub struct Explosion {
    /// Seconds left
    pub ttl: f32,
}

impl EntityBehavior for Explosion {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.ttl -= ctx.delta_time;
        if self.ttl <= 0.0 {
            ctx.despawn_self();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
