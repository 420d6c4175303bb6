//! Movement component for entities that move without a physics body

use crate::foundation::math::Vec2;

/// Kinematic mover: velocity integration with damping and a speed limit
#[derive(Debug, Clone, PartialEq)]
pub struct Mover {
    /// Linear velocity in pixels per second
    pub velocity: Vec2,

    /// Linear acceleration in pixels per second squared
    pub acceleration: Vec2,

    /// Angular velocity in radians per second
    pub angular_velocity: f32,

    /// Maximum speed limit (0 = no limit)
    pub max_speed: f32,

    /// Damping factor for velocity (0 = no damping)
    pub linear_damping: f32,

    /// Whether movement is enabled
    pub enabled: bool,
}

impl Default for Mover {
    fn default() -> Self {
        Self::new()
    }
}

impl Mover {
    /// Create a stationary mover
    pub fn new() -> Self {
        Self {
            velocity: Vec2::zeros(),
            acceleration: Vec2::zeros(),
            angular_velocity: 0.0,
            max_speed: 0.0,
            linear_damping: 0.0,
            enabled: true,
        }
    }

    /// Create a mover with initial velocity
    pub fn with_velocity(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Self::new()
        }
    }

    /// Builder pattern: set angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Builder pattern: set speed limit
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed.max(0.0);
        self
    }

    /// Builder pattern: set linear damping
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping.max(0.0);
        self
    }

    /// Integrate velocity over `delta_time`
    pub fn integrate(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }

        self.velocity += self.acceleration * delta_time;

        if self.max_speed > 0.0 {
            let speed = self.velocity.norm();
            if speed > self.max_speed {
                self.velocity = self.velocity / speed * self.max_speed;
            }
        }

        if self.linear_damping > 0.0 {
            self.velocity *= (1.0 - self.linear_damping * delta_time).max(0.0);
        }
    }

    /// Position delta for this tick
    pub fn position_delta(&self, delta_time: f32) -> Vec2 {
        if !self.enabled {
            return Vec2::zeros();
        }
        self.velocity * delta_time
    }

    /// Rotation delta for this tick
    pub fn rotation_delta(&self, delta_time: f32) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        self.angular_velocity * delta_time
    }

    /// Stop all movement
    pub fn stop(&mut self) {
        self.velocity = Vec2::zeros();
        self.acceleration = Vec2::zeros();
        self.angular_velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_speed_limit() {
        let mut mover = Mover::with_velocity(Vec2::new(300.0, 400.0)).with_max_speed(100.0);
        mover.integrate(0.1);
        assert_relative_eq!(mover.velocity.norm(), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn test_damping_slows_down() {
        let mut mover = Mover::with_velocity(Vec2::new(10.0, 0.0)).with_linear_damping(0.5);
        mover.integrate(1.0);
        assert_relative_eq!(mover.velocity.x, 5.0);
    }

    #[test]
    fn test_disabled_mover_is_still() {
        let mut mover = Mover::with_velocity(Vec2::new(10.0, 0.0)).with_angular_velocity(1.0);
        mover.enabled = false;
        assert_eq!(mover.position_delta(1.0), Vec2::zeros());
        assert_eq!(mover.rotation_delta(1.0), 0.0);
    }
}
