//! Particle emitter component
//!
//! A fixed pool of particles flying out from the owning entity. Each
//! particle's direction and speed multiplier is drawn once, at construction,
//! from a seeded RNG, so the whole simulation is a pure function of the seed,
//! the elapsed ticks and the entity's position.

use crate::foundation::math::{constants::TAU, Mat4, Vec2, Vec3, Vec4};
use crate::render::{Drawable, IndexBufferId, MaterialId, SpriteUniform, VertexBufferId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Description used to attach an emitter
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterDesc {
    /// Pool size
    pub count: usize,
    /// Seconds a particle lives before it respawns at the origin
    pub lifetime: f32,
    /// Pixels per second at a speed multiplier of 1
    pub speed: f32,
    /// Seed for the per-particle offsets
    pub seed: u64,
    /// Rendered size of one particle in pixels
    pub size: Vec2,
    /// Base colour; alpha fades to zero over the lifetime
    pub color: Vec4,
    /// Material
    pub material: MaterialId,
    /// Quad vertex buffer
    pub vertex_buffer: VertexBufferId,
    /// Quad index buffer
    pub index_buffer: IndexBufferId,
    /// Draw layer
    pub layer: i32,
}

impl EmitterDesc {
    /// Emitter with 32 particles living one second
    pub fn new(material: MaterialId, vertex_buffer: VertexBufferId, index_buffer: IndexBufferId) -> Self {
        Self {
            count: 32,
            lifetime: 1.0,
            speed: 64.0,
            seed: 0,
            size: Vec2::new(4.0, 4.0),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            material,
            vertex_buffer,
            index_buffer,
            layer: 1,
        }
    }

    /// Builder pattern: pool size and lifetime
    pub fn with_pool(mut self, count: usize, lifetime: f32) -> Self {
        self.count = count;
        self.lifetime = lifetime;
        self
    }

    /// Builder pattern: speed in pixels per second
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Builder pattern: RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: colour
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

/// One particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World position
    pub position: Vec2,
    /// Seconds since (re)spawn
    pub age: f32,
    /// Dead particles are not drawn and do not respawn
    pub alive: bool,
}

/// Particle emitter component
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    desc: EmitterDesc,
    particles: Vec<Particle>,
    offsets: Vec<Vec2>,
    emitting: bool,
}

impl ParticleEmitter {
    /// Build the pool and draw the per-particle offsets
    ///
    /// Initial ages are staggered across the lifetime so the emitter starts
    /// in a steady state instead of releasing everything in one burst.
    pub fn new(desc: EmitterDesc) -> Self {
        let mut rng = StdRng::seed_from_u64(desc.seed);
        let offsets = (0..desc.count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let magnitude = rng.gen_range(0.5..1.0);
                Vec2::new(angle.cos(), angle.sin()) * magnitude
            })
            .collect();
        let lifetime = desc.lifetime.max(f32::EPSILON);
        let particles = (0..desc.count)
            .map(|i| Particle {
                position: Vec2::zeros(),
                age: lifetime * i as f32 / desc.count as f32,
                alive: true,
            })
            .collect();
        Self {
            desc,
            particles,
            offsets,
            emitting: true,
        }
    }

    /// Description this emitter was built from
    pub fn desc(&self) -> &EmitterDesc {
        &self.desc
    }

    /// The particle pool
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn alive_count(&self) -> usize {
        self.particles.iter().filter(|p| p.alive).count()
    }

    /// Whether expired particles respawn
    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Start or stop respawning; live particles finish their lifetime
    pub fn set_emitting(&mut self, emitting: bool) {
        if emitting && !self.emitting {
            for particle in &mut self.particles {
                particle.alive = true;
            }
        }
        self.emitting = emitting;
    }

    /// Advance every particle by one tick around `origin`
    pub fn simulate(&mut self, tick: f32, origin: Vec2) {
        let lifetime = self.desc.lifetime.max(f32::EPSILON);
        for (particle, offset) in self.particles.iter_mut().zip(&self.offsets) {
            if !particle.alive {
                continue;
            }
            particle.age += tick;
            if particle.age >= lifetime {
                if self.emitting {
                    particle.age %= lifetime;
                } else {
                    particle.alive = false;
                    continue;
                }
            }
            particle.position = origin + offset * self.desc.speed * particle.age;
        }
    }

    /// One drawable per live particle
    pub fn drawables(&self) -> impl Iterator<Item = Drawable> + '_ {
        let lifetime = self.desc.lifetime.max(f32::EPSILON);
        self.particles.iter().filter(|p| p.alive).map(move |particle| {
            let model = Mat4::new_translation(&Vec3::new(particle.position.x, particle.position.y, 0.0))
                * Mat4::new_nonuniform_scaling(&Vec3::new(self.desc.size.x, self.desc.size.y, 1.0));
            let mut color = self.desc.color;
            color.w *= 1.0 - (particle.age / lifetime).clamp(0.0, 1.0);
            Drawable {
                material: self.desc.material,
                vertex_buffer: self.desc.vertex_buffer,
                index_buffer: self.desc.index_buffer,
                index_count: 6,
                uniform: SpriteUniform::new(&model, color, Vec2::zeros(), Vec2::new(1.0, 1.0)),
                layer: self.desc.layer,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn desc(seed: u64) -> EmitterDesc {
        let mut materials: SlotMap<MaterialId, ()> = SlotMap::with_key();
        let mut vbs: SlotMap<VertexBufferId, ()> = SlotMap::with_key();
        let mut ibs: SlotMap<IndexBufferId, ()> = SlotMap::with_key();
        EmitterDesc::new(materials.insert(()), vbs.insert(()), ibs.insert(()))
            .with_pool(8, 1.0)
            .with_seed(seed)
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let mut a = ParticleEmitter::new(desc(7));
        let mut b = ParticleEmitter::new(desc(7));
        for step in 0..90 {
            let origin = Vec2::new(step as f32, 0.0);
            a.simulate(1.0 / 60.0, origin);
            b.simulate(1.0 / 60.0, origin);
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_ages_are_staggered_and_wrap() {
        let mut emitter = ParticleEmitter::new(desc(1));
        let ages: Vec<f32> = emitter.particles().iter().map(|p| p.age).collect();
        assert_relative_eq!(ages[4], 0.5);

        for _ in 0..100 {
            emitter.simulate(0.05, Vec2::zeros());
        }
        assert!(emitter.particles().iter().all(|p| p.age < 1.0));
        assert_eq!(emitter.alive_count(), 8);
    }

    #[test]
    fn test_particles_stay_within_reach() {
        let mut emitter = ParticleEmitter::new(desc(3));
        let origin = Vec2::new(100.0, 50.0);
        for _ in 0..30 {
            emitter.simulate(1.0 / 30.0, origin);
        }
        let reach = emitter.desc().speed * emitter.desc().lifetime;
        for particle in emitter.particles() {
            assert!((particle.position - origin).norm() <= reach + 1e-3);
        }
    }

    #[test]
    fn test_stopping_lets_particles_expire() {
        let mut emitter = ParticleEmitter::new(desc(5));
        emitter.set_emitting(false);
        for _ in 0..25 {
            emitter.simulate(0.05, Vec2::zeros());
        }
        assert_eq!(emitter.alive_count(), 0);
        assert_eq!(emitter.drawables().count(), 0);

        emitter.set_emitting(true);
        assert_eq!(emitter.alive_count(), 8);
    }
}
