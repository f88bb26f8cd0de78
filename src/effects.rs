use bevy::math::DVec2;
use rand::Rng;

use crate::color::Rgb565;
use crate::resources::EffectConfig;

/// A single firework spark.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    pub color: Rgb565,
    pub lifetime: i32,
    pub initial_lifetime: i32,
}

impl Particle {
    pub fn alpha(&self) -> u8 {
        lifetime_alpha(self.lifetime, self.initial_lifetime)
    }

    /// Shrinks with alpha, never below one pixel.
    pub fn radius(&self, base_radius: f32) -> f32 {
        (base_radius * self.alpha() as f32 / 255.0).max(1.0)
    }
}

/// An expanding ring marking a planet spawn.
#[derive(Clone, Copy, Debug)]
pub struct Ripple {
    pub position: DVec2,
    pub radius: f64,
    pub color: Rgb565,
    pub lifetime: i32,
    pub initial_lifetime: i32,
}

impl Ripple {
    pub fn alpha(&self) -> u8 {
        lifetime_alpha(self.lifetime, self.initial_lifetime)
    }

    /// Fainter second ring drawn just inside the main one.
    pub fn inner_ring(&self) -> Option<(f64, u8)> {
        (self.radius > 4.0).then(|| (self.radius - 3.0, self.alpha() / 2))
    }
}

fn lifetime_alpha(lifetime: i32, initial_lifetime: i32) -> u8 {
    if initial_lifetime <= 0 {
        return 0;
    }
    (255 * lifetime.clamp(0, initial_lifetime) / initial_lifetime) as u8
}

/// Fixed-capacity particle and ripple pools.
#[derive(Debug)]
pub struct EffectPools {
    config: EffectConfig,
    particles: Vec<Particle>,
    ripples: Vec<Ripple>,
}

impl EffectPools {
    pub fn new(config: EffectConfig) -> Self {
        Self {
            particles: Vec::with_capacity(config.max_particles),
            ripples: Vec::with_capacity(config.max_ripples),
            config,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Returns false when the pool is full and the ripple was dropped.
    pub fn spawn_ripple(&mut self, position: DVec2, color: Rgb565) -> bool {
        if self.ripples.len() >= self.config.max_ripples {
            return false;
        }
        self.ripples.push(Ripple {
            position,
            radius: self.config.ripple_initial_radius,
            color,
            lifetime: self.config.ripple_lifetime,
            initial_lifetime: self.config.ripple_lifetime,
        });
        true
    }

    /// Scatters up to `particle_count` sparks; returns how many fit in the pool.
    pub fn spawn_burst(&mut self, position: DVec2, color: Rgb565, rng: &mut impl Rng) -> usize {
        let mut spawned = 0;
        for _ in 0..self.config.particle_count {
            if self.particles.len() >= self.config.max_particles {
                break;
            }
            let angle = rng.random_range(0.0..360.0_f64).to_radians();
            let speed = self.config.particle_speed * rng.random_range(0.7..=1.3);
            self.particles.push(Particle {
                position,
                velocity: DVec2::from_angle(angle) * speed,
                color,
                lifetime: self.config.particle_lifetime,
                initial_lifetime: self.config.particle_lifetime,
            });
            spawned += 1;
        }
        spawned
    }

    /// Moves every effect one frame forward and drops the expired ones.
    pub fn advance(&mut self) {
        let gravity = if self.config.particle_gravity_enabled {
            DVec2::new(0.0, -self.config.particle_gravity)
        } else {
            DVec2::ZERO
        };

        let mut i = 0;
        while i < self.particles.len() {
            let particle = &mut self.particles[i];
            particle.velocity += gravity;
            particle.position += particle.velocity;
            particle.lifetime -= 1;
            if particle.lifetime <= 0 {
                self.particles.swap_remove(i);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.ripples.len() {
            let ripple = &mut self.ripples[i];
            ripple.radius += self.config.ripple_expansion_speed;
            ripple.lifetime -= 1;
            if ripple.lifetime <= 0 {
                self.ripples.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.ripples.clear();
    }
}
