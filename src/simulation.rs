use std::time::Duration;

use bevy::log::{debug, info};
use bevy::math::DVec2;
use bevy::prelude::{Message, MessageWriter, Resource};
use rand::{SeedableRng, rngs::StdRng};

use crate::body::Body;
use crate::color::Rgb565;
use crate::effects::EffectPools;
use crate::resources::SimConfig;

/// Something the simulation reports to the outside world.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum SimEvent {
    BodySpawned { position: DVec2, color: Rgb565 },
    Collision { position: DVec2, color: Rgb565 },
}

/// Receives simulation events as they happen.
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

impl EventSink for Vec<SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.push(event);
    }
}

impl EventSink for MessageWriter<'_, SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.write(event);
    }
}

/// Discards every event.
#[cfg(test)]
pub struct NullSink;

#[cfg(test)]
impl EventSink for NullSink {
    fn emit(&mut self, _event: SimEvent) {}
}

/// The immovable central mass.
#[derive(Clone, Copy, Debug)]
pub struct Sun {
    pub position: DVec2,
    pub mass: f64,
    pub radius: f64,
}

/// Where and when the last planet hit the sun.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionMarker {
    pub position: DVec2,
    pub started_at: Duration,
}

/// Acceleration the sun imparts on `body`. Zero at the sun's exact center.
pub fn sun_acceleration(config: &SimConfig, sun: &Sun, body: &Body) -> DVec2 {
    let delta = sun.position - body.position;
    let r2 = delta.length_squared();
    if r2 == 0.0 {
        return DVec2::ZERO;
    }
    let r = r2.sqrt();
    delta * (config.g * sun.mass / (r * r2 * config.distance_scale_squared()))
}

/// Mutual accelerations of a pair, `(on first, on second)`.
///
/// Pairs further apart than `max_force_distance` do not interact. Closer than
/// `min_distance` the magnitude is held at its `min_distance` value while the
/// direction still follows the actual separation.
pub fn pair_accelerations(config: &SimConfig, first: &Body, second: &Body) -> (DVec2, DVec2) {
    let delta = second.position - first.position;
    let r2 = delta.length_squared();
    if r2 > config.max_force_distance_squared() || r2 == 0.0 {
        return (DVec2::ZERO, DVec2::ZERO);
    }
    let clamped_r2 = r2.max(config.min_distance_squared());
    let inv = 1.0 / (r2.sqrt() * clamped_r2 * config.distance_scale_squared());
    (
        delta * (config.g * second.mass * inv),
        -delta * (config.g * first.mass * inv),
    )
}

/// The sun, its planets and the collision marker.
#[derive(Debug)]
pub struct SimulationWorld {
    config: SimConfig,
    sun: Sun,
    bodies: Vec<Body>,
    last_trail_update: Duration,
    collision_marker: Option<CollisionMarker>,
    accelerations: Vec<DVec2>,
}

impl SimulationWorld {
    pub fn new(config: SimConfig) -> Self {
        Self {
            sun: Sun {
                position: DVec2::ZERO,
                mass: config.sun_mass,
                radius: config.sun_radius,
            },
            bodies: Vec::with_capacity(config.max_planets + 1),
            accelerations: Vec::with_capacity(config.max_planets + 1),
            last_trail_update: Duration::ZERO,
            collision_marker: None,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sun(&self) -> &Sun {
        &self.sun
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn collision_marker(&self) -> Option<&CollisionMarker> {
        self.collision_marker.as_ref()
    }

    /// Adds a planet, returning the oldest one if it had to make room.
    pub fn add_body(&mut self, position: DVec2, velocity: DVec2, color: Rgb565) -> Option<Body> {
        let mass = self.config.planet_mass;
        self.bodies.push(Body::new(position, velocity, mass, color));
        if self.bodies.len() > self.config.max_planets {
            let evicted = self.bodies.remove(0);
            debug!("evicted oldest planet at {:?}", evicted.position);
            return Some(evicted);
        }
        None
    }

    /// Advances every planet by one tick. Returns whether trails were updated.
    pub fn step(&mut self, now: Duration) -> bool {
        let update_trails =
            now.saturating_sub(self.last_trail_update) > self.config.trail_update_interval;
        if update_trails {
            self.last_trail_update = now;
        }

        if let Some(marker) = self.collision_marker
            && now.saturating_sub(marker.started_at) > self.config.collision_effect_duration
        {
            self.collision_marker = None;
        }

        if self.bodies.is_empty() {
            return update_trails;
        }

        accumulate_accelerations(&self.config, &self.sun, &self.bodies, &mut self.accelerations);

        for (body, acceleration) in self.bodies.iter_mut().zip(&self.accelerations) {
            body.integrate(*acceleration, self.config.time_scale, update_trails);
        }

        update_trails
    }

    /// Drops planets that left the playfield or fell into the sun.
    pub fn sweep(&mut self, now: Duration, sink: &mut impl EventSink) {
        for i in (0..self.bodies.len()).rev() {
            let body = &self.bodies[i];
            if body.is_out_of_bounds(self.config.bounds) {
                debug!("planet left the playfield at {:?}", body.position);
                self.bodies.remove(i);
            } else if body.is_collided(self.sun.radius) {
                let body = self.bodies.remove(i);
                debug!("planet collided with the sun at {:?}", body.position);
                self.collision_marker = Some(CollisionMarker {
                    position: body.position,
                    started_at: now,
                });
                sink.emit(SimEvent::Collision {
                    position: body.position,
                    color: body.color,
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.collision_marker = None;
    }
}

/// Sun pull on every body plus mutual pull of each nearby pair, written to `out`.
fn accumulate_accelerations(
    config: &SimConfig,
    sun: &Sun,
    bodies: &[Body],
    out: &mut Vec<DVec2>,
) {
    out.clear();
    out.extend(bodies.iter().map(|body| sun_acceleration(config, sun, body)));

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (on_i, on_j) = pair_accelerations(config, &bodies[i], &bodies[j]);
            out[i] += on_i;
            out[j] += on_j;
        }
    }
}

/// Planets, effects and their shared clocks, advanced together each tick.
#[derive(Resource)]
pub struct Simulation {
    world: SimulationWorld,
    effects: EffectPools,
    rng: StdRng,
    pending: Vec<SimEvent>,
    last_effect_frame: Duration,
}

impl Simulation {
    pub fn new(config: SimConfig, rng: StdRng) -> Self {
        Self {
            effects: EffectPools::new(config.effects.clone()),
            world: SimulationWorld::new(config),
            rng,
            pending: Vec::new(),
            last_effect_frame: Duration::ZERO,
        }
    }

    pub fn from_config(config: SimConfig) -> Self {
        Self::new(config, StdRng::from_os_rng())
    }

    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    pub fn effects(&self) -> &EffectPools {
        &self.effects
    }

    pub fn config(&self) -> &SimConfig {
        self.world.config()
    }

    /// Launches a new planet in a fresh color and marks the spot with a ripple.
    pub fn spawn_body(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        sink: &mut impl EventSink,
    ) -> Rgb565 {
        let color = Rgb565::random_vibrant(&mut self.rng);
        self.effects.spawn_ripple(position, color);
        self.world.add_body(position, velocity, color);
        sink.emit(SimEvent::BodySpawned { position, color });
        color
    }

    /// One physics tick: integrate, sweep, then turn collisions into bursts.
    pub fn tick(&mut self, now: Duration, sink: &mut impl EventSink) {
        self.world.step(now);
        self.world.sweep(now, &mut self.pending);

        for event in self.pending.drain(..) {
            if let SimEvent::Collision { position, color } = event {
                self.effects.spawn_burst(position, color, &mut self.rng);
            }
            sink.emit(event);
        }
    }

    /// Advances effects by one frame if the draw interval has passed.
    pub fn advance_effects(&mut self, now: Duration) -> bool {
        if now.saturating_sub(self.last_effect_frame) <= self.world.config().draw_interval {
            return false;
        }
        self.last_effect_frame = now;
        self.effects.advance();
        true
    }

    pub fn reset(&mut self) {
        info!(
            "resetting simulation with {} planets",
            self.world.bodies().len()
        );
        self.world.clear();
        self.effects.clear();
        self.pending.clear();
    }
}
