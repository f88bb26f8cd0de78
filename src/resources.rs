use std::time::Duration;

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::body::TrailFalloff;

// --- Physics Defaults ---
/// Gravitational constant.
pub const G: f64 = 6.67430e-11;
/// Velocity/position scale applied every tick.
pub const TIME_SCALE: f64 = 2.0e10;
/// Divides squared distances so pixel-sized separations act like orbital ones.
pub const DISTANCE_SCALE: f64 = 1.0e9;
/// Pair separations below this are clamped to it.
pub const MIN_DISTANCE: f64 = 3.0;
/// Planets further apart than this do not attract each other.
pub const MAX_FORCE_DISTANCE: f64 = 100.0;
/// Launch velocity per pixel of drag.
pub const SPEED_FACTOR: f64 = 2.0e-14;

// --- Sun ---
pub const SUN_MASS: f64 = 3.33e5;
/// Sun radius in pixels, also the collision boundary.
pub const SUN_RADIUS: f64 = 10.0;
/// Relative brightness swing of the sun flicker (0-1).
pub const SUN_BRIGHTNESS_FLUCTUATION: f32 = 0.1;
pub const SUN_FLICKER_INTERVAL: Duration = Duration::from_millis(100);
pub const SUN_RAY_COUNT: usize = 10;

// --- Planets ---
pub const PLANET_MASS: f64 = 30000.0;
pub const PLANET_RADIUS: f32 = 2.0;
pub const MAX_PLANETS: usize = 10;
/// Number of stored points per trail.
pub const TRAIL_LENGTH: usize = 35;

// --- Display & Timing ---
/// Logical display size in world units (one unit per panel pixel).
pub const DISPLAY_WIDTH: f64 = 320.0;
pub const DISPLAY_HEIGHT: f64 = 240.0;
/// Window pixels per world unit.
pub const PIXEL_SCALE: f32 = 3.0;
/// Off-screen margin before a planet is dropped.
pub const SCREEN_MARGIN: f64 = 20.0;
/// Effect frames advance at most once per this interval.
pub const DRAW_INTERVAL: Duration = Duration::from_millis(70);
pub const TRAIL_UPDATE_INTERVAL: Duration = Duration::from_millis(35);
/// Fixed physics step rate.
pub const FIXED_HZ: f64 = 60.0;
/// Simulation ticks executed per fixed step.
pub const TICKS_PER_STEP: u32 = 80;

// --- Collision Marker ---
pub const COLLISION_EFFECT_RADIUS: f32 = 4.0;
pub const COLLISION_EFFECT_DURATION: Duration = Duration::from_millis(105);

// --- Fireworks ---
pub const PARTICLE_COUNT: usize = 30;
/// Base particle speed in pixels per effect frame.
pub const PARTICLE_SPEED: f64 = 3.0;
/// Particle lifetime in effect frames.
pub const PARTICLE_LIFETIME: i32 = 10;
/// Downward pull per effect frame, only applied when enabled.
pub const PARTICLE_GRAVITY: f64 = 1.0;
pub const PARTICLE_RADIUS: f32 = 2.0;
/// Simultaneous bursts the particle pool is sized for.
pub const MAX_BURSTS: usize = 5;

// --- Ripples ---
pub const RIPPLE_EXPANSION_SPEED: f64 = 2.5;
pub const RIPPLE_LIFETIME: i32 = 20;
pub const MAX_RIPPLES: usize = 10;
pub const RIPPLE_INITIAL_RADIUS: f64 = 2.0;

// --- Tones ---
pub const TONE_VOLUME: f32 = 48.0 / 255.0;
pub const TOUCH_TONE_FREQUENCY: f32 = 659.26;
pub const COLLISION_TONE_FREQUENCY: f32 = 82.407;
pub const TONE_DURATION: Duration = Duration::from_millis(50);

/// Fixed simulation parameters, built once at startup.
#[derive(Resource, Clone, Debug)]
pub struct SimConfig {
    pub g: f64,
    pub time_scale: f64,
    pub distance_scale: f64,
    pub min_distance: f64,
    pub max_force_distance: f64,
    pub speed_factor: f64,
    pub sun_mass: f64,
    pub sun_radius: f64,
    pub planet_mass: f64,
    pub max_planets: usize,
    /// Half extents of the playfield, margin included.
    pub bounds: DVec2,
    pub trail_update_interval: Duration,
    pub draw_interval: Duration,
    pub collision_effect_duration: Duration,
    pub ticks_per_step: u32,
    pub effects: EffectConfig,
}

impl SimConfig {
    pub fn min_distance_squared(&self) -> f64 {
        self.min_distance * self.min_distance
    }

    pub fn max_force_distance_squared(&self) -> f64 {
        self.max_force_distance * self.max_force_distance
    }

    pub fn distance_scale_squared(&self) -> f64 {
        self.distance_scale * self.distance_scale
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            g: G,
            time_scale: TIME_SCALE,
            distance_scale: DISTANCE_SCALE,
            min_distance: MIN_DISTANCE,
            max_force_distance: MAX_FORCE_DISTANCE,
            speed_factor: SPEED_FACTOR,
            sun_mass: SUN_MASS,
            sun_radius: SUN_RADIUS,
            planet_mass: PLANET_MASS,
            max_planets: MAX_PLANETS,
            bounds: DVec2::new(
                DISPLAY_WIDTH / 2.0 + SCREEN_MARGIN,
                DISPLAY_HEIGHT / 2.0 + SCREEN_MARGIN,
            ),
            trail_update_interval: TRAIL_UPDATE_INTERVAL,
            draw_interval: DRAW_INTERVAL,
            collision_effect_duration: COLLISION_EFFECT_DURATION,
            ticks_per_step: TICKS_PER_STEP,
            effects: EffectConfig::default(),
        }
    }
}

/// Particle and ripple tuning, in effect frames and pixels.
#[derive(Clone, Debug)]
pub struct EffectConfig {
    pub particle_count: usize,
    pub particle_speed: f64,
    pub particle_lifetime: i32,
    pub particle_gravity: f64,
    pub particle_gravity_enabled: bool,
    pub particle_radius: f32,
    pub max_particles: usize,
    pub ripple_expansion_speed: f64,
    pub ripple_lifetime: i32,
    pub ripple_initial_radius: f64,
    pub max_ripples: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            particle_count: PARTICLE_COUNT,
            particle_speed: PARTICLE_SPEED,
            particle_lifetime: PARTICLE_LIFETIME,
            particle_gravity: PARTICLE_GRAVITY,
            particle_gravity_enabled: false,
            particle_radius: PARTICLE_RADIUS,
            max_particles: MAX_BURSTS * PARTICLE_COUNT,
            ripple_expansion_speed: RIPPLE_EXPANSION_SPEED,
            ripple_lifetime: RIPPLE_LIFETIME,
            ripple_initial_radius: RIPPLE_INITIAL_RADIUS,
            max_ripples: MAX_RIPPLES,
        }
    }
}

/// User-facing toggles that drive rendering and simulation behavior.
#[derive(Resource)]
pub struct SimSettings {
    pub show_trails: bool,
    pub trail_falloff: TrailFalloff,
    pub paused: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            show_trails: true,
            trail_falloff: TrailFalloff::Quadratic,
            paused: false,
        }
    }
}

/// Marker resource to request a simulation reset from the UI.
#[derive(Resource, Default)]
pub struct ResetSimulation {
    pub pending: bool,
}
