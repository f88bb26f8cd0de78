use bevy::math::DVec2;

use crate::color::Rgb565;
use crate::resources::TRAIL_LENGTH;

/// How trail alpha falls off from the newest point to the oldest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrailFalloff {
    Linear,
    #[default]
    Quadratic,
}

impl TrailFalloff {
    /// Alpha for the point `rank` steps behind the newest one.
    pub fn alpha(self, rank: usize) -> u8 {
        let remaining = TRAIL_LENGTH.saturating_sub(rank) as f64 / TRAIL_LENGTH as f64;
        let weight = match self {
            TrailFalloff::Linear => remaining,
            TrailFalloff::Quadratic => remaining * remaining,
        };
        (255.0 * weight) as u8
    }
}

/// One sample of a rendered trail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub position: DVec2,
    pub alpha: u8,
}

/// A planet orbiting the sun.
#[derive(Clone, Debug)]
pub struct Body {
    pub position: DVec2,
    pub velocity: DVec2,
    pub mass: f64,
    pub color: Rgb565,
    trail: [DVec2; TRAIL_LENGTH],
    /// Slot holding the newest trail point.
    trail_cursor: usize,
}

impl Body {
    pub fn new(position: DVec2, velocity: DVec2, mass: f64, color: Rgb565) -> Self {
        Self {
            position,
            velocity,
            mass,
            color,
            trail: [position; TRAIL_LENGTH],
            trail_cursor: 0,
        }
    }

    /// Semi-implicit Euler step scaled by `dt_scale`.
    pub fn integrate(&mut self, acceleration: DVec2, dt_scale: f64, update_trail: bool) {
        self.velocity += acceleration * dt_scale;
        self.position += self.velocity * dt_scale;

        if update_trail {
            self.trail_cursor = (self.trail_cursor + 1) % TRAIL_LENGTH;
            self.trail[self.trail_cursor] = self.position;
        }
    }

    pub fn is_out_of_bounds(&self, max: DVec2) -> bool {
        self.position.x.abs() > max.x || self.position.y.abs() > max.y
    }

    pub fn is_collided(&self, central_radius: f64) -> bool {
        self.position.length_squared() < central_radius * central_radius
    }

    /// Exactly `TRAIL_LENGTH` points from newest to oldest.
    pub fn trail(&self, falloff: TrailFalloff) -> impl Iterator<Item = TrailPoint> + '_ {
        (0..TRAIL_LENGTH).map(move |rank| {
            let slot = (self.trail_cursor + TRAIL_LENGTH - rank) % TRAIL_LENGTH;
            TrailPoint {
                position: self.trail[slot],
                alpha: falloff.alpha(rank),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f64, y: f64) -> Body {
        Body::new(DVec2::new(x, y), DVec2::ZERO, 1.0, Rgb565::WHITE)
    }

    #[test]
    fn integrate_updates_velocity_before_position() {
        let mut body = body_at(0.0, 0.0);
        body.velocity = DVec2::new(1.0, 0.0);
        body.integrate(DVec2::new(0.0, 2.0), 0.5, false);

        assert_eq!(body.velocity, DVec2::new(1.0, 1.0));
        assert_eq!(body.position, DVec2::new(0.5, 0.5));
    }

    #[test]
    fn trail_starts_filled_with_spawn_position() {
        let body = body_at(3.0, -4.0);
        let points: Vec<_> = body.trail(TrailFalloff::Quadratic).collect();

        assert_eq!(points.len(), TRAIL_LENGTH);
        assert!(points.iter().all(|p| p.position == DVec2::new(3.0, -4.0)));
    }

    #[test]
    fn trail_is_unchanged_without_update_flag() {
        let mut body = body_at(1.0, 1.0);
        body.velocity = DVec2::new(1.0, 0.0);
        body.integrate(DVec2::ZERO, 1.0, false);

        assert!(
            body.trail(TrailFalloff::Quadratic)
                .all(|p| p.position == DVec2::new(1.0, 1.0))
        );
    }

    #[test]
    fn trail_orders_newest_first_and_overwrites_spawn_points() {
        let mut body = body_at(0.0, 0.0);
        body.velocity = DVec2::new(1.0, 0.0);

        for _ in 0..TRAIL_LENGTH {
            body.integrate(DVec2::ZERO, 1.0, true);
        }

        let points: Vec<_> = body.trail(TrailFalloff::Quadratic).collect();
        assert_eq!(points.len(), TRAIL_LENGTH);
        assert_eq!(points[0].position, body.position);
        assert_eq!(points[TRAIL_LENGTH - 1].position, DVec2::new(1.0, 0.0));
        assert!(points.iter().all(|p| p.position != DVec2::ZERO));
        for pair in points.windows(2) {
            assert!(pair[0].position.x > pair[1].position.x);
        }
    }

    #[test]
    fn trail_alpha_falls_off_quadratically() {
        let body = body_at(0.0, 0.0);
        let alphas: Vec<u8> = body.trail(TrailFalloff::Quadratic).map(|p| p.alpha).collect();

        assert_eq!(alphas[0], 255);
        let n = TRAIL_LENGTH as f64;
        let expected_mid = (255.0 * ((n - 10.0) / n).powi(2)) as u8;
        assert_eq!(alphas[10], expected_mid);
        assert!(alphas.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn linear_falloff_is_available_for_rendering() {
        assert_eq!(TrailFalloff::Linear.alpha(0), 255);
        assert!(TrailFalloff::Linear.alpha(10) > TrailFalloff::Quadratic.alpha(10));
    }

    #[test]
    fn bounds_and_collision_checks() {
        let max = DVec2::new(180.0, 140.0);
        assert!(!body_at(180.0, -140.0).is_out_of_bounds(max));
        assert!(body_at(-180.5, 0.0).is_out_of_bounds(max));
        assert!(body_at(0.0, 141.0).is_out_of_bounds(max));

        assert!(body_at(6.0, 7.9).is_collided(10.0));
        assert!(!body_at(6.0, 8.0).is_collided(10.0));
    }
}
