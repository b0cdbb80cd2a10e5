//! Geometry helpers: circle hitboxes, interpolation and point placement
//!
//! Everything here works in screen pixels.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::areas::ObjectiveArea;
use crate::consts::{ELLIPSE_SAMPLE_ATTEMPTS, ELLIPSE_STEPS, PLACEMENT_ATTEMPTS};

/// Circular hitbox derived from an entity's current position and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitBox {
    pub pos: Vec2,
    pub radius: f32,
}

impl HitBox {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius }
    }

    /// Strict circle overlap: tangent circles do not collide
    #[inline]
    pub fn overlaps(&self, other: &HitBox) -> bool {
        self.pos.distance(other.pos) < self.radius + other.radius
    }
}

/// Interpolate from `start` to `end` by `current / total`, clamped to [0, 1]
#[inline]
pub fn lerp_progress(current: f32, total: f32, start: f32, end: f32) -> f32 {
    let factor = if total > 0.0 {
        (current / total).clamp(0.0, 1.0)
    } else {
        1.0
    };
    start + (end - start) * factor
}

/// Axis-aligned ellipse turtles hatch in and return to
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnArea {
    pub center: Vec2,
    pub radii: Vec2,
}

impl SpawnArea {
    /// Spawn ellipse for a screen, slightly left of and above the exact center
    pub fn for_screen(screen: Vec2) -> Self {
        let unit = screen.y / 10.0;
        let min = Vec2::new(
            screen.x / 2.0 - (unit * 2.2) / 1.4,
            screen.y / 2.0 - (unit * 1.1) / 1.4,
        );
        let size = Vec2::new(unit * 3.0, unit * 1.5);
        Self {
            center: min + size / 2.0,
            radii: size / 2.0,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let d = (point - self.center) / self.radii;
        d.length_squared() <= 1.0
    }

    /// Uniform random point inside the ellipse
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        for _ in 0..ELLIPSE_SAMPLE_ATTEMPTS {
            let candidate = Vec2::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            );
            if candidate.length_squared() <= 1.0 {
                return self.center + candidate * self.radii;
            }
        }
        self.center
    }
}

/// Objective area closest to `point`
pub fn closest_objective(areas: &[ObjectiveArea], point: Vec2) -> Option<&ObjectiveArea> {
    areas.iter().min_by(|a, b| {
        a.pos
            .distance_squared(point)
            .total_cmp(&b.pos.distance_squared(point))
    })
}

/// `count` points spread evenly by arc length around an ellipse
pub fn ellipse_points(center: Vec2, radii: Vec2, count: usize) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let dtheta = std::f32::consts::TAU / ELLIPSE_STEPS as f32;
    let arc_speed = |theta: f32| {
        ((radii.x * theta.sin()).powi(2) + (radii.y * theta.cos()).powi(2)).sqrt()
    };
    let circumference: f32 = (0..ELLIPSE_STEPS)
        .map(|i| arc_speed(i as f32 * dtheta) * dtheta)
        .sum();
    let spacing = circumference / count as f32;

    let mut points = Vec::with_capacity(count);
    let mut run = 0.0;
    for i in 0..ELLIPSE_STEPS {
        if points.len() == count {
            break;
        }
        let theta = i as f32 * dtheta;
        if run >= points.len() as f32 * spacing {
            points.push(center + Vec2::new(radii.x * theta.cos(), radii.y * theta.sin()));
        }
        run += arc_speed(theta) * dtheta;
    }
    points
}

/// Whether `point` keeps at least `min_distance` from every existing point
pub fn is_spaced(point: Vec2, existing: &[Vec2], min_distance: f32) -> bool {
    existing.iter().all(|p| p.distance(point) >= min_distance)
}

/// Pick a random candidate that keeps `min_distance` from `existing`
///
/// Gives up after a fixed number of attempts.
pub fn pick_spaced_point<R: Rng>(
    rng: &mut R,
    candidates: &[Vec2],
    existing: &[Vec2],
    min_distance: f32,
) -> Option<Vec2> {
    if candidates.is_empty() {
        return None;
    }
    (0..PLACEMENT_ATTEMPTS)
        .map(|_| candidates[rng.random_range(0..candidates.len())])
        .find(|&candidate| is_spaced(candidate, existing, min_distance))
}
