//! Turtle Game - a motion-tracked turtle rescue arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (turtle behavior, collisions, managers, game phases)
//! - `settings`: Tunable game configuration loaded from JSON
//! - `view`: Read-only frame snapshot for renderers and debug overlays

pub mod settings;
pub mod sim;
pub mod view;

pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Fixed constants that are not worth exposing as settings
pub mod consts {
    /// Fully opaque alpha
    pub const FULL_ALPHA: f32 = 255.0;

    /// Idle turtles pick a new goal once this close (pixels)
    pub const IDLE_GOAL_REACHED_DISTANCE: f32 = 60.0;

    /// Attempts made when picking a well-spaced obstacle point
    pub const PLACEMENT_ATTEMPTS: usize = 10;
    /// Attempts made to find a turtle spawn point clear of other turtles
    pub const SPAWN_ATTEMPTS: usize = 64;
    /// Attempts made to sample a point inside the spawn ellipse
    pub const ELLIPSE_SAMPLE_ATTEMPTS: usize = 32;

    /// Sightings averaged into a tracked person's position
    pub const TRACKING_SMOOTHING: usize = 6;

    /// Maximum stored trail points per player
    pub const TRAIL_CAPACITY: usize = 96;

    /// Where freshly created players appear (pixels)
    pub const DEFAULT_PLAYER_X: f32 = 100.0;
    pub const DEFAULT_PLAYER_Y: f32 = 100.0;

    /// Distance a debug key press moves its player per frame (pixels)
    pub const DEBUG_KEY_STEP: f32 = 10.0;

    /// Obstacle decorative rotation range (degrees)
    pub const OBSTACLE_MAX_ROTATION: f32 = 30.0;

    /// Resolution of the ellipse arc-length integration
    pub const ELLIPSE_STEPS: usize = 10_000;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Heading (radians) pointing from `from` toward `to`
///
/// Returns `fallback` when the two points coincide, so a turtle standing on
/// its goal keeps its current direction.
#[inline]
pub fn heading_between(from: Vec2, to: Vec2, fallback: f32) -> f32 {
    let delta = to - from;
    if delta == Vec2::ZERO {
        fallback
    } else {
        delta.y.atan2(delta.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(2.0, FRAC_PI_2);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_heading_between() {
        let origin = Vec2::new(10.0, 10.0);
        assert!((heading_between(origin, Vec2::new(20.0, 10.0), 1.0)).abs() < 1e-6);
        assert!((heading_between(origin, Vec2::new(0.0, 10.0), 1.0) - PI).abs() < 1e-6);
        assert!((heading_between(origin, Vec2::new(10.0, 20.0), 1.0) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_heading_between_same_point_keeps_fallback() {
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(heading_between(p, p, 0.75), 0.75);
    }
}
