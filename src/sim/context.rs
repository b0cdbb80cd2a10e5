//! Simulation context shared by every update call
//!
//! Holds the state that the game used to keep in globals: the score, the
//! dead-turtle count, the entity id allocator, the RNG and debug counters.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::collision::CollisionReport;
use super::geometry::SpawnArea;
use crate::settings::Settings;

/// Counters shown on the debug overlay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DebugCounters {
    pub player_count: usize,
    pub turtle_count: usize,
    pub turtles_left_to_spawn: u32,
    pub game_phase: &'static str,
    /// Result of the latest collision pass
    pub collisions: CollisionReport,
}

/// Mutable simulation context owned by the game orchestrator
#[derive(Debug, Clone)]
pub struct SimContext {
    pub settings: Settings,
    /// Area turtles hatch in and return to
    pub spawn_area: SpawnArea,
    /// Turtles rescued this game
    pub score: u32,
    /// Turtles lost to obstacles this game
    pub dead_turtles: u32,
    /// Whether players come from the motion tracker (enables auto-removal)
    pub tracking_active: bool,
    pub debug: DebugCounters,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    next_id: u32,
}

impl SimContext {
    /// Create a context with the given seed
    pub fn new(settings: Settings, seed: u64) -> Self {
        let spawn_area = SpawnArea::for_screen(settings.screen_size());
        Self {
            settings,
            spawn_area,
            score: 0,
            dead_turtles: 0,
            tracking_active: false,
            debug: DebugCounters::default(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Uniform angle in [0, 2π)
    pub fn random_angle(&mut self) -> f32 {
        self.rng.random_range(0.0..std::f32::consts::TAU)
    }

    /// Clear score and dead turtles for a new game
    pub fn reset_score(&mut self) {
        self.score = 0;
        self.dead_turtles = 0;
    }

    /// Meters to pixels with the current settings
    #[inline]
    pub fn px(&self, meters: f32) -> f32 {
        self.settings.px(meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        let mut ctx = SimContext::new(Settings::default(), 1);
        let a = ctx.next_entity_id();
        let b = ctx.next_entity_id();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_same_seed_same_angles() {
        let mut a = SimContext::new(Settings::default(), 42);
        let mut b = SimContext::new(Settings::default(), 42);
        for _ in 0..8 {
            assert_eq!(a.random_angle(), b.random_angle());
        }
    }

    #[test]
    fn test_reset_score() {
        let mut ctx = SimContext::new(Settings::default(), 0);
        ctx.score = 4;
        ctx.dead_turtles = 2;
        ctx.reset_score();
        assert_eq!((ctx.score, ctx.dead_turtles), (0, 0));
    }
}
