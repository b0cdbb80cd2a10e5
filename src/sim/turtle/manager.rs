use glam::Vec2;
use serde::Serialize;

use super::{Turtle, TurtleStateKind};
use crate::consts::SPAWN_ATTEMPTS;
use crate::sim::areas::ObjectiveArea;
use crate::sim::context::SimContext;
use crate::sim::geometry::HitBox;

/// Where a turtle died, for the renderer to play an animation once
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeathAnimation {
    pub pos: Vec2,
}

/// Owns the turtles of one game or of the idle environment
#[derive(Debug, Clone)]
pub struct TurtleManager {
    turtles: Vec<Turtle>,
    live_turtles: usize,
    /// Turtles the pool may still hatch; ignored with infinite spawn
    left_to_spawn: u32,
    /// Set by `reset_turtles` until every turtle is back in spawn
    resetting: bool,
    infinite_spawn: bool,
    death_animations: Vec<DeathAnimation>,
}

impl TurtleManager {
    pub fn new(ctx: &SimContext, infinite_spawn: bool) -> Self {
        Self {
            turtles: Vec::new(),
            live_turtles: 0,
            left_to_spawn: ctx.settings.total_turtles,
            resetting: false,
            infinite_spawn,
            death_animations: Vec::new(),
        }
    }

    /// Reap a turtle that swam off screen, update the rest, then top up
    pub fn update(&mut self, dt: f32, ctx: &mut SimContext, objectives: &[ObjectiveArea]) {
        let mut reaped = None;
        for turtle in &mut self.turtles {
            if turtle.body.out_of_screen {
                reaped = Some(turtle.id());
            } else {
                turtle.update(dt, ctx, objectives);
            }
        }
        if let Some(id) = reaped {
            self.destroy_turtle(id);
        }

        if self.turtles.len() < ctx.settings.max_visible_turtles {
            self.create_turtle(ctx);
        }

        ctx.debug.turtle_count = self.turtles.len();
        ctx.debug.turtles_left_to_spawn = self.left_to_spawn;
    }

    /// Whether the population rule allows another turtle
    pub fn can_spawn(&self, ctx: &SimContext) -> bool {
        self.live_turtles < ctx.settings.max_visible_turtles
            && (self.left_to_spawn > 0 || self.infinite_spawn)
    }

    /// Hatch a new egg somewhere in the spawn area clear of other turtles
    pub fn create_turtle(&mut self, ctx: &mut SimContext) -> Option<u32> {
        if !self.can_spawn(ctx) {
            return None;
        }

        let id = ctx.next_entity_id();
        let direction = ctx.random_angle();
        let radius = ctx.px(ctx.settings.turtle_radius);
        let spawn_area = ctx.spawn_area;

        let mut pos = spawn_area.random_point(ctx.rng());
        let mut attempts = 1;
        while self.spawn_blocked(HitBox::new(pos, radius)) {
            if attempts >= SPAWN_ATTEMPTS {
                log::warn!("No clear spawn point after {attempts} attempts, turtle {id} overlaps");
                break;
            }
            pos = spawn_area.random_point(ctx.rng());
            attempts += 1;
        }

        self.turtles.push(Turtle::new(id, pos, direction, ctx));
        self.live_turtles += 1;
        if !self.infinite_spawn {
            self.left_to_spawn = self.left_to_spawn.saturating_sub(1);
        }
        ctx.debug.turtles_left_to_spawn = self.left_to_spawn;
        log::debug!("Turtle {id} spawned at {pos}, {} left", self.left_to_spawn);
        Some(id)
    }

    fn spawn_blocked(&self, candidate: HitBox) -> bool {
        self.turtles
            .iter()
            .any(|turtle| turtle.hitbox().overlaps(&candidate))
    }

    /// Remove a turtle; returns false when the id is unknown
    pub fn destroy_turtle(&mut self, id: u32) -> bool {
        match self.turtles.iter().position(|t| t.id() == id) {
            Some(index) => {
                self.turtles.remove(index);
                self.live_turtles = self.live_turtles.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    /// Send every active turtle back to the spawn area
    pub fn reset_turtles(&mut self, ctx: &SimContext) {
        for turtle in &mut self.turtles {
            if !matches!(
                turtle.kind(),
                TurtleStateKind::Spawn | TurtleStateKind::Objective
            ) {
                turtle.begin_return(ctx);
            }
        }
        self.resetting = true;
    }

    /// True once after a reset, when every turtle is back in spawn
    pub fn all_turtles_returned(&mut self, ctx: &SimContext) -> bool {
        if !self.resetting {
            return false;
        }
        if self.turtles.iter().all(|t| t.body.in_spawn(ctx)) {
            self.resetting = false;
            true
        } else {
            false
        }
    }

    /// Hatch a share of the eggs so the idle field looks lively
    pub fn diversify_states(&mut self, ctx: &mut SimContext) {
        let count = (self.turtles.len() as f32 * ctx.settings.percentage_of_hatched_turtles) as usize;
        for turtle in self.turtles.iter_mut().take(count) {
            turtle.hatch(ctx);
        }
    }

    pub fn start_death_animation(&mut self, pos: Vec2) {
        self.death_animations.push(DeathAnimation { pos });
    }

    /// Pending death animations, each handed out once
    pub fn take_death_animations(&mut self) -> Vec<DeathAnimation> {
        std::mem::take(&mut self.death_animations)
    }

    pub fn death_animations(&self) -> &[DeathAnimation] {
        &self.death_animations
    }

    pub fn turtle(&self, id: u32) -> Option<&Turtle> {
        self.turtles.iter().find(|t| t.id() == id)
    }

    pub fn turtle_mut(&mut self, id: u32) -> Option<&mut Turtle> {
        self.turtles.iter_mut().find(|t| t.id() == id)
    }

    pub fn turtles(&self) -> &[Turtle] {
        &self.turtles
    }

    pub fn turtles_mut(&mut self) -> &mut [Turtle] {
        &mut self.turtles
    }

    pub fn ids(&self) -> Vec<u32> {
        self.turtles.iter().map(Turtle::id).collect()
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.turtles.iter().map(Turtle::pos).collect()
    }

    pub fn live_turtles(&self) -> usize {
        self.live_turtles
    }

    pub fn left_to_spawn(&self) -> u32 {
        self.left_to_spawn
    }

    pub fn set_infinite_spawn(&mut self, infinite_spawn: bool) {
        self.infinite_spawn = infinite_spawn;
    }

    pub fn is_resetting(&self) -> bool {
        self.resetting
    }

    pub fn len(&self) -> usize {
        self.turtles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turtles.is_empty()
    }
}
