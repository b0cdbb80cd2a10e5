//! Turtles: the shared body, the behavior states and the manager

mod manager;
mod state;

pub use manager::{DeathAnimation, TurtleManager};
pub use state::{
    IdleState, ObjectiveState, ReturningState, RoamingState, SpawnState, TurtleBehavior,
    TurtleState, TurtleStateKind, WalkState, Wiggle, repulsion_direction,
};

use glam::Vec2;
use serde::Serialize;

use super::areas::ObjectiveArea;
use super::context::SimContext;
use super::geometry::HitBox;
use crate::consts::FULL_ALPHA;
use crate::polar_to_cartesian;
use crate::settings::Settings;

/// Data every state reads and writes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurtleBody {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Heading (radians)
    pub direction: f32,
    /// Pixels per second
    pub speed: f32,
    pub alpha: f32,

    pub alive: bool,
    pub colliding: bool,
    pub returning: bool,
    pub idle: bool,
    pub roaming: bool,
    pub in_objective: bool,
    pub out_of_screen: bool,
    pub interactable: bool,
    pub resetting: bool,
    pub against_wall: bool,

    pub wiggle_timer: f32,
    /// Flips between 1 and -1 on every wiggle turn
    pub wiggle_factor: f32,
    pub move_timer: f32,
}

impl TurtleBody {
    pub fn new(id: u32, pos: Vec2, direction: f32, settings: &Settings) -> Self {
        Self {
            id,
            pos,
            radius: settings.px(settings.turtle_radius),
            direction,
            speed: settings.px(settings.turtle_walk_speed),
            alpha: FULL_ALPHA,
            alive: true,
            colliding: false,
            returning: false,
            idle: false,
            roaming: false,
            in_objective: false,
            out_of_screen: false,
            interactable: false,
            resetting: false,
            against_wall: false,
            wiggle_timer: 0.0,
            wiggle_factor: 1.0,
            move_timer: 0.0,
        }
    }

    pub fn hitbox(&self) -> HitBox {
        HitBox::new(self.pos, self.radius)
    }

    /// Move to `pos`, kept a border offset away from the screen edge
    ///
    /// Rescued turtles are allowed to leave the screen.
    pub fn set_position(&mut self, pos: Vec2, settings: &Settings) {
        if self.in_objective {
            self.pos = pos;
            self.against_wall = false;
            return;
        }

        let offset = settings.px(settings.turtle_border_offset);
        let min = Vec2::splat(offset);
        let max = settings.screen_size() - offset;
        let clamped = pos.clamp(min, max);
        self.against_wall = clamped != pos;
        self.pos = clamped;
    }

    /// Step along the current heading
    pub fn advance(&mut self, dt: f32, settings: &Settings) {
        let next = self.pos + polar_to_cartesian(self.speed * dt, self.direction);
        self.set_position(next, settings);
    }

    pub fn kill(&mut self, ctx: &mut SimContext) {
        ctx.dead_turtles += 1;
        self.alive = false;
        log::debug!("Turtle {} died, {} lost", self.id, ctx.dead_turtles);
    }

    pub fn in_spawn(&self, ctx: &SimContext) -> bool {
        ctx.spawn_area.contains(self.pos)
    }
}

/// A turtle: its body plus the active behavior
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turtle {
    pub body: TurtleBody,
    state: TurtleState,
}

impl Turtle {
    /// New egg at `pos`
    pub fn new(id: u32, pos: Vec2, direction: f32, ctx: &SimContext) -> Self {
        Self {
            body: TurtleBody::new(id, pos, direction, &ctx.settings),
            state: TurtleState::Spawn(SpawnState::enter(ctx)),
        }
    }

    pub fn id(&self) -> u32 {
        self.body.id
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn state(&self) -> &TurtleState {
        &self.state
    }

    pub fn kind(&self) -> TurtleStateKind {
        self.state.kind()
    }

    /// Label for the debug overlay, e.g. `4: Walk`
    pub fn state_identifier(&self) -> String {
        format!("{}: {}", self.body.id, self.state.kind())
    }

    /// Opacity to draw with; eggs fade in on their own
    pub fn alpha(&self) -> f32 {
        match &self.state {
            TurtleState::Spawn(spawn) => spawn.alpha,
            _ => self.body.alpha,
        }
    }

    pub fn hitbox(&self) -> HitBox {
        self.body.hitbox()
    }

    /// Whether the turtle is in a state players and obstacles cannot affect
    pub fn is_immune(&self) -> bool {
        matches!(
            self.state.kind(),
            TurtleStateKind::Returning | TurtleStateKind::Objective
        )
    }

    fn install(&mut self, next: Option<TurtleState>) {
        if let Some(next) = next {
            log::debug!(
                "Turtle {}: {} -> {}",
                self.body.id,
                self.state.kind(),
                next.kind()
            );
            self.state = next;
        }
    }

    pub fn update(&mut self, dt: f32, ctx: &mut SimContext, objectives: &[ObjectiveArea]) {
        let next = self
            .state
            .behavior_mut()
            .update(&mut self.body, dt, ctx, objectives);
        self.install(next);
    }

    pub fn on_collide_turtle(&mut self, other: u32) {
        let next = self
            .state
            .behavior_mut()
            .on_collide_turtle(&mut self.body, other);
        self.install(next);
    }

    pub fn on_collide_players(&mut self, players: &[Vec2], inner: bool, ctx: &mut SimContext) {
        let next = self
            .state
            .behavior_mut()
            .on_collide_players(&mut self.body, players, inner, ctx);
        self.install(next);
    }

    pub fn on_collide_objective(&mut self, area: &ObjectiveArea, ctx: &mut SimContext) {
        let next = self
            .state
            .behavior_mut()
            .on_collide_objective(&mut self.body, area, ctx);
        self.install(next);
    }

    /// Returns whether the obstacle killed the turtle
    pub fn on_collide_obstacle(&mut self, ctx: &mut SimContext) -> bool {
        self.state
            .behavior_mut()
            .on_collide_obstacle(&mut self.body, ctx)
    }

    /// Break the egg open and start wandering
    pub fn hatch(&mut self, ctx: &mut SimContext) {
        let idle = IdleState::enter(&mut self.body, ctx);
        self.install(Some(TurtleState::Idle(idle)));
        self.body.interactable = true;
    }

    /// Walk back to the spawn area at the reset speed
    pub fn begin_return(&mut self, ctx: &SimContext) {
        let returning = ReturningState::enter(&mut self.body, ctx);
        self.install(Some(TurtleState::Returning(returning)));
        self.body.speed = ctx.px(ctx.settings.turtle_reset_speed);
        self.body.resetting = true;
    }
}
