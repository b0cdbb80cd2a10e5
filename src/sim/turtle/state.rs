//! Turtle behavior states
//!
//! Each state owns its movement and its collision responses. A callback that
//! changes behavior returns the next state; the owning [`Turtle`](super::Turtle)
//! installs it, dropping the old one.
//!
//! Every state layers a wiggle under its heading: the direction is
//! interpolated from `start_rotation` to `goal_rotation` over a fixed
//! duration, and when the wiggle timer runs out the persistent wiggle factor
//! flips and a new goal is set a fixed offset to the other side.

use std::f32::consts::PI;
use std::fmt;

use glam::Vec2;
use serde::Serialize;

use super::TurtleBody;
use crate::consts::{FULL_ALPHA, IDLE_GOAL_REACHED_DISTANCE};
use crate::{heading_between, polar_to_cartesian};
use crate::sim::areas::ObjectiveArea;
use crate::sim::context::SimContext;
use crate::sim::geometry::{closest_objective, lerp_progress};

/// Tag of the active state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TurtleStateKind {
    Spawn,
    Idle,
    Roaming,
    Walk,
    Returning,
    Objective,
}

impl TurtleStateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurtleStateKind::Spawn => "Spawn",
            TurtleStateKind::Idle => "Idle",
            TurtleStateKind::Roaming => "Roaming",
            TurtleStateKind::Walk => "Walk",
            TurtleStateKind::Returning => "Returning",
            TurtleStateKind::Objective => "Objective",
        }
    }
}

impl fmt::Display for TurtleStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities every turtle state provides
///
/// Returning `Some(state)` asks the owning turtle to switch to that state.
pub trait TurtleBehavior {
    /// Advance one frame
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        objectives: &[ObjectiveArea],
    ) -> Option<TurtleState>;

    /// Touching another turtle; no state reacts to this yet
    fn on_collide_turtle(&mut self, _body: &mut TurtleBody, _other: u32) -> Option<TurtleState> {
        None
    }

    /// Touching one or more players; `inner` is set if any inner hitbox was hit
    fn on_collide_players(
        &mut self,
        body: &mut TurtleBody,
        players: &[Vec2],
        inner: bool,
        ctx: &mut SimContext,
    ) -> Option<TurtleState>;

    /// Reaching an objective area scores by default
    fn on_collide_objective(
        &mut self,
        body: &mut TurtleBody,
        area: &ObjectiveArea,
        ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        Some(rescue(body, area, ctx))
    }

    /// Touching an obstacle kills by default; returns whether the turtle died
    fn on_collide_obstacle(&mut self, body: &mut TurtleBody, ctx: &mut SimContext) -> bool {
        body.kill(ctx);
        true
    }
}

/// The active behavior of a turtle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TurtleState {
    Spawn(SpawnState),
    Idle(IdleState),
    Roaming(RoamingState),
    Walk(WalkState),
    Returning(ReturningState),
    Objective(ObjectiveState),
}

impl TurtleState {
    pub fn kind(&self) -> TurtleStateKind {
        match self {
            TurtleState::Spawn(_) => TurtleStateKind::Spawn,
            TurtleState::Idle(_) => TurtleStateKind::Idle,
            TurtleState::Roaming(_) => TurtleStateKind::Roaming,
            TurtleState::Walk(_) => TurtleStateKind::Walk,
            TurtleState::Returning(_) => TurtleStateKind::Returning,
            TurtleState::Objective(_) => TurtleStateKind::Objective,
        }
    }

    pub fn behavior_mut(&mut self) -> &mut dyn TurtleBehavior {
        match self {
            TurtleState::Spawn(s) => s,
            TurtleState::Idle(s) => s,
            TurtleState::Roaming(s) => s,
            TurtleState::Walk(s) => s,
            TurtleState::Returning(s) => s,
            TurtleState::Objective(s) => s,
        }
    }
}

/// Interpolated heading oscillation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Wiggle {
    pub start_rotation: f32,
    pub goal_rotation: f32,
}

impl Wiggle {
    fn starting_at(direction: f32) -> Self {
        Self {
            start_rotation: direction,
            goal_rotation: direction,
        }
    }

    /// Rotate from the current heading toward `goal` within `time`
    fn aim(&mut self, body: &mut TurtleBody, goal: f32, time: f32) {
        self.start_rotation = body.direction;
        self.goal_rotation = goal;
        body.wiggle_timer = time;
    }

    /// Start the next swing to the other side
    fn turn(&mut self, body: &mut TurtleBody, duration: f32, offset: f32) {
        body.wiggle_timer = duration;
        body.wiggle_factor = -body.wiggle_factor;
        self.start_rotation = body.direction;
        self.goal_rotation = self.start_rotation + offset * body.wiggle_factor;
    }

    /// Set the heading for the current point of the swing
    fn apply(&self, body: &mut TurtleBody, duration: f32) {
        body.direction = lerp_progress(
            duration - body.wiggle_timer,
            duration,
            self.start_rotation,
            self.goal_rotation,
        );
    }
}

/// Mean heading away from every touching player
///
/// Headings are averaged as unit vectors so they do not wrap around ±π.
/// Returns `fallback` when the pushes cancel out.
pub fn repulsion_direction(pos: Vec2, players: &[Vec2], fallback: f32) -> f32 {
    let away: Vec2 = players
        .iter()
        .map(|&player| (pos - player).normalize_or_zero())
        .sum();
    heading_between(Vec2::ZERO, away, fallback)
}

/// Score the turtle and send it swimming out through `area`
fn rescue(body: &mut TurtleBody, area: &ObjectiveArea, ctx: &mut SimContext) -> TurtleState {
    let state = TurtleState::Objective(ObjectiveState::enter(body, area, ctx));
    ctx.score += 1;
    body.alive = false;
    body.in_objective = true;
    log::debug!("Turtle {} rescued, score {}", body.id, ctx.score);
    state
}

/// Speed while free to move, slowed against the screen edge
fn cruise_speed(body: &TurtleBody, ctx: &SimContext, meters_per_second: f32) -> f32 {
    if body.against_wall {
        ctx.px(ctx.settings.turtle_border_speed)
    } else {
        ctx.px(meters_per_second)
    }
}

/// Egg waiting to hatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnState {
    pub timer: f32,
    pub alpha: f32,
}

impl SpawnState {
    pub fn enter(ctx: &SimContext) -> Self {
        Self {
            timer: ctx.settings.egg_spawn_time,
            alpha: 0.0,
        }
    }
}

impl TurtleBehavior for SpawnState {
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        _objectives: &[ObjectiveArea],
    ) -> Option<TurtleState> {
        if self.timer > 0.0 {
            self.alpha = FULL_ALPHA - (self.timer / ctx.settings.egg_spawn_time) * FULL_ALPHA;
            self.timer -= dt;
        } else {
            body.interactable = true;
        }
        None
    }

    fn on_collide_players(
        &mut self,
        body: &mut TurtleBody,
        _players: &[Vec2],
        _inner: bool,
        ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        Some(TurtleState::Idle(IdleState::enter(body, ctx)))
    }
}

/// Wandering around inside the spawn area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdleState {
    pub wiggle: Wiggle,
    pub goal: Vec2,
}

impl IdleState {
    pub fn enter(body: &mut TurtleBody, ctx: &mut SimContext) -> Self {
        body.returning = false;
        body.idle = true;
        body.roaming = false;
        body.interactable = true;
        body.speed = ctx.px(ctx.settings.turtle_idle_speed);
        body.move_timer = 0.0;
        let mut state = Self {
            wiggle: Wiggle::starting_at(body.direction),
            goal: body.pos,
        };
        state.change_goal(body, ctx);
        state
    }

    fn change_goal(&mut self, body: &mut TurtleBody, ctx: &mut SimContext) {
        let spawn_area = ctx.spawn_area;
        self.goal = spawn_area.random_point(ctx.rng());
        let heading = heading_between(body.pos, self.goal, body.direction);
        self.wiggle
            .aim(body, heading, ctx.settings.wiggle_duration_idle);
    }

    fn update_counters(&mut self, body: &mut TurtleBody, dt: f32, ctx: &mut SimContext) {
        let settings = &ctx.settings;
        let (duration, offset) = (settings.wiggle_duration_idle, settings.wiggle_offset_idle);
        body.wiggle_timer -= dt;
        if body.pos.distance(self.goal) <= IDLE_GOAL_REACHED_DISTANCE {
            self.change_goal(body, ctx);
        }
        self.wiggle.apply(body, duration);
        if body.wiggle_timer <= 0.0 {
            self.wiggle.turn(body, duration, offset);
        }
    }
}

impl TurtleBehavior for IdleState {
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        _objectives: &[ObjectiveArea],
    ) -> Option<TurtleState> {
        body.advance(dt, &ctx.settings);
        self.update_counters(body, dt, ctx);
        body.speed = cruise_speed(body, ctx, ctx.settings.turtle_idle_speed);
        None
    }

    fn on_collide_players(
        &mut self,
        body: &mut TurtleBody,
        players: &[Vec2],
        inner: bool,
        ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        let heading = repulsion_direction(body.pos, players, body.direction);
        let mut walk = WalkState::enter(body, ctx);
        walk.flee(body, heading, inner, ctx);
        Some(TurtleState::Walk(walk))
    }
}

/// Wandering around outside the spawn area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoamingState {
    pub wiggle: Wiggle,
    pub goal: Vec2,
}

impl RoamingState {
    pub fn enter(body: &mut TurtleBody, ctx: &SimContext) -> Self {
        body.returning = false;
        body.idle = false;
        body.roaming = true;
        body.interactable = true;
        body.speed = ctx.px(ctx.settings.turtle_roaming_speed);
        body.move_timer = 0.0;
        Self {
            wiggle: Wiggle::starting_at(body.direction),
            goal: body.pos,
        }
    }

    /// Nearby roam point, heading away from a close objective area
    fn next_goal(body: &TurtleBody, ctx: &mut SimContext, objectives: &[ObjectiveArea]) -> Vec2 {
        let nogo = ctx.px(ctx.settings.roaming_nogo_radius);
        let heading = match closest_objective(objectives, body.pos) {
            Some(area) if area.pos.distance(body.pos) <= nogo => area.swim_direction + PI,
            _ => ctx.random_angle(),
        };
        body.pos + polar_to_cartesian(ctx.settings.roaming_buffer, heading)
    }

    fn update_counters(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        objectives: &[ObjectiveArea],
    ) {
        let (duration, offset) = (
            ctx.settings.wiggle_duration_roaming,
            ctx.settings.wiggle_offset_roaming,
        );
        body.move_timer -= dt;
        body.wiggle_timer -= dt;
        if body.move_timer <= 0.0 {
            self.goal = Self::next_goal(body, ctx, objectives);
            let heading = heading_between(body.pos, self.goal, body.direction);
            self.wiggle.aim(body, heading, duration);
            body.move_timer = ctx.settings.move_duration_roaming;
        }
        self.wiggle.apply(body, duration);
        if body.wiggle_timer <= 0.0 {
            self.wiggle.turn(body, duration, offset);
        }
    }
}

impl TurtleBehavior for RoamingState {
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        objectives: &[ObjectiveArea],
    ) -> Option<TurtleState> {
        body.advance(dt, &ctx.settings);
        if ctx.spawn_area.contains(body.pos) {
            return Some(TurtleState::Idle(IdleState::enter(body, ctx)));
        }
        self.update_counters(body, dt, ctx, objectives);
        body.speed = cruise_speed(body, ctx, ctx.settings.turtle_roaming_speed);
        None
    }

    fn on_collide_players(
        &mut self,
        body: &mut TurtleBody,
        players: &[Vec2],
        inner: bool,
        ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        let mut walk = WalkState::enter(body, ctx);
        let heading = repulsion_direction(body.pos, players, body.direction);
        walk.flee(body, heading, inner, ctx);
        Some(TurtleState::Walk(walk))
    }
}

/// Fleeing from players
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkState {
    pub wiggle: Wiggle,
}

impl WalkState {
    pub fn enter(body: &mut TurtleBody, ctx: &SimContext) -> Self {
        let settings = &ctx.settings;
        body.speed = ctx.px(settings.turtle_walk_speed);
        body.wiggle_timer = 0.0;
        body.move_timer = settings.move_duration_walk;
        body.returning = false;
        body.idle = false;
        body.roaming = false;
        body.interactable = true;
        body.resetting = false;
        let mut state = Self {
            wiggle: Wiggle::starting_at(body.direction),
        };
        state
            .wiggle
            .turn(body, settings.wiggle_duration_walk, settings.wiggle_offset_walk);
        state
    }

    /// Turn toward `heading`; the inner hitbox makes the turtle run
    fn flee(&mut self, body: &mut TurtleBody, heading: f32, inner: bool, ctx: &SimContext) {
        let settings = &ctx.settings;
        body.colliding = true;
        self.wiggle
            .aim(body, heading, settings.interaction_rotate_time);
        body.speed = if body.against_wall {
            ctx.px(settings.turtle_border_speed)
        } else if inner {
            ctx.px(settings.turtle_force_speed)
        } else {
            ctx.px(settings.turtle_walk_speed)
        };
    }

    /// Count down; once both timers lapse, settle into Idle or Roaming
    fn update_counters(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        let (duration, offset) = (ctx.settings.wiggle_duration_walk, ctx.settings.wiggle_offset_walk);
        body.move_timer -= dt;
        body.wiggle_timer -= dt;
        if body.move_timer <= 0.0 && body.wiggle_timer <= 0.0 {
            return Some(if ctx.spawn_area.contains(body.pos) {
                TurtleState::Idle(IdleState::enter(body, ctx))
            } else {
                TurtleState::Roaming(RoamingState::enter(body, ctx))
            });
        }
        self.wiggle.apply(body, duration);
        if body.wiggle_timer <= 0.0 {
            self.wiggle.turn(body, duration, offset);
        }
        None
    }
}

impl TurtleBehavior for WalkState {
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        _objectives: &[ObjectiveArea],
    ) -> Option<TurtleState> {
        if let Some(next) = self.update_counters(body, dt, ctx) {
            return Some(next);
        }
        body.advance(dt, &ctx.settings);
        body.speed = cruise_speed(body, ctx, ctx.settings.turtle_walk_speed);
        None
    }

    fn on_collide_players(
        &mut self,
        body: &mut TurtleBody,
        players: &[Vec2],
        inner: bool,
        ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        let heading = repulsion_direction(body.pos, players, body.direction);
        self.flee(body, heading, inner, ctx);
        None
    }
}

/// Heading back to the spawn area after a natural reset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturningState {
    pub wiggle: Wiggle,
    pub target: Vec2,
    /// Movement waits until the turtle has turned toward the target
    pub initial_rotate_finished: bool,
}

impl ReturningState {
    pub fn enter(body: &mut TurtleBody, ctx: &SimContext) -> Self {
        let settings = &ctx.settings;
        let target = settings.screen_center();
        body.speed = ctx.px(settings.turtle_walk_speed);
        body.returning = true;
        body.idle = false;
        body.roaming = false;
        let mut wiggle = Wiggle::starting_at(body.direction);
        let heading = heading_between(body.pos, target, body.direction);
        wiggle.aim(body, heading, settings.wiggle_duration_returning);
        Self {
            wiggle,
            target,
            initial_rotate_finished: false,
        }
    }

    fn update_counters(&mut self, body: &mut TurtleBody, dt: f32, ctx: &SimContext) {
        let (duration, offset) = (
            ctx.settings.wiggle_duration_returning,
            ctx.settings.wiggle_offset_returning,
        );
        body.wiggle_timer -= dt;
        if body.wiggle_timer <= 0.0 {
            self.initial_rotate_finished = true;
            self.wiggle.turn(body, duration, offset);
        }
        self.wiggle.apply(body, duration);
    }
}

impl TurtleBehavior for ReturningState {
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        _objectives: &[ObjectiveArea],
    ) -> Option<TurtleState> {
        if self.initial_rotate_finished {
            if ctx.spawn_area.contains(body.pos) {
                body.resetting = false;
                return Some(TurtleState::Idle(IdleState::enter(body, ctx)));
            }
            body.advance(dt, &ctx.settings);
        }
        self.update_counters(body, dt, ctx);
        None
    }

    fn on_collide_players(
        &mut self,
        _body: &mut TurtleBody,
        _players: &[Vec2],
        _inner: bool,
        _ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        None
    }

    fn on_collide_obstacle(&mut self, _body: &mut TurtleBody, _ctx: &mut SimContext) -> bool {
        false
    }
}

/// Rescued, swimming out through an objective area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveState {
    pub wiggle: Wiggle,
    pub area: ObjectiveArea,
}

impl ObjectiveState {
    pub fn enter(body: &mut TurtleBody, area: &ObjectiveArea, ctx: &SimContext) -> Self {
        let settings = &ctx.settings;
        let mut wiggle = Wiggle::starting_at(body.direction);
        let heading = heading_between(body.pos, area.swim_destination, body.direction);
        wiggle.aim(body, heading, settings.wiggle_duration_objective);
        body.speed = ctx.px(settings.turtle_objective_speed);
        body.returning = false;
        body.idle = false;
        body.roaming = false;
        Self {
            wiggle,
            area: *area,
        }
    }

    /// Fade with the remaining distance, never brightening again
    fn fade(&self, body: &mut TurtleBody) {
        let distance = body.pos.distance(self.area.swim_destination);
        let alpha = distance / (self.area.radius * 2.0) * FULL_ALPHA;
        if alpha < body.alpha {
            body.alpha = alpha;
        }
    }

    fn update_counters(&mut self, body: &mut TurtleBody, dt: f32, ctx: &SimContext) {
        let (duration, offset) = (
            ctx.settings.wiggle_duration_objective,
            ctx.settings.wiggle_offset_objective,
        );
        body.wiggle_timer -= dt;
        if body.wiggle_timer <= 0.0 {
            self.wiggle.turn(body, duration, offset);
        }
        self.wiggle.apply(body, duration);
    }
}

impl TurtleBehavior for ObjectiveState {
    fn update(
        &mut self,
        body: &mut TurtleBody,
        dt: f32,
        ctx: &mut SimContext,
        _objectives: &[ObjectiveArea],
    ) -> Option<TurtleState> {
        let settings = &ctx.settings;
        let margin = settings.despawn_margin;
        let within = body.pos.x >= -margin
            && body.pos.x <= settings.pixel_width + margin
            && body.pos.y >= -margin
            && body.pos.y <= settings.pixel_height + margin;
        if within {
            body.advance(dt, settings);
        } else {
            body.out_of_screen = true;
        }
        self.update_counters(body, dt, ctx);
        self.fade(body);
        None
    }

    fn on_collide_players(
        &mut self,
        _body: &mut TurtleBody,
        _players: &[Vec2],
        _inner: bool,
        _ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        None
    }

    fn on_collide_objective(
        &mut self,
        _body: &mut TurtleBody,
        _area: &ObjectiveArea,
        _ctx: &mut SimContext,
    ) -> Option<TurtleState> {
        None
    }

    fn on_collide_obstacle(&mut self, _body: &mut TurtleBody, _ctx: &mut SimContext) -> bool {
        false
    }
}
