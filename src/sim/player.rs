//! Players, their fading trails, and the player manager

use std::collections::VecDeque;

use glam::Vec2;
use serde::Serialize;

use super::context::SimContext;
use super::geometry::HitBox;
use super::input::{Frame, InputRecord, InputSource};
use crate::consts::{DEFAULT_PLAYER_X, DEFAULT_PLAYER_Y, TRAIL_CAPACITY};
use crate::heading_between;
use crate::settings::Settings;

/// A footprint left behind a player
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub direction: f32,
    /// 1.0 when fresh, removed at 0
    pub opacity: f32,
    /// Seconds before the point starts fading
    fade_timer: f32,
}

impl TrailPoint {
    fn new(pos: Vec2, direction: f32, settings: &Settings) -> Self {
        Self {
            pos,
            direction,
            opacity: 1.0,
            fade_timer: settings.trail_duration,
        }
    }

    fn fade(&mut self, dt: f32, settings: &Settings) {
        if self.fade_timer > 0.0 {
            self.fade_timer -= dt;
        } else {
            self.opacity -= settings.trail_fade_speed;
        }
    }
}

/// Bounded queue of trail points, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    #[serde(skip)]
    timer: f32,
}

impl Trail {
    pub fn new(settings: &Settings) -> Self {
        Self {
            points: VecDeque::with_capacity(TRAIL_CAPACITY),
            timer: 1.0 / settings.trail_frequency,
        }
    }

    /// Drop a point if the sampling interval elapsed
    pub fn record(&mut self, pos: Vec2, direction: f32, settings: &Settings) {
        if self.timer > 0.0 {
            return;
        }
        if self.points.len() == TRAIL_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(TrailPoint::new(pos, direction, settings));
        self.timer = 1.0 / settings.trail_frequency;
    }

    /// Advance the sampling timer and fade points out
    pub fn update(&mut self, dt: f32, settings: &Settings) {
        self.timer -= dt;
        self.points.retain(|p| p.opacity > 0.0);
        for point in &mut self.points {
            point.fade(dt, settings);
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A person (or debug cursor) pushing turtles around
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: u32,
    pub pos: Vec2,
    /// Heading of the last movement (radians)
    pub direction: f32,
    /// Inner "wall" hitbox radius (pixels)
    pub wall_radius: f32,
    /// Outer "force" hitbox radius (pixels)
    pub force_radius: f32,
    /// Seconds left before an idle tracked player is removed
    pub timeout_timer: f32,
    pub trail: Trail,
    /// A turtle touched the outer hitbox this frame
    pub force_colliding: bool,
    /// A turtle touched the inner hitbox this frame
    pub wall_colliding: bool,
}

impl Player {
    pub fn new(id: u32, settings: &Settings) -> Self {
        Self {
            id,
            pos: Vec2::new(DEFAULT_PLAYER_X, DEFAULT_PLAYER_Y),
            direction: 0.0,
            wall_radius: settings.px(settings.player_wall_radius),
            force_radius: settings.px(settings.player_force_radius),
            timeout_timer: settings.player_timeout,
            trail: Trail::new(settings),
            force_colliding: false,
            wall_colliding: false,
        }
    }

    /// Apply one input record
    pub fn update(&mut self, input: &InputRecord, settings: &Settings) {
        if input.source.is_relative() {
            let delta = input.target;
            self.direction = heading_between(Vec2::ZERO, delta, self.direction);
            let mut next = self.pos;
            if (self.pos.x > 0.0 && delta.x < 0.0) || (self.pos.x < settings.pixel_width && delta.x > 0.0) {
                next.x += delta.x;
            }
            if (self.pos.y > 0.0 && delta.y < 0.0) || (self.pos.y < settings.pixel_height && delta.y > 0.0) {
                next.y += delta.y;
            }
            self.set_position(next, settings);
        } else {
            self.direction = heading_between(self.pos, input.target, self.direction);
            self.set_position(input.target, settings);
        }
        self.trail.record(self.pos, self.direction, settings);
    }

    /// Move the player; the timeout restarts only on a whole-pixel change
    pub fn set_position(&mut self, pos: Vec2, settings: &Settings) {
        let moved = pos.x as i32 != self.pos.x as i32 || pos.y as i32 != self.pos.y as i32;
        if moved {
            self.timeout_timer = settings.player_timeout;
        }
        self.pos = pos;
    }

    /// Inner, impenetrable hitbox
    pub fn hitbox(&self) -> HitBox {
        HitBox::new(self.pos, self.wall_radius)
    }

    /// Outer hitbox that scares turtles away
    pub fn outer_hitbox(&self) -> HitBox {
        HitBox::new(self.pos, self.force_radius)
    }

    pub fn clear_contacts(&mut self) {
        self.force_colliding = false;
        self.wall_colliding = false;
    }
}

/// Owns every player on the field
#[derive(Debug, Clone, Default)]
pub struct PlayerManager {
    players: Vec<Player>,
    next_id: u32,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route this frame's input to players, expire idle ones, fade trails
    pub fn update(&mut self, frame: Frame<'_>, ctx: &mut SimContext) {
        if frame.kill_players() {
            self.destroy_all_players();
            return;
        }
        if frame.add_player() {
            self.create_player(&ctx.settings);
            return;
        }

        if frame.valid().any(|input| input.source == InputSource::Tracked) {
            ctx.tracking_active = true;
        }

        for input in frame.valid() {
            let slot = input.source.debug_slot();
            for player in &mut self.players {
                let matches = match slot {
                    None => player.id == input.id,
                    Some(slot) => player.id == slot,
                };
                if matches {
                    player.update(input, &ctx.settings);
                }
            }
        }

        let dt = frame.dt();
        if ctx.tracking_active && ctx.settings.auto_destroy_players {
            self.expire_idle_player(dt);
        }

        for player in &mut self.players {
            player.trail.update(dt, &ctx.settings);
        }
        ctx.debug.player_count = self.players.len();
    }

    /// Count down timeouts, removing at most one expired player
    fn expire_idle_player(&mut self, dt: f32) {
        let mut expired = None;
        for player in &mut self.players {
            if player.timeout_timer - dt <= 0.0 {
                expired = Some(player.id);
                break;
            }
            player.timeout_timer -= dt;
        }
        if let Some(id) = expired {
            log::debug!("Player {id} timed out");
            self.destroy_player(id);
        }
    }

    /// Create a player with the next free id
    pub fn create_player(&mut self, settings: &Settings) -> Option<u32> {
        let id = self.next_id;
        self.create_player_with_id(id, settings).map(|player| player.id)
    }

    /// Create a player for an externally assigned id; `None` if the id is taken
    pub fn create_player_with_id(&mut self, id: u32, settings: &Settings) -> Option<&mut Player> {
        if self.player(id).is_some() {
            log::warn!("Player {id} already exists");
            return None;
        }
        Some(self.push_player(id, settings))
    }

    /// Look up a player, creating it when unknown
    pub fn get_or_create(&mut self, id: u32, settings: &Settings) -> &mut Player {
        match self.players.iter().position(|p| p.id == id) {
            Some(index) => &mut self.players[index],
            None => self.push_player(id, settings),
        }
    }

    fn push_player(&mut self, id: u32, settings: &Settings) -> &mut Player {
        match id.checked_add(1) {
            Some(next) => self.next_id = self.next_id.max(next),
            None => log::warn!("Player ids exhausted"),
        }
        log::debug!("Player {id} joined");
        self.players.push(Player::new(id, settings));
        let last = self.players.len() - 1;
        &mut self.players[last]
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Remove one player; returns whether it existed
    pub fn destroy_player(&mut self, id: u32) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != id);
        before != self.players.len()
    }

    pub fn destroy_players(&mut self, ids: &[u32]) {
        self.players.retain(|p| !ids.contains(&p.id));
    }

    /// Remove everyone and restart id assignment
    pub fn destroy_all_players(&mut self) {
        self.players.clear();
        self.next_id = 0;
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.players.iter().map(|p| p.pos).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
