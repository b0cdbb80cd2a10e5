//! Obstacles that kill turtles, and the manager that places and fades them

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::context::SimContext;
use super::geometry::{HitBox, ellipse_points, pick_spaced_point};
use crate::consts::{FULL_ALPHA, OBSTACLE_MAX_ROTATION};
use crate::settings::Settings;

/// A hazard on the field
#[derive(Debug, Clone, Serialize)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// 0 when invisible, 255 when fully shown
    pub alpha: f32,
    /// Decorative rotation (degrees)
    pub rotation: f32,
    fading: bool,
}

impl Obstacle {
    pub fn new(id: u32, pos: Vec2, rotation: f32, settings: &Settings) -> Self {
        Self {
            id,
            pos,
            radius: settings.px(settings.obstacle_radius),
            alpha: 0.0,
            rotation,
            fading: false,
        }
    }

    /// Fade in after spawning, or out once fading started
    pub fn update(&mut self, dt: f32, settings: &Settings) {
        let step = dt * settings.obstacle_fade_speed;
        if self.fading {
            self.alpha = (self.alpha - step).max(0.0);
        } else if self.alpha < FULL_ALPHA {
            self.alpha = (self.alpha + step).min(FULL_ALPHA);
        }
    }

    pub fn start_fade(&mut self) {
        self.fading = true;
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    /// Fully faded out and ready for removal
    pub fn is_gone(&self) -> bool {
        self.fading && self.alpha <= 0.0
    }

    pub fn hitbox(&self) -> HitBox {
        HitBox::new(self.pos, self.radius)
    }

    /// Fading obstacles never collide
    pub fn collides_with(&self, hitbox: &HitBox) -> bool {
        !self.fading && self.hitbox().overlaps(hitbox)
    }
}

/// Owns the obstacles of a running game
#[derive(Debug, Clone)]
pub struct ObstacleManager {
    obstacles: Vec<Obstacle>,
    active: bool,
    /// Candidate positions around the field
    placement: Vec<Vec2>,
    last_destroyed: Option<Vec2>,
}

impl ObstacleManager {
    /// Inactive manager with an initial, well-spaced set of obstacles
    pub fn new(ctx: &mut SimContext) -> Self {
        let settings = &ctx.settings;
        let placement = ellipse_points(
            settings.screen_center(),
            settings.screen_size() * settings.obstacle_placing,
            settings.ellipse_density,
        );
        let spacing = settings.obstacle_spacing * settings.pixel_height;
        let total = settings.total_obstacles;

        let mut points: Vec<Vec2> = Vec::with_capacity(total);
        while points.len() < total {
            match pick_spaced_point(ctx.rng(), &placement, &points, spacing) {
                Some(point) => points.push(point),
                None => break,
            }
        }

        let obstacles = points
            .into_iter()
            .map(|pos| Self::spawn_obstacle(ctx, pos))
            .collect();

        Self {
            obstacles,
            active: false,
            placement,
            last_destroyed: None,
        }
    }

    fn spawn_obstacle(ctx: &mut SimContext, pos: Vec2) -> Obstacle {
        let id = ctx.next_entity_id();
        let rotation = ctx
            .rng()
            .random_range(-OBSTACLE_MAX_ROTATION..OBSTACLE_MAX_ROTATION);
        Obstacle::new(id, pos, rotation, &ctx.settings)
    }

    /// Fade obstacles, drop one that is gone, and top up while active
    pub fn update(&mut self, dt: f32, ctx: &mut SimContext, turtle_positions: &[Vec2]) {
        for obstacle in &mut self.obstacles {
            obstacle.update(dt, &ctx.settings);
        }

        if let Some(index) = self.obstacles.iter().rposition(Obstacle::is_gone) {
            let removed = self.obstacles.remove(index);
            log::trace!("Obstacle {} faded out", removed.id);
            self.last_destroyed = Some(removed.pos);
        }

        if self.active && self.obstacles.len() < ctx.settings.total_obstacles {
            self.add_obstacle(ctx, turtle_positions);
        }
    }

    /// Place one obstacle clear of obstacles, turtles and the last removed spot
    fn add_obstacle(&mut self, ctx: &mut SimContext, turtle_positions: &[Vec2]) {
        let mut existing: Vec<Vec2> = self.obstacles.iter().map(|o| o.pos).collect();
        existing.extend_from_slice(turtle_positions);
        existing.extend(self.last_destroyed);

        let spacing = ctx.settings.obstacle_spacing * ctx.settings.pixel_height;
        match pick_spaced_point(ctx.rng(), &self.placement, &existing, spacing) {
            Some(pos) => {
                let obstacle = Self::spawn_obstacle(ctx, pos);
                log::trace!("Obstacle {} placed at {pos}", obstacle.id);
                self.obstacles.push(obstacle);
            }
            None => log::trace!("No free obstacle spot this frame"),
        }
    }

    /// Stop spawning and fade every obstacle out
    pub fn fade_all(&mut self) {
        self.active = false;
        for obstacle in &mut self.obstacles {
            obstacle.start_fade();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}
