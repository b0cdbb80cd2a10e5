//! Collision detection and response between turtles and everything else
//!
//! Runs once per frame over borrows of the current managers. Every check is
//! the strict circle test from [`HitBox::overlaps`].

use glam::Vec2;
use serde::Serialize;

use super::areas::ObjectiveArea;
use super::context::SimContext;
use super::geometry::HitBox;
use super::obstacle::ObstacleManager;
use super::player::PlayerManager;
use super::turtle::TurtleManager;

/// What happened during one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollisionReport {
    /// Turtles that touched at least one player
    pub player_contacts: usize,
    /// Turtles killed by obstacles
    pub obstacle_deaths: usize,
    /// Turtles that touched an objective area
    pub objective_entries: usize,
}

/// Players touching a turtle, and whether any inner hitbox was hit
#[derive(Debug, Clone, Default)]
struct PlayerContact {
    positions: Vec<Vec2>,
    inner: bool,
}

/// Borrows the managers of the current phase for one collision pass
pub struct CollisionHandler<'a> {
    turtles: &'a mut TurtleManager,
    players: &'a mut PlayerManager,
    obstacles: Option<&'a mut ObstacleManager>,
    objectives: &'a [ObjectiveArea],
}

impl<'a> CollisionHandler<'a> {
    pub fn new(
        turtles: &'a mut TurtleManager,
        players: &'a mut PlayerManager,
        obstacles: Option<&'a mut ObstacleManager>,
        objectives: &'a [ObjectiveArea],
    ) -> Self {
        Self {
            turtles,
            players,
            obstacles,
            objectives,
        }
    }

    /// Check every turtle present at the start of the frame, in order
    pub fn handle(&mut self, ctx: &mut SimContext) -> CollisionReport {
        let mut report = CollisionReport::default();

        for player in self.players.players_mut() {
            player.clear_contacts();
        }
        for turtle in self.turtles.turtles_mut() {
            turtle.body.colliding = false;
        }

        for id in self.turtles.ids() {
            // A turtle killed earlier this frame is gone
            if self.turtles.turtle(id).is_none() {
                continue;
            }

            self.check_turtles(id);

            if self.check_players(id, ctx) {
                report.player_contacts += 1;
            }

            let obstacles_active = self.obstacles.as_ref().is_some_and(|o| o.is_active());
            if obstacles_active && self.check_obstacles(id, ctx) {
                report.obstacle_deaths += 1;
                continue;
            }

            if self.check_objectives(id, ctx) {
                report.objective_entries += 1;
            }
        }

        if report != CollisionReport::default() {
            log::trace!("Collisions: {report:?}");
        }
        report
    }

    fn hitbox_of(&self, id: u32) -> Option<HitBox> {
        self.turtles.turtle(id).map(|t| t.hitbox())
    }

    /// Both turtles of every overlapping pair are told about each other
    fn check_turtles(&mut self, id: u32) -> bool {
        let Some(hitbox) = self.hitbox_of(id) else {
            return false;
        };
        let others: Vec<u32> = self
            .turtles
            .turtles()
            .iter()
            .filter(|other| other.id() != id && other.hitbox().overlaps(&hitbox))
            .map(|other| other.id())
            .collect();

        for &other in &others {
            if let Some(turtle) = self.turtles.turtle_mut(other) {
                turtle.on_collide_turtle(id);
            }
            if let Some(turtle) = self.turtles.turtle_mut(id) {
                turtle.on_collide_turtle(other);
            }
        }
        !others.is_empty()
    }

    /// One callback with every touching player
    fn check_players(&mut self, id: u32, ctx: &mut SimContext) -> bool {
        let Some(hitbox) = self.hitbox_of(id) else {
            return false;
        };

        let mut contact = PlayerContact::default();
        for player in self.players.players_mut() {
            if player.hitbox().overlaps(&hitbox) {
                player.wall_colliding = true;
                contact.inner = true;
                contact.positions.push(player.pos);
            } else if player.outer_hitbox().overlaps(&hitbox) {
                player.force_colliding = true;
                contact.positions.push(player.pos);
            }
        }

        if contact.positions.is_empty() {
            return false;
        }
        if let Some(turtle) = self.turtles.turtle_mut(id) {
            turtle.on_collide_players(&contact.positions, contact.inner, ctx);
        }
        true
    }

    /// The first solid obstacle that overlaps wins; returns whether the turtle died
    fn check_obstacles(&mut self, id: u32, ctx: &mut SimContext) -> bool {
        let Some(obstacles) = self.obstacles.as_deref_mut() else {
            return false;
        };
        let Some(turtle) = self.turtles.turtle_mut(id) else {
            return false;
        };

        let hitbox = turtle.hitbox();
        let Some(obstacle) = obstacles
            .obstacles_mut()
            .iter_mut()
            .find(|o| o.collides_with(&hitbox))
        else {
            return false;
        };

        if !turtle.on_collide_obstacle(ctx) {
            return false;
        }

        obstacle.start_fade();
        let death_pos = turtle.pos();
        log::debug!("Turtle {id} hit obstacle {}", obstacle.id);

        self.turtles.destroy_turtle(id);
        self.turtles.create_turtle(ctx);
        self.turtles.start_death_animation(death_pos);
        true
    }

    /// The first overlapping area wins
    fn check_objectives(&mut self, id: u32, ctx: &mut SimContext) -> bool {
        let Some(turtle) = self.turtles.turtle_mut(id) else {
            return false;
        };
        let hitbox = turtle.hitbox();
        match self
            .objectives
            .iter()
            .find(|area| area.hitbox().overlaps(&hitbox))
        {
            Some(area) => {
                turtle.on_collide_objective(area, ctx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::turtle::TurtleStateKind;

    fn ctx() -> SimContext {
        SimContext::new(Settings::default(), 3)
    }

    /// One hatched turtle at `pos`
    fn turtles_with_one_at(pos: Vec2, ctx: &mut SimContext) -> (TurtleManager, u32) {
        let mut turtles = TurtleManager::new(ctx, false);
        let id = turtles.create_turtle(ctx).unwrap();
        let turtle = turtles.turtle_mut(id).unwrap();
        turtle.hatch(ctx);
        turtle.body.pos = pos;
        (turtles, id)
    }

    /// One unhatched egg at `pos`
    fn eggs_with_one_at(pos: Vec2, ctx: &mut SimContext) -> (TurtleManager, u32) {
        let mut turtles = TurtleManager::new(ctx, false);
        let id = turtles.create_turtle(ctx).unwrap();
        turtles.turtle_mut(id).unwrap().body.pos = pos;
        (turtles, id)
    }

    #[test]
    fn test_egg_scores_on_objective() {
        let mut ctx = ctx();
        let areas = ObjectiveArea::corners(&ctx.settings);
        let (mut turtles, id) = eggs_with_one_at(areas[0].pos, &mut ctx);
        assert_eq!(turtles.turtle(id).unwrap().kind(), TurtleStateKind::Spawn);
        let mut players = PlayerManager::new();

        let report = CollisionHandler::new(&mut turtles, &mut players, None, &areas).handle(&mut ctx);
        assert_eq!(report.objective_entries, 1);
        assert_eq!(ctx.score, 1);
        assert_eq!(turtles.turtle(id).unwrap().kind(), TurtleStateKind::Objective);
    }

    #[test]
    fn test_egg_dies_on_obstacle() {
        let mut ctx = ctx();
        let mut obstacles = ObstacleManager::new(&mut ctx);
        obstacles.set_active(true);
        let target = obstacles.obstacles()[0].pos;
        let (mut turtles, id) = eggs_with_one_at(target, &mut ctx);
        let mut players = PlayerManager::new();

        let report =
            CollisionHandler::new(&mut turtles, &mut players, Some(&mut obstacles), &[]).handle(&mut ctx);
        assert_eq!(report.obstacle_deaths, 1);
        assert_eq!(ctx.dead_turtles, 1);
        assert!(turtles.turtle(id).is_none());
        assert!(obstacles.obstacles()[0].is_fading());
    }

    #[test]
    fn test_outer_player_contact_sets_force_flag() {
        let mut ctx = ctx();
        let (mut turtles, id) = turtles_with_one_at(Vec2::new(800.0, 500.0), &mut ctx);
        let mut players = PlayerManager::new();
        let player = players.create_player(&ctx.settings).unwrap();
        // Outer radius 212 plus turtle radius 42, inner 106 plus 42
        players.player_mut(player).unwrap().pos = Vec2::new(600.0, 500.0);

        let report = CollisionHandler::new(&mut turtles, &mut players, None, &[]).handle(&mut ctx);
        assert_eq!(report.player_contacts, 1);
        let player = &players.players()[0];
        assert!(player.force_colliding);
        assert!(!player.wall_colliding);
        let turtle = turtles.turtle(id).unwrap();
        assert_eq!(turtle.kind(), TurtleStateKind::Walk);
        assert_eq!(turtle.body.speed, ctx.px(ctx.settings.turtle_walk_speed));
    }

    #[test]
    fn test_inner_contact_with_any_player_is_inner() {
        let mut ctx = ctx();
        let (mut turtles, id) = turtles_with_one_at(Vec2::new(800.0, 500.0), &mut ctx);
        let mut players = PlayerManager::new();
        let far = players.create_player(&ctx.settings).unwrap();
        let near = players.create_player(&ctx.settings).unwrap();
        players.player_mut(far).unwrap().pos = Vec2::new(600.0, 500.0);
        players.player_mut(near).unwrap().pos = Vec2::new(800.0, 600.0);

        CollisionHandler::new(&mut turtles, &mut players, None, &[]).handle(&mut ctx);
        let turtle = turtles.turtle(id).unwrap();
        assert_eq!(turtle.body.speed, ctx.px(ctx.settings.turtle_force_speed));
        assert!(players.player(near).unwrap().wall_colliding);
        assert!(players.player(far).unwrap().force_colliding);
    }

    #[test]
    fn test_contact_flags_reset_each_pass() {
        let mut ctx = ctx();
        let (mut turtles, _) = turtles_with_one_at(Vec2::new(800.0, 500.0), &mut ctx);
        let mut players = PlayerManager::new();
        let player = players.create_player(&ctx.settings).unwrap();
        players.player_mut(player).unwrap().pos = Vec2::new(600.0, 500.0);
        CollisionHandler::new(&mut turtles, &mut players, None, &[]).handle(&mut ctx);

        players.player_mut(player).unwrap().pos = Vec2::new(100.0, 1000.0);
        let report = CollisionHandler::new(&mut turtles, &mut players, None, &[]).handle(&mut ctx);
        assert_eq!(report.player_contacts, 0);
        assert!(!players.players()[0].force_colliding);
    }

    #[test]
    fn test_obstacle_kills_and_replaces() {
        let mut ctx = ctx();
        let (mut turtles, id) = turtles_with_one_at(Vec2::new(800.0, 500.0), &mut ctx);
        let mut players = PlayerManager::new();
        let mut obstacles = ObstacleManager::new(&mut ctx);
        obstacles.set_active(true);
        let target = obstacles.obstacles()[0].pos;
        turtles.turtle_mut(id).unwrap().body.pos = target;

        let report =
            CollisionHandler::new(&mut turtles, &mut players, Some(&mut obstacles), &[]).handle(&mut ctx);
        assert_eq!(report.obstacle_deaths, 1);
        assert_eq!(ctx.dead_turtles, 1);
        assert!(turtles.turtle(id).is_none());
        assert_eq!(turtles.len(), 1);
        assert_eq!(turtles.live_turtles(), 1);
        assert!(obstacles.obstacles()[0].is_fading());
        assert_eq!(turtles.death_animations()[0].pos, target);
    }

    #[test]
    fn test_inactive_obstacles_are_ignored() {
        let mut ctx = ctx();
        let (mut turtles, id) = turtles_with_one_at(Vec2::new(800.0, 500.0), &mut ctx);
        let mut players = PlayerManager::new();
        let mut obstacles = ObstacleManager::new(&mut ctx);
        turtles.turtle_mut(id).unwrap().body.pos = obstacles.obstacles()[0].pos;

        let report =
            CollisionHandler::new(&mut turtles, &mut players, Some(&mut obstacles), &[]).handle(&mut ctx);
        assert_eq!(report.obstacle_deaths, 0);
        assert!(turtles.turtle(id).is_some());
    }

    #[test]
    fn test_returning_turtle_passes_obstacles() {
        let mut ctx = ctx();
        let (mut turtles, id) = turtles_with_one_at(Vec2::new(800.0, 500.0), &mut ctx);
        let mut players = PlayerManager::new();
        let mut obstacles = ObstacleManager::new(&mut ctx);
        obstacles.set_active(true);
        turtles.turtle_mut(id).unwrap().body.pos = obstacles.obstacles()[0].pos;
        turtles.reset_turtles(&ctx);

        let report =
            CollisionHandler::new(&mut turtles, &mut players, Some(&mut obstacles), &[]).handle(&mut ctx);
        assert_eq!(report.obstacle_deaths, 0);
        assert_eq!(ctx.dead_turtles, 0);
        assert!(!obstacles.obstacles()[0].is_fading());
    }

    #[test]
    fn test_objective_scores() {
        let mut ctx = ctx();
        let areas = ObjectiveArea::corners(&ctx.settings);
        let (mut turtles, id) = turtles_with_one_at(areas[2].pos, &mut ctx);
        let mut players = PlayerManager::new();

        let report = CollisionHandler::new(&mut turtles, &mut players, None, &areas).handle(&mut ctx);
        assert_eq!(report.objective_entries, 1);
        assert_eq!(ctx.score, 1);
        assert_eq!(turtles.turtle(id).unwrap().kind(), TurtleStateKind::Objective);

        // Rescued turtles keep overlapping but never score again
        CollisionHandler::new(&mut turtles, &mut players, None, &areas).handle(&mut ctx);
        assert_eq!(ctx.score, 1);
    }
}
