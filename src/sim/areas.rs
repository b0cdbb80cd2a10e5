//! Fixed field areas: objective corners and the starting area

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use super::geometry::HitBox;
use super::player::Player;
use crate::polar_to_cartesian;
use crate::settings::Settings;

/// Goal zone a turtle swims out through
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveArea {
    pub pos: Vec2,
    pub radius: f32,
    /// Swim-out heading (radians)
    pub swim_direction: f32,
    /// Point past the area a rescued turtle heads for
    pub swim_destination: Vec2,
}

impl ObjectiveArea {
    /// Create an area; `direction_degrees` is the swim-out heading
    pub fn new(pos: Vec2, radius: f32, direction_degrees: f32, visibility_margin: f32) -> Self {
        let swim_direction = direction_degrees.to_radians();
        Self {
            pos,
            radius,
            swim_direction,
            swim_destination: pos + polar_to_cartesian(visibility_margin, swim_direction),
        }
    }

    /// One area per screen corner, each swimming off screen diagonally
    pub fn corners(settings: &Settings) -> Vec<Self> {
        let (w, h) = (settings.pixel_width, settings.pixel_height);
        let radius = settings.px(settings.objective_radius);
        let margin = settings.visibility_margin;
        [
            (Vec2::new(0.0, 0.0), 225.0),
            (Vec2::new(w, 0.0), 315.0),
            (Vec2::new(0.0, h), 135.0),
            (Vec2::new(w, h), 45.0),
        ]
        .into_iter()
        .map(|(pos, degrees)| Self::new(pos, radius, degrees, margin))
        .collect()
    }

    pub fn hitbox(&self) -> HitBox {
        HitBox::new(self.pos, self.radius)
    }
}

/// Rectangle at the bottom of the field where players dwell to start a game
#[derive(Debug, Clone, Serialize)]
pub struct StartingArea {
    pub min: Vec2,
    pub max: Vec2,
    visibility_timer: f32,
    /// Dwell time per player id
    player_timers: BTreeMap<u32, f32>,
}

impl StartingArea {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min,
            max,
            visibility_timer: 0.0,
            player_timers: BTreeMap::new(),
        }
    }

    /// Centered horizontally, touching the bottom edge
    pub fn from_settings(settings: &Settings) -> Self {
        let half_width = settings.px(settings.start_area_width) / 2.0;
        let height = settings.px(settings.start_area_height);
        let x_mid = settings.pixel_width / 2.0;
        Self::new(
            Vec2::new(x_mid - half_width, settings.pixel_height - height),
            Vec2::new(x_mid + half_width, settings.pixel_height),
        )
    }

    /// Accumulate dwell time for players inside the area
    pub fn update_timers(&mut self, players: &[Player], dt: f32, settings: &Settings) {
        if players.is_empty() {
            self.visibility_timer = 0.0;
        } else {
            self.visibility_timer += dt;
        }

        if !self.is_visible(settings) {
            self.player_timers.clear();
            return;
        }

        for player in players {
            if self.contains(player.pos) {
                *self.player_timers.entry(player.id).or_insert(0.0) += dt;
            } else {
                self.player_timers.remove(&player.id);
            }
        }
        self.player_timers
            .retain(|id, _| players.iter().any(|p| p.id == *id));
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Shown once players have been around long enough
    pub fn is_visible(&self, settings: &Settings) -> bool {
        self.visibility_timer >= settings.start_area_visibility_time
    }

    /// Some player has dwelt long enough to start the game
    pub fn is_activated(&self, settings: &Settings) -> bool {
        self.player_timers
            .values()
            .any(|&t| t >= settings.start_game_time)
    }

    /// Longest dwell time, for a progress indicator
    pub fn progress(&self, settings: &Settings) -> f32 {
        let longest = self.player_timers.values().cloned().fold(0.0, f32::max);
        (longest / settings.start_game_time).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(id: u32, pos: Vec2, settings: &Settings) -> Player {
        let mut player = Player::new(id, settings);
        player.pos = pos;
        player
    }

    #[test]
    fn test_objective_destination() {
        let area = ObjectiveArea::new(Vec2::new(0.0, 0.0), 383.0, 225.0, 100.0);
        assert!(area.swim_destination.x < -70.0 && area.swim_destination.x > -71.0);
        assert!(area.swim_destination.y < -70.0 && area.swim_destination.y > -71.0);
    }

    #[test]
    fn test_corners_point_off_screen() {
        let settings = Settings::default();
        let corners = ObjectiveArea::corners(&settings);
        assert_eq!(corners.len(), 4);
        for area in &corners {
            let d = area.swim_destination;
            let off_screen = d.x < 0.0 || d.y < 0.0 || d.x > settings.pixel_width || d.y > settings.pixel_height;
            assert!(off_screen, "{:?} should swim off screen", area.pos);
            assert_eq!(area.radius, settings.px(settings.objective_radius));
        }
    }

    #[test]
    fn test_starting_area_activation() {
        let settings = Settings::default();
        let mut area = StartingArea::from_settings(&settings);
        let inside = Vec2::new(settings.pixel_width / 2.0, settings.pixel_height - 10.0);
        let players = vec![player_at(0, inside, &settings)];

        let dt = 0.1;
        let mut frames = 0;
        while !area.is_activated(&settings) {
            area.update_timers(&players, dt, &settings);
            frames += 1;
            assert!(frames < 100, "area never activated");
        }
        // Visibility delay plus the dwell time
        assert!(frames as f32 * dt >= settings.start_game_time);
    }

    #[test]
    fn test_leaving_area_clears_timer() {
        let settings = Settings::default();
        let mut area = StartingArea::from_settings(&settings);
        let inside = Vec2::new(settings.pixel_width / 2.0, settings.pixel_height - 10.0);
        let mut players = vec![player_at(0, inside, &settings)];
        for _ in 0..15 {
            area.update_timers(&players, 0.1, &settings);
        }
        assert!(area.progress(&settings) > 0.5);

        players[0].pos = Vec2::new(10.0, 10.0);
        area.update_timers(&players, 0.1, &settings);
        assert_eq!(area.progress(&settings), 0.0);
        assert!(!area.is_activated(&settings));
    }

    #[test]
    fn test_no_players_hides_area() {
        let settings = Settings::default();
        let mut area = StartingArea::from_settings(&settings);
        let inside = Vec2::new(settings.pixel_width / 2.0, settings.pixel_height - 10.0);
        area.update_timers(&[player_at(0, inside, &settings)], 0.5, &settings);
        assert!(area.is_visible(&settings));
        area.update_timers(&[], 0.5, &settings);
        assert!(!area.is_visible(&settings));
    }
}
