//! Game settings and tunables
//!
//! Distances are stored in meters and converted to screen pixels with
//! [`Settings::px`]; durations are in seconds. A settings file may list any
//! subset of fields, the rest fall back to the stock values.

use std::io;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Every tunable of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Screen ===
    pub pixel_width: f32,
    pub pixel_height: f32,
    /// Conversion factor from meters on the projected floor to pixels
    pub pixels_per_meter: f32,

    // === Game rules ===
    /// Size of the turtle pool for one game
    pub total_turtles: u32,
    pub max_visible_turtles: usize,
    /// Debug players created by the driver
    pub number_of_players: u32,
    /// Rescued turtles needed to win
    pub score_win_threshold: u32,
    /// Seconds without players before the field resets
    pub no_activity_timeout: f32,
    pub start_screen_time: f32,
    pub end_screen_time: f32,
    /// Share of idle-environment turtles hatched right away (0.0 - 1.0)
    pub percentage_of_hatched_turtles: f32,
    /// Show the explanation screen between idle and running
    pub show_tutorial: bool,

    // === Players ===
    /// Outer "force" hitbox radius (meters)
    pub player_force_radius: f32,
    /// Inner "wall" hitbox radius (meters)
    pub player_wall_radius: f32,
    /// Seconds a tracked player may stand still before removal
    pub player_timeout: f32,
    pub auto_destroy_players: bool,

    // === Turtles ===
    /// Distance kept from the screen edge (meters)
    pub turtle_border_offset: f32,
    pub turtle_radius: f32,
    pub egg_spawn_time: f32,
    pub turtle_walk_speed: f32,
    pub turtle_force_speed: f32,
    pub turtle_idle_speed: f32,
    pub turtle_roaming_speed: f32,
    pub turtle_reset_speed: f32,
    pub turtle_objective_speed: f32,
    pub turtle_border_speed: f32,

    // === Wiggle ===
    pub wiggle_duration_idle: f32,
    pub wiggle_offset_idle: f32,
    pub wiggle_duration_objective: f32,
    pub wiggle_offset_objective: f32,
    pub wiggle_duration_returning: f32,
    pub wiggle_offset_returning: f32,
    pub move_duration_roaming: f32,
    pub wiggle_duration_roaming: f32,
    pub wiggle_offset_roaming: f32,
    pub move_duration_walk: f32,
    pub wiggle_duration_walk: f32,
    pub wiggle_offset_walk: f32,
    /// Time to turn away from a player
    pub interaction_rotate_time: f32,
    /// Distance of a new roaming goal (pixels)
    pub roaming_buffer: f32,

    // === Objective areas ===
    pub objective_radius: f32,
    /// How far past an area's center the swim destination lies (pixels)
    pub visibility_margin: f32,
    /// How far off screen a rescued turtle swims before it is reaped (pixels)
    pub despawn_margin: f32,
    /// Roaming turtles this close to an area head away from it (meters)
    pub roaming_nogo_radius: f32,

    // === Starting area ===
    pub start_game_time: f32,
    pub start_area_width: f32,
    pub start_area_height: f32,
    pub start_area_visibility_time: f32,

    // === Obstacles ===
    pub total_obstacles: usize,
    pub obstacle_radius: f32,
    /// Minimum distance between placed obstacles, as a share of screen height
    pub obstacle_spacing: f32,
    /// Placement ellipse radii, as a share of screen size
    pub obstacle_placing: f32,
    /// Candidate points on the placement ellipse
    pub ellipse_density: usize,
    /// Alpha units per second
    pub obstacle_fade_speed: f32,

    // === Player trails ===
    pub trail_duration: f32,
    /// Points recorded per second
    pub trail_frequency: f32,
    /// Opacity lost per update once a point starts fading
    pub trail_fade_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pixel_width: 1920.0,
            pixel_height: 1080.0,
            pixels_per_meter: 425.793_5,

            total_turtles: 15,
            max_visible_turtles: 5,
            number_of_players: 3,
            score_win_threshold: 8,
            no_activity_timeout: 3.0,
            start_screen_time: 10.0,
            end_screen_time: 8.0,
            percentage_of_hatched_turtles: 1.0,
            show_tutorial: false,

            player_force_radius: 0.5,
            player_wall_radius: 0.25,
            player_timeout: 3.0,
            auto_destroy_players: true,

            turtle_border_offset: 0.3,
            turtle_radius: 0.1,
            egg_spawn_time: 1.5,
            turtle_walk_speed: 0.6,
            turtle_force_speed: 0.6 * 3.5,
            turtle_idle_speed: 0.25,
            turtle_roaming_speed: 0.125,
            turtle_reset_speed: 0.25,
            turtle_objective_speed: 0.6,
            turtle_border_speed: 0.125,

            wiggle_duration_idle: 0.4,
            wiggle_offset_idle: 0.2,
            wiggle_duration_objective: 0.4,
            wiggle_offset_objective: 0.5,
            wiggle_duration_returning: 0.8,
            wiggle_offset_returning: 0.1,
            move_duration_roaming: 1.0,
            wiggle_duration_roaming: 0.4,
            wiggle_offset_roaming: 0.15,
            move_duration_walk: 0.8,
            wiggle_duration_walk: 0.2,
            wiggle_offset_walk: 0.6,
            interaction_rotate_time: 0.1,
            roaming_buffer: 50.0,

            objective_radius: 0.9,
            visibility_margin: 100.0,
            despawn_margin: 25.0,
            roaming_nogo_radius: 1.5,

            start_game_time: 2.0,
            start_area_width: 1.2,
            start_area_height: 1.0,
            start_area_visibility_time: 0.1,

            total_obstacles: 4,
            obstacle_radius: 0.13,
            obstacle_spacing: 0.16667,
            obstacle_placing: 0.35,
            ellipse_density: 20,
            obstacle_fade_speed: 1000.0,

            trail_duration: 0.7,
            trail_frequency: 100.0,
            trail_fade_speed: 0.05,
        }
    }
}

impl Settings {
    /// Convert meters to whole screen pixels
    #[inline]
    pub fn px(&self, meters: f32) -> f32 {
        (self.pixels_per_meter * meters).trunc()
    }

    /// Screen size in pixels
    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.pixel_width, self.pixel_height)
    }

    pub fn screen_center(&self) -> Vec2 {
        self.screen_size() / 2.0
    }

    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings when a path is given, falling back to defaults on error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path).unwrap_or_else(|err| {
                log::warn!("{err}, using default settings");
                Self::default()
            }),
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
