//! Read-only snapshot of a frame
//!
//! Everything a renderer or debug overlay needs, detached from the
//! simulation so it can be serialized or sent elsewhere.

use glam::Vec2;
use serde::Serialize;

use crate::sim::areas::ObjectiveArea;
use crate::sim::context::DebugCounters;
use crate::sim::obstacle::Obstacle;
use crate::sim::player::Player;
use crate::sim::state::{GamePhase, GameState};
use crate::sim::turtle::{DeathAnimation, Turtle, TurtleStateKind};

/// How to draw one turtle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurtleView {
    pub id: u32,
    pub pos: Vec2,
    pub direction: f32,
    pub radius: f32,
    pub alpha: f32,
    pub kind: TurtleStateKind,
    /// Debug label, e.g. `4: Walk`
    pub state: String,
    pub colliding: bool,
}

impl From<&Turtle> for TurtleView {
    fn from(turtle: &Turtle) -> Self {
        Self {
            id: turtle.id(),
            pos: turtle.pos(),
            direction: turtle.body.direction,
            radius: turtle.body.radius,
            alpha: turtle.alpha(),
            kind: turtle.kind(),
            state: turtle.state_identifier(),
            colliding: turtle.body.colliding,
        }
    }
}

/// The starting area while the idle environment is shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartingAreaView {
    pub min: Vec2,
    pub max: Vec2,
    pub visible: bool,
    /// 0.0 - 1.0 toward starting the game
    pub progress: f32,
}

/// Snapshot of the whole field
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub phase: &'static str,
    pub score: u32,
    pub dead_turtles: u32,
    /// Set on the end screen
    pub won: Option<bool>,
    pub debug_mode: bool,
    pub debug: DebugCounters,
    pub turtles: Vec<TurtleView>,
    pub players: Vec<Player>,
    pub obstacles: Vec<Obstacle>,
    pub objective_areas: Vec<ObjectiveArea>,
    pub starting_area: Option<StartingAreaView>,
    /// Pending death animations; the renderer takes them from the turtle manager
    pub death_animations: Vec<DeathAnimation>,
}

impl FrameView {
    pub fn capture(state: &GameState) -> Self {
        let settings = &state.ctx.settings;
        let won = match &state.phase {
            GamePhase::Finished(finished) => Some(finished.won),
            _ => None,
        };
        let turtles = state.turtle_manager();

        Self {
            phase: state.phase_name(),
            score: state.ctx.score,
            dead_turtles: state.ctx.dead_turtles,
            won,
            debug_mode: state.debug_mode,
            debug: state.ctx.debug.clone(),
            turtles: turtles
                .map(|t| t.turtles().iter().map(TurtleView::from).collect())
                .unwrap_or_default(),
            players: state
                .player_manager()
                .map(|p| p.players().to_vec())
                .unwrap_or_default(),
            obstacles: state
                .obstacle_manager()
                .map(|o| o.obstacles().to_vec())
                .unwrap_or_default(),
            objective_areas: state.objective_areas.clone(),
            starting_area: state.starting_area().map(|area| StartingAreaView {
                min: area.min,
                max: area.max,
                visible: area.is_visible(settings),
                progress: area.progress(settings),
            }),
            death_animations: turtles
                .map(|t| t.death_animations().to_vec())
                .unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::input::InputRecord;
    use crate::sim::tick;

    #[test]
    fn test_capture_idle_field() {
        let state = GameState::new(Settings::default(), 2024);
        let view = FrameView::capture(&state);
        assert_eq!(view.phase, "Idle");
        assert_eq!(view.turtles.len(), state.ctx.settings.max_visible_turtles);
        assert!(view.obstacles.is_empty());
        assert_eq!(view.objective_areas.len(), 4);
        assert!(view.starting_area.is_some());
        assert_eq!(view.won, None);
        for turtle in &view.turtles {
            assert!(turtle.state.starts_with(&format!("{}: ", turtle.id)));
        }
    }

    #[test]
    fn test_capture_running_field_serializes() {
        let mut state = GameState::new(Settings::default(), 2024);
        tick(
            &mut state,
            &[InputRecord {
                space: true,
                ..InputRecord::frame(0.016)
            }],
        );
        let view = FrameView::capture(&state);
        assert_eq!(view.phase, "Running");
        assert!(view.starting_area.is_none());
        assert!(!view.obstacles.is_empty());

        let json = view.to_json().expect("serializable");
        assert!(json.contains("\"phase\": \"Running\""));
        assert!(json.contains("\"kind\": \"Spawn\""));
    }
}
