//! Game state and the phases of a game
//!
//! Each phase owns the managers it needs. Moving between phases hands the
//! managers over by value, so players and turtles carry on seamlessly.

use super::areas::{ObjectiveArea, StartingArea};
use super::context::SimContext;
use super::obstacle::ObstacleManager;
use super::player::PlayerManager;
use super::turtle::TurtleManager;
use crate::settings::Settings;

/// Interactive environment shown between games
#[derive(Debug, Clone)]
pub struct IdlePhase {
    pub players: PlayerManager,
    pub turtles: TurtleManager,
    pub starting_area: StartingArea,
}

impl IdlePhase {
    /// Fresh environment with a field of partly hatched turtles
    pub fn new(ctx: &mut SimContext) -> Self {
        let mut turtles = TurtleManager::new(ctx, true);
        for _ in 0..ctx.settings.max_visible_turtles {
            turtles.create_turtle(ctx);
        }
        turtles.diversify_states(ctx);
        Self::with_managers(PlayerManager::new(), turtles, ctx)
    }

    /// Continue with the managers of a finished reset
    pub fn with_managers(
        players: PlayerManager,
        mut turtles: TurtleManager,
        ctx: &mut SimContext,
    ) -> Self {
        turtles.set_infinite_spawn(true);
        ctx.dead_turtles = 0;
        Self {
            players,
            turtles,
            starting_area: StartingArea::from_settings(&ctx.settings),
        }
    }
}

/// Explanation screen before a game
#[derive(Debug, Clone)]
pub struct StartPhase {
    pub players: PlayerManager,
    /// Seconds left on the screen
    pub timer: f32,
}

impl StartPhase {
    pub fn new(players: PlayerManager, settings: &Settings) -> Self {
        Self {
            players,
            timer: settings.start_screen_time,
        }
    }
}

/// A game in progress
#[derive(Debug, Clone)]
pub struct RunningPhase {
    pub players: PlayerManager,
    pub turtles: TurtleManager,
    pub obstacles: ObstacleManager,
    /// Counts down while nobody is on the field
    pub no_activity_timer: Option<f32>,
}

impl RunningPhase {
    /// Start a game with a full pool of turtles and fresh obstacles
    pub fn new(players: PlayerManager, ctx: &mut SimContext) -> Self {
        let mut turtles = TurtleManager::new(ctx, false);
        for _ in 0..ctx.settings.max_visible_turtles {
            turtles.create_turtle(ctx);
        }
        let obstacles = ObstacleManager::new(ctx);
        ctx.reset_score();
        Self::resume(players, turtles, obstacles)
    }

    /// Continue a game interrupted by a reset
    pub fn resume(
        players: PlayerManager,
        turtles: TurtleManager,
        mut obstacles: ObstacleManager,
    ) -> Self {
        obstacles.set_active(true);
        Self {
            players,
            turtles,
            obstacles,
            no_activity_timer: None,
        }
    }
}

/// Natural reset: turtles walk home, obstacles fade away
#[derive(Debug, Clone)]
pub struct ResetPhase {
    pub players: PlayerManager,
    pub turtles: TurtleManager,
    pub obstacles: ObstacleManager,
}

impl ResetPhase {
    pub fn new(
        players: PlayerManager,
        mut turtles: TurtleManager,
        mut obstacles: ObstacleManager,
        ctx: &SimContext,
    ) -> Self {
        turtles.reset_turtles(ctx);
        obstacles.set_active(true);
        Self {
            players,
            turtles,
            obstacles,
        }
    }
}

/// Win or lose screen
#[derive(Debug, Clone)]
pub struct FinishedPhase {
    /// Seconds left on the screen
    pub timer: f32,
    pub won: bool,
}

impl FinishedPhase {
    pub fn new(ctx: &SimContext) -> Self {
        Self {
            timer: ctx.settings.end_screen_time,
            won: ctx.score >= ctx.settings.score_win_threshold,
        }
    }
}

/// Current phase of the game, owning its managers
#[derive(Debug, Clone)]
pub enum GamePhase {
    Idle(IdlePhase),
    Start(StartPhase),
    Running(RunningPhase),
    Reset(ResetPhase),
    Finished(FinishedPhase),
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Idle(_) => "Idle",
            GamePhase::Start(_) => "Start",
            GamePhase::Running(_) => "Running",
            GamePhase::Reset(_) => "Reset",
            GamePhase::Finished(_) => "Finished",
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub ctx: SimContext,
    /// Fixed for the lifetime of the game
    pub objective_areas: Vec<ObjectiveArea>,
    pub phase: GamePhase,
    /// Show the debug overlay
    pub debug_mode: bool,
}

impl GameState {
    /// Create a game in the idle environment with the given seed
    pub fn new(settings: Settings, seed: u64) -> Self {
        let mut ctx = SimContext::new(settings, seed);
        let objective_areas = ObjectiveArea::corners(&ctx.settings);
        let phase = GamePhase::Idle(IdlePhase::new(&mut ctx));
        ctx.debug.game_phase = phase.name();
        log::info!("Game created with seed {seed}");
        Self {
            ctx,
            objective_areas,
            phase,
            debug_mode: false,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    /// Players of the current phase; the end screen has none
    pub fn player_manager(&self) -> Option<&PlayerManager> {
        match &self.phase {
            GamePhase::Idle(p) => Some(&p.players),
            GamePhase::Start(p) => Some(&p.players),
            GamePhase::Running(p) => Some(&p.players),
            GamePhase::Reset(p) => Some(&p.players),
            GamePhase::Finished(_) => None,
        }
    }

    pub fn player_manager_mut(&mut self) -> Option<&mut PlayerManager> {
        match &mut self.phase {
            GamePhase::Idle(p) => Some(&mut p.players),
            GamePhase::Start(p) => Some(&mut p.players),
            GamePhase::Running(p) => Some(&mut p.players),
            GamePhase::Reset(p) => Some(&mut p.players),
            GamePhase::Finished(_) => None,
        }
    }

    pub fn turtle_manager(&self) -> Option<&TurtleManager> {
        match &self.phase {
            GamePhase::Idle(p) => Some(&p.turtles),
            GamePhase::Running(p) => Some(&p.turtles),
            GamePhase::Reset(p) => Some(&p.turtles),
            GamePhase::Start(_) | GamePhase::Finished(_) => None,
        }
    }

    pub fn turtle_manager_mut(&mut self) -> Option<&mut TurtleManager> {
        match &mut self.phase {
            GamePhase::Idle(p) => Some(&mut p.turtles),
            GamePhase::Running(p) => Some(&mut p.turtles),
            GamePhase::Reset(p) => Some(&mut p.turtles),
            GamePhase::Start(_) | GamePhase::Finished(_) => None,
        }
    }

    pub fn obstacle_manager(&self) -> Option<&ObstacleManager> {
        match &self.phase {
            GamePhase::Running(p) => Some(&p.obstacles),
            GamePhase::Reset(p) => Some(&p.obstacles),
            _ => None,
        }
    }

    pub fn starting_area(&self) -> Option<&StartingArea> {
        match &self.phase {
            GamePhase::Idle(p) => Some(&p.starting_area),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::turtle::TurtleStateKind;

    #[test]
    fn test_new_game_starts_idle() {
        let state = GameState::new(Settings::default(), 12345);
        assert_eq!(state.phase_name(), "Idle");
        assert_eq!(state.objective_areas.len(), 4);
        assert!(state.player_manager().is_some_and(|p| p.is_empty()));

        let turtles = state.turtle_manager().unwrap();
        assert_eq!(turtles.len(), state.ctx.settings.max_visible_turtles);
        assert!(turtles.turtles().iter().all(|t| t.kind() == TurtleStateKind::Idle));
        assert!(state.obstacle_manager().is_none());
        assert!(state.starting_area().is_some());
    }

    #[test]
    fn test_running_phase_resets_score() {
        let mut ctx = SimContext::new(Settings::default(), 1);
        ctx.score = 3;
        ctx.dead_turtles = 2;
        let running = RunningPhase::new(PlayerManager::new(), &mut ctx);
        assert_eq!((ctx.score, ctx.dead_turtles), (0, 0));
        assert!(running.obstacles.is_active());
        assert_eq!(running.turtles.len(), ctx.settings.max_visible_turtles);
        assert_eq!(
            running.turtles.left_to_spawn(),
            ctx.settings.total_turtles - ctx.settings.max_visible_turtles as u32
        );
    }

    #[test]
    fn test_finished_phase_decides_win() {
        let mut ctx = SimContext::new(Settings::default(), 1);
        ctx.score = ctx.settings.score_win_threshold;
        assert!(FinishedPhase::new(&ctx).won);
        ctx.score -= 1;
        assert!(!FinishedPhase::new(&ctx).won);
    }
}
