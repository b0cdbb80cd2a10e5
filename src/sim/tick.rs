//! Frame-driven simulation tick
//!
//! Advances the current phase by one frame of input. A phase asks for a
//! change by returning a [`Transition`]; the tick then builds the next phase
//! from the managers of the previous one.

use super::areas::ObjectiveArea;
use super::collision::{CollisionHandler, CollisionReport};
use super::context::SimContext;
use super::input::{Frame, InputRecord};
use super::state::{
    FinishedPhase, GamePhase, GameState, IdlePhase, ResetPhase, RunningPhase, StartPhase,
};

/// Phase change requested by a phase update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle to the explanation screen
    StartGame,
    /// Idle or explanation screen to a fresh game
    RunGame,
    /// Game over, show the result
    Finish,
    /// Nobody is playing, walk the turtles home
    Reset,
    /// A player came back during the reset
    Resume,
    /// Reset complete, back to the interactive environment
    ReturnToIdle,
    /// End screen done
    NewGame,
}

/// Advance the game by one frame
pub fn tick(state: &mut GameState, inputs: &[InputRecord]) {
    let frame = Frame::new(inputs);

    if frame.toggle_debug() {
        state.debug_mode = !state.debug_mode;
        log::debug!("Debug mode {}", if state.debug_mode { "on" } else { "off" });
    }

    let GameState {
        ctx,
        objective_areas,
        phase,
        ..
    } = state;
    let transition = match phase {
        GamePhase::Idle(idle) => idle.update(frame, ctx, objective_areas),
        GamePhase::Start(start) => start.update(frame, ctx),
        GamePhase::Running(running) => running.update(frame, ctx, objective_areas),
        GamePhase::Reset(reset) => reset.update(frame, ctx, objective_areas),
        GamePhase::Finished(finished) => finished.update(frame),
    };

    if let Some(transition) = transition {
        apply(state, transition);
    }
    state.ctx.debug.game_phase = state.phase_name();
    log::trace!("Frame done: {:?}", state.ctx.debug);
}

/// Install the phase `transition` leads to from the current one
fn apply(state: &mut GameState, transition: Transition) {
    let ctx = &mut state.ctx;
    let placeholder = GamePhase::Finished(FinishedPhase::new(ctx));
    let previous = std::mem::replace(&mut state.phase, placeholder);
    let from = previous.name();

    state.phase = match (previous, transition) {
        (GamePhase::Idle(idle), Transition::StartGame) => {
            GamePhase::Start(StartPhase::new(idle.players, &ctx.settings))
        }
        (GamePhase::Idle(IdlePhase { players, .. }), Transition::RunGame)
        | (GamePhase::Start(StartPhase { players, .. }), Transition::RunGame) => {
            GamePhase::Running(RunningPhase::new(players, ctx))
        }
        (GamePhase::Running(_), Transition::Finish) => {
            let finished = FinishedPhase::new(ctx);
            log::info!(
                "Game over: {} rescued, {} lost, {}",
                ctx.score,
                ctx.dead_turtles,
                if finished.won { "won" } else { "lost" }
            );
            GamePhase::Finished(finished)
        }
        (GamePhase::Running(running), Transition::Reset) => GamePhase::Reset(ResetPhase::new(
            running.players,
            running.turtles,
            running.obstacles,
            ctx,
        )),
        (GamePhase::Reset(reset), Transition::Resume) => GamePhase::Running(RunningPhase::resume(
            reset.players,
            reset.turtles,
            reset.obstacles,
        )),
        (GamePhase::Reset(reset), Transition::ReturnToIdle) => {
            GamePhase::Idle(IdlePhase::with_managers(reset.players, reset.turtles, ctx))
        }
        (GamePhase::Finished(_), Transition::NewGame) => {
            ctx.reset_score();
            GamePhase::Idle(IdlePhase::new(ctx))
        }
        (previous, transition) => {
            log::warn!("Ignoring {transition:?} during {}", previous.name());
            previous
        }
    };

    let to = state.phase.name();
    if from != to {
        log::info!("Game phase {from} -> {to}");
    }
}

impl IdlePhase {
    fn update(
        &mut self,
        frame: Frame<'_>,
        ctx: &mut SimContext,
        objectives: &[ObjectiveArea],
    ) -> Option<Transition> {
        let dt = frame.dt();
        let start = if ctx.settings.show_tutorial {
            Transition::StartGame
        } else {
            Transition::RunGame
        };

        if frame.space_pressed() {
            return Some(start);
        }
        self.starting_area
            .update_timers(self.players.players(), dt, &ctx.settings);
        if self.starting_area.is_activated(&ctx.settings) {
            return Some(start);
        }

        let collisions =
            CollisionHandler::new(&mut self.turtles, &mut self.players, None, objectives).handle(ctx);
        ctx.debug.collisions = collisions;
        self.turtles.update(dt, ctx, objectives);
        self.players.update(frame, ctx);
        None
    }
}

impl StartPhase {
    fn update(&mut self, frame: Frame<'_>, ctx: &mut SimContext) -> Option<Transition> {
        if frame.inputs.is_empty() {
            return None;
        }
        self.players.update(frame, ctx);
        self.timer -= frame.dt();
        (self.timer <= 0.0).then_some(Transition::RunGame)
    }
}

impl RunningPhase {
    fn update(
        &mut self,
        frame: Frame<'_>,
        ctx: &mut SimContext,
        objectives: &[ObjectiveArea],
    ) -> Option<Transition> {
        let dt = frame.dt();

        let all_accounted = ctx.score + ctx.dead_turtles == ctx.settings.total_turtles;
        let pool_empty = self.turtles.left_to_spawn() == 0 && self.turtles.is_empty();
        if all_accounted || pool_empty {
            return Some(Transition::Finish);
        }
        if self.detect_no_activity(dt, ctx) {
            return Some(Transition::Reset);
        }

        let collisions = CollisionHandler::new(
            &mut self.turtles,
            &mut self.players,
            Some(&mut self.obstacles),
            objectives,
        )
        .handle(ctx);
        ctx.debug.collisions = collisions;
        let turtle_positions = self.turtles.positions();
        self.obstacles.update(dt, ctx, &turtle_positions);
        self.turtles.update(dt, ctx, objectives);
        self.players.update(frame, ctx);
        None
    }

    /// True once the field has been empty for the no-activity timeout
    fn detect_no_activity(&mut self, dt: f32, ctx: &SimContext) -> bool {
        if !self.players.is_empty() {
            self.no_activity_timer = None;
            return false;
        }
        let timer = self
            .no_activity_timer
            .get_or_insert(ctx.settings.no_activity_timeout);
        *timer -= dt;
        *timer <= 0.0
    }
}

impl ResetPhase {
    fn update(
        &mut self,
        frame: Frame<'_>,
        ctx: &mut SimContext,
        objectives: &[ObjectiveArea],
    ) -> Option<Transition> {
        let dt = frame.dt();
        ctx.debug.collisions = CollisionReport::default();
        let turtle_positions = self.turtles.positions();
        self.obstacles.update(dt, ctx, &turtle_positions);
        self.turtles.update(dt, ctx, objectives);
        self.players.update(frame, ctx);

        if !self.players.is_empty() {
            return Some(Transition::Resume);
        }
        if self.turtles.all_turtles_returned(ctx) {
            log::debug!("All turtles returned, clearing obstacles");
            self.obstacles.fade_all();
        }
        self.obstacles.is_empty().then_some(Transition::ReturnToIdle)
    }
}

impl FinishedPhase {
    fn update(&mut self, frame: Frame<'_>) -> Option<Transition> {
        if frame.space_pressed() {
            return Some(Transition::NewGame);
        }
        self.timer -= frame.dt();
        (self.timer <= 0.0).then_some(Transition::NewGame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::input::InputSource;
    use crate::sim::turtle::TurtleStateKind;
    use glam::Vec2;
    use std::f32::consts::TAU;

    const DT: f32 = 1.0 / 60.0;

    fn space() -> InputRecord {
        InputRecord {
            space: true,
            ..InputRecord::frame(DT)
        }
    }

    fn idle_frames(state: &mut GameState, dt: f32, count: usize) {
        for _ in 0..count {
            tick(state, &[InputRecord::frame(dt)]);
        }
    }

    #[test]
    fn test_space_starts_game() {
        let mut state = GameState::new(Settings::default(), 12345);
        state.ctx.score = 4;
        tick(&mut state, &[space()]);
        assert_eq!(state.phase_name(), "Running");
        assert_eq!(state.ctx.debug.game_phase, "Running");
        assert_eq!(state.ctx.score, 0);
        assert!(state.obstacle_manager().is_some_and(|o| o.is_active()));
    }

    #[test]
    fn test_tutorial_screen_runs_game_after_timer() {
        let settings = Settings {
            show_tutorial: true,
            start_screen_time: 1.0,
            ..Default::default()
        };
        let mut state = GameState::new(settings, 7);
        tick(&mut state, &[space()]);
        assert_eq!(state.phase_name(), "Start");
        assert!(state.player_manager().is_some());

        idle_frames(&mut state, 0.25, 3);
        assert_eq!(state.phase_name(), "Start");
        idle_frames(&mut state, 0.25, 1);
        assert_eq!(state.phase_name(), "Running");
    }

    #[test]
    fn test_starting_area_starts_game() {
        let mut state = GameState::new(Settings::default(), 8);
        let settings = state.ctx.settings.clone();
        let inside = Vec2::new(settings.pixel_width / 2.0, settings.pixel_height - 20.0);
        tick(&mut state, &[InputRecord::new(InputSource::Mouse, Vec2::ZERO).with_frame_time(DT)]);
        tick(
            &mut state,
            &[InputRecord {
                add_player: true,
                ..InputRecord::frame(DT)
            }],
        );
        assert_eq!(state.player_manager().map(|p| p.len()), Some(1));

        let mut frames = 0;
        while state.phase_name() == "Idle" {
            tick(&mut state, &[InputRecord::new(InputSource::Mouse, inside).with_frame_time(0.1)]);
            frames += 1;
            assert!(frames < 100, "starting area never activated");
        }
        assert_eq!(state.phase_name(), "Running");
        assert_eq!(state.player_manager().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_empty_field_resets_then_returns_to_idle() {
        let mut state = GameState::new(Settings::default(), 99);
        tick(&mut state, &[space()]);
        assert_eq!(state.phase_name(), "Running");

        idle_frames(&mut state, 0.5, 5);
        assert_eq!(state.phase_name(), "Running");
        idle_frames(&mut state, 0.5, 1);
        assert_eq!(state.phase_name(), "Reset");

        let mut frames = 0;
        while state.phase_name() == "Reset" {
            idle_frames(&mut state, DT, 1);
            frames += 1;
            assert!(frames < 2000, "reset never finished");
        }
        assert_eq!(state.phase_name(), "Idle");
        assert_eq!(state.ctx.dead_turtles, 0);
    }

    #[test]
    fn test_herded_turtles_walk_home_after_players_leave() {
        let settings = Settings {
            total_turtles: 100,
            ..Default::default()
        };
        let mut state = GameState::new(settings, 4242);
        tick(
            &mut state,
            &[InputRecord {
                add_player: true,
                ..InputRecord::frame(DT)
            }],
        );
        tick(&mut state, &[space()]);
        assert_eq!(state.phase_name(), "Running");

        // Sweep the mouse through the spawn area to hatch and scatter the eggs
        let center = state.ctx.settings.screen_center();
        for frame in 0..900 {
            let t = frame as f32 * DT;
            let radius = 120.0 + 180.0 * (t * 0.5).sin().abs();
            let angle = t * TAU / 6.0;
            let mouse = center + Vec2::new(angle.cos(), angle.sin()) * radius;
            tick(&mut state, &[InputRecord::new(InputSource::Mouse, mouse).with_frame_time(DT)]);
        }
        assert_eq!(state.phase_name(), "Running");

        tick(
            &mut state,
            &[InputRecord {
                kill_players: true,
                ..InputRecord::frame(DT)
            }],
        );

        let mut saw_returning = false;
        let mut frames = 0;
        while state.phase_name() != "Idle" {
            tick(&mut state, &[InputRecord::frame(DT)]);
            if let Some(turtles) = state.turtle_manager() {
                saw_returning |= turtles
                    .turtles()
                    .iter()
                    .any(|t| t.kind() == TurtleStateKind::Returning);
            }
            frames += 1;
            assert!(frames < 5000, "reset never finished");
        }
        assert!(saw_returning);
        assert!(state.obstacle_manager().is_none());
    }

    #[test]
    fn test_still_tracked_player_times_out() {
        let mut state = GameState::new(Settings::default(), 21);
        let settings = state.ctx.settings.clone();
        state.player_manager_mut().unwrap().get_or_create(7, &settings);

        let standing = [InputRecord::tracked(7, Vec2::new(900.0, 200.0), 0.5)];
        for _ in 0..5 {
            tick(&mut state, &standing);
        }
        assert!(state.ctx.tracking_active);
        assert_eq!(state.player_manager().map(|p| p.len()), Some(1));

        tick(&mut state, &standing);
        assert_eq!(state.player_manager().map(|p| p.len()), Some(0));
    }

    #[test]
    fn test_collisions_reach_debug_counters() {
        let mut state = GameState::new(Settings::default(), 31);
        tick(
            &mut state,
            &[InputRecord {
                add_player: true,
                ..InputRecord::frame(DT)
            }],
        );
        assert_eq!(state.ctx.debug.collisions.player_contacts, 0);

        let target = state.turtle_manager().unwrap().turtles()[0].pos();
        let at_turtle = [InputRecord::new(InputSource::Mouse, target).with_frame_time(DT)];
        // The first frame moves the player, the next collision pass sees it
        tick(&mut state, &at_turtle);
        tick(&mut state, &at_turtle);
        assert!(state.ctx.debug.collisions.player_contacts >= 1);
    }

    #[test]
    fn test_player_resumes_during_reset() {
        let mut state = GameState::new(Settings::default(), 5);
        tick(&mut state, &[space()]);
        idle_frames(&mut state, 1.0, 4);
        assert_eq!(state.phase_name(), "Reset");

        tick(
            &mut state,
            &[InputRecord {
                add_player: true,
                ..InputRecord::frame(DT)
            }],
        );
        assert_eq!(state.phase_name(), "Running");
        assert_eq!(state.player_manager().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_accounted_pool_finishes_and_space_restarts() {
        let mut state = GameState::new(Settings::default(), 3);
        tick(&mut state, &[space()]);
        state.ctx.score = 9;
        state.ctx.dead_turtles = state.ctx.settings.total_turtles - 9;
        tick(&mut state, &[InputRecord::frame(DT)]);
        match &state.phase {
            GamePhase::Finished(finished) => assert!(finished.won),
            other => panic!("expected finished, got {}", other.name()),
        }
        assert!(state.player_manager().is_none());

        tick(&mut state, &[space()]);
        assert_eq!(state.phase_name(), "Idle");
        assert_eq!((state.ctx.score, state.ctx.dead_turtles), (0, 0));
    }

    #[test]
    fn test_end_screen_times_out() {
        let mut state = GameState::new(Settings::default(), 3);
        tick(&mut state, &[space()]);
        state.ctx.dead_turtles = state.ctx.settings.total_turtles;
        tick(&mut state, &[InputRecord::frame(DT)]);
        match &state.phase {
            GamePhase::Finished(finished) => assert!(!finished.won),
            other => panic!("expected finished, got {}", other.name()),
        }
        idle_frames(&mut state, 1.0, 7);
        assert_eq!(state.phase_name(), "Finished");
        idle_frames(&mut state, 1.0, 1);
        assert_eq!(state.phase_name(), "Idle");
    }

    #[test]
    fn test_unexpected_transition_is_ignored() {
        let mut state = GameState::new(Settings::default(), 1);
        apply(&mut state, Transition::Finish);
        assert_eq!(state.phase_name(), "Idle");
    }

    #[test]
    fn test_toggle_debug() {
        let mut state = GameState::new(Settings::default(), 1);
        let toggle = InputRecord {
            toggle_debug: true,
            ..InputRecord::frame(DT)
        };
        tick(&mut state, &[toggle]);
        assert!(state.debug_mode);
        tick(&mut state, &[toggle]);
        assert!(!state.debug_mode);
    }

    #[test]
    fn test_determinism() {
        // Two games with the same seed and input end up identical
        let mut state1 = GameState::new(Settings::default(), 99999);
        let mut state2 = GameState::new(Settings::default(), 99999);

        let mut script = vec![vec![space()]];
        for i in 0..600 {
            let x = 200.0 + (i as f32 * 3.0) % 1500.0;
            let y = 300.0 + (i as f32 * 0.05).sin() * 200.0;
            script.push(vec![
                InputRecord::new(InputSource::Mouse, Vec2::new(x, y)).with_frame_time(DT),
            ]);
            if i == 0 {
                script.push(vec![InputRecord {
                    add_player: true,
                    ..InputRecord::frame(DT)
                }]);
            }
        }

        for inputs in &script {
            tick(&mut state1, inputs);
            tick(&mut state2, inputs);
        }

        assert_eq!(state1.phase_name(), state2.phase_name());
        assert_eq!(state1.ctx.score, state2.ctx.score);
        assert_eq!(state1.ctx.dead_turtles, state2.ctx.dead_turtles);
        let positions = |state: &GameState| state.turtle_manager().map(|t| t.positions());
        assert_eq!(positions(&state1), positions(&state2));
    }
}
