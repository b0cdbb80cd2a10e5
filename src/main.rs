//! Turtle Game headless driver
//!
//! Runs a scripted session against the simulation and prints the final frame
//! as JSON. Usage: `turtle-game [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::f32::consts::TAU;
    use std::path::PathBuf;

    use glam::Vec2;
    use turtle_game::Settings;
    use turtle_game::consts::DEBUG_KEY_STEP;
    use turtle_game::sim::{GameState, InputRecord, InputSource, tick};
    use turtle_game::view::FrameView;

    const FRAME_TIME: f32 = 1.0 / 60.0;
    const SESSION_FRAMES: u32 = 60 * 120;
    const DEFAULT_SEED: u64 = 0x7475_7274;
    /// Debug players beyond mouse, arrows and WASD have no input source
    const DEBUG_SLOTS: u32 = 3;

    /// Input of one scripted frame
    fn scripted_inputs(frame: u32, settings: &Settings) -> Vec<InputRecord> {
        let t = frame as f32 * FRAME_TIME;
        let center = settings.screen_center();

        // Mouse circles the spawn area with a breathing radius, herding turtles out
        let radius = 300.0 + 150.0 * (t * 0.3).sin();
        let angle = t * TAU / 8.0;
        let mouse = center + Vec2::new(angle.cos(), angle.sin()) * radius;

        let arrows = Vec2::new((t * 0.7).cos(), (t * 1.1).sin()) * DEBUG_KEY_STEP;
        let wasd = Vec2::new((t * 0.4).sin(), (t * 0.9).cos()) * DEBUG_KEY_STEP;

        vec![
            InputRecord::new(InputSource::Mouse, mouse).with_frame_time(FRAME_TIME),
            InputRecord::new(InputSource::ArrowKeys, arrows).with_frame_time(FRAME_TIME),
            InputRecord::new(InputSource::WasdKeys, wasd).with_frame_time(FRAME_TIME),
        ]
    }

    pub fn run() {
        env_logger::init();

        let mut args = std::env::args().skip(1);
        let settings_path = args.next().map(PathBuf::from);
        let seed = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SEED);
        let settings = Settings::load_or_default(settings_path.as_deref());

        log::info!("Turtle Game (headless) starting...");
        let mut state = GameState::new(settings, seed);

        let players = state.ctx.settings.number_of_players.min(DEBUG_SLOTS);
        for _ in 0..players {
            tick(
                &mut state,
                &[InputRecord {
                    add_player: true,
                    ..InputRecord::frame(FRAME_TIME)
                }],
            );
        }
        tick(
            &mut state,
            &[InputRecord {
                space: true,
                ..InputRecord::frame(FRAME_TIME)
            }],
        );

        for frame in 0..SESSION_FRAMES {
            let inputs = scripted_inputs(frame, &state.ctx.settings);
            tick(&mut state, &inputs);

            if let Some(turtles) = state.turtle_manager_mut() {
                for animation in turtles.take_death_animations() {
                    log::debug!("Death animation at {}", animation.pos);
                }
            }
            if frame % 600 == 0 {
                log::info!(
                    "Frame {frame}: {} phase, {} rescued, {} lost",
                    state.phase_name(),
                    state.ctx.score,
                    state.ctx.dead_turtles
                );
            }
        }

        match FrameView::capture(&state).to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Failed to serialize final frame: {err}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser builds drive the simulation from the host page
}
