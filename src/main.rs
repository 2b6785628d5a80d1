//! Sky Jumper entry point
//!
//! The browser build only sets up logging; the page's own script drives the
//! simulation through the exported `WebGame` bindings. Natively this runs a
//! headless autopilot session, which is handy for eyeballing generation and
//! balance from the logs.

#[cfg(target_arch = "wasm32")]
fn main() {
    sky_jumper::web::init_logging();
    log::info!("Sky Jumper loaded, waiting for the page to start a game");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use sky_jumper::consts::*;
    use sky_jumper::sim::{GameEvent, GameState, SessionPhase, TickInput, Viewport};
    use sky_jumper::{Difficulty, GameHost, HighScore, Settings};

    /// Command line options
    struct Options {
        seed: u64,
        ticks: u64,
        difficulty: Option<Difficulty>,
    }

    impl Default for Options {
        fn default() -> Self {
            Self {
                seed: 0x5eed,
                ticks: 60 * 60,
                difficulty: None,
            }
        }
    }

    fn parse_args() -> Options {
        let mut options = Options::default();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let value = args.next();
            match (arg.as_str(), value) {
                ("--seed", Some(v)) => match v.parse() {
                    Ok(seed) => options.seed = seed,
                    Err(_) => log::warn!("Ignoring bad seed {v:?}"),
                },
                ("--ticks", Some(v)) => match v.parse() {
                    Ok(ticks) => options.ticks = ticks,
                    Err(_) => log::warn!("Ignoring bad tick count {v:?}"),
                },
                ("--difficulty", Some(v)) => {
                    options.difficulty = Difficulty::from_str(&v);
                    if options.difficulty.is_none() {
                        log::warn!("Unknown difficulty {v:?}, using settings");
                    }
                }
                (other, _) => log::warn!("Ignoring argument {other:?}"),
            }
        }
        options
    }

    /// Simple bot: hop whenever grounded and steer toward the next platform up
    fn autopilot(state: &GameState) -> TickInput {
        let mut input = TickInput::default();
        if state.phase == SessionPhase::Resetting {
            return input;
        }

        let player = &state.player;
        let feet = player.bottom();
        let next = state
            .platforms
            .iter()
            .filter(|p| !p.is_floor() && p.pos.y < feet - 1.0)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

        if let Some(platform) = next {
            let dx = platform.top_center().x - player.center().x;
            if dx.abs() > MOVEMENT_SPEED {
                input.left = dx < 0.0;
                input.right = dx > 0.0;
            }
        }

        input.up = !player.jumping && !state.up_held;
        input.super_jump = state.coins >= SUPER_JUMP_COST * 3;
        input
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Sky Jumper (native, headless) starting...");

        let options = parse_args();
        let mut settings = Settings::load();
        if let Some(difficulty) = options.difficulty {
            settings.difficulty = difficulty;
        }
        let mut host =
            GameHost::with_storage(options.seed, Viewport::default(), settings, HighScore::load());

        let mut sessions = 1u32;
        let mut best_this_run = 0u64;
        for _ in 0..options.ticks {
            let input = autopilot(&host.state);
            host.step(&input);

            let state = &host.state;
            for event in host.events() {
                match *event {
                    GameEvent::SessionEnded { cause, score } => {
                        best_this_run = best_this_run.max(score);
                        log::info!(
                            "Session {sessions} over ({cause:?}): score {score}, height {:.0}",
                            state.viewport.floor_top() - state.player.bottom()
                        );
                    }
                    GameEvent::SessionRestarted => sessions += 1,
                    GameEvent::TreasureCollected { kind, coins, combo } => {
                        log::debug!("Picked up {kind:?} for {coins} coins (combo {combo})");
                    }
                    GameEvent::BedReached { id } => log::debug!("Resting on bed {id}"),
                    _ => {}
                }
            }
        }

        let frame = host.state.snapshot();
        best_this_run = best_this_run.max(frame.score);
        log::info!(
            "Ran {} ticks over {} session(s): best {} (all time {}), live platforms {}, coins {}",
            options.ticks,
            sessions,
            best_this_run,
            host.high_score().best,
            frame.platforms.len(),
            frame.coins
        );
    }
}
