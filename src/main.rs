//! Marble Chain headless runner
//!
//! Seeds a demo board, fires at the chain on a fixed cadence and logs what
//! the simulation reports until the board is over.
//!
//! Usage: `marble-chain [settings.json] [snapshot-out.json]`

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use glam::Vec2;

    use marble_chain::persistence::GameSnapshot;
    use marble_chain::sim::{GameEvent, GameState, tick};
    use marble_chain::sim::{Color, Outcome};
    use marble_chain::{BoardProvider, Launcher, Settings, StaticBoard};

    /// Ticks between two shots
    const FIRE_INTERVAL: u64 = 45;
    /// Give up after this many ticks
    const MAX_TICKS: u64 = 60 * 60 * 10;

    fn demo_board() -> StaticBoard {
        // Serpentine running down the 800x600 field
        let paths = vec![vec![
            Vec2::new(40.0, 60.0),
            Vec2::new(760.0, 60.0),
            Vec2::new(760.0, 180.0),
            Vec2::new(40.0, 180.0),
            Vec2::new(40.0, 300.0),
            Vec2::new(760.0, 300.0),
            Vec2::new(760.0, 420.0),
            Vec2::new(400.0, 420.0),
        ]];
        StaticBoard {
            launcher: Vec2::new(400.0, 560.0),
            paths,
            palette: vec![Color::Red, Color::Green, Color::Blue, Color::Yellow],
            ball_budget: 40,
        }
    }

    /// Aim at a chained ball of the loaded color, or at the head if none match
    fn pick_target(state: &GameState, color: Color) -> Option<Vec2> {
        let mut fallback = None;
        for chain in &state.chains {
            for (_, chained) in chain.iter() {
                if chained.is_inserting() {
                    continue;
                }
                if chained.ball.color == color {
                    return Some(chained.ball.pos);
                }
                fallback.get_or_insert(chained.ball.pos);
            }
        }
        fallback
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Marble Chain (headless) starting...");

        let args: Vec<String> = std::env::args().collect();
        let settings = Settings::load(args.get(1).map_or("marble-chain.json", String::as_str))?;

        let board = demo_board().load()?;
        let mut state = board.seed_state(&settings);
        let mut launcher = Launcher::for_board(&board, settings.seed)?;

        let mut events: Vec<GameEvent> = Vec::new();
        let mut shots = 0u32;
        let mut matches = 0u32;

        while state.time_ticks < MAX_TICKS {
            if state.time_ticks % FIRE_INTERVAL == 0 {
                if let Some(target) = pick_target(&state, launcher.loaded()) {
                    if launcher.fire(&mut state, target, &mut events).is_some() {
                        shots += 1;
                    }
                }
            }

            let report = tick(&mut state, &mut events);

            for event in events.drain(..) {
                match event {
                    GameEvent::BallsMatched { chain, color, count } => {
                        matches += 1;
                        log::info!("Chain {chain}: removed {count} {color:?}");
                    }
                    GameEvent::EffectTriggered { chain, effect } => {
                        log::info!("Chain {chain}: effect {effect:?}");
                    }
                    other => log::debug!("{other:?}"),
                }
            }

            if let Some(outcome) = report.outcome {
                match outcome {
                    Outcome::Won => log::info!("Board cleared"),
                    Outcome::Lost => log::info!("A ball reached the end of its path"),
                }
                break;
            }
        }

        log::info!(
            "Finished after {} ticks: {shots} shots, {matches} matches, {} balls left",
            state.time_ticks,
            state.chained_ball_count()
        );

        if let Some(out) = args.get(2) {
            std::fs::write(out, GameSnapshot::capture(&state).to_json()?)?;
            log::info!("Snapshot written to {out}");
        }

        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    runner::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The crate is a library on the web; there is no headless runner
}
