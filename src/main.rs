//! Block Blast entry point
//!
//! The browser build is driven from JS through the library's `WasmRound`.
//! Natively this runs a headless demo: a greedy endless round followed by
//! the solved stage catalog, logged as text.

#[cfg(not(target_arch = "wasm32"))]
use block_blast::renderer::{board_view, text};
#[cfg(not(target_arch = "wasm32"))]
use block_blast::sim::{GameMode, RoundController, RoundPhase, StageCatalog, best_move, solve_stage};
#[cfg(not(target_arch = "wasm32"))]
use block_blast::persistence::FileStageStore;
#[cfg(not(target_arch = "wasm32"))]
use block_blast::{LocalScoreStore, ScoreStore, Settings, StageStore};

/// Placement cap for the endless demo
#[cfg(not(target_arch = "wasm32"))]
const MAX_DEMO_MOVES: u32 = 500;

#[cfg(not(target_arch = "wasm32"))]
fn load_catalog(settings: &Settings) -> Result<StageCatalog, Box<dyn std::error::Error>> {
    let store = FileStageStore::new(&settings.stage_file);
    if store.path().exists() {
        let stages = store.load_all()?;
        if !stages.is_empty() {
            return Ok(StageCatalog::from_map(stages));
        }
    }
    log::info!("Using built-in stages");
    Ok(StageCatalog::builtin()?)
}

#[cfg(not(target_arch = "wasm32"))]
fn log_board<S: ScoreStore>(round: &RoundController<S>) {
    let state = round.state();
    let layout = state.stage.as_ref().map(|s| &s.layout);
    let view = board_view(&state.board, layout, None);
    log::info!("\n{}\n{}", text::render_board(&view), text::render_dock(&state.dock));
    if state.pending().next().is_some() {
        log::info!("Left in dock:\n{}", text::render_dock_shapes(&state.dock));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load();
    let catalog = load_catalog(&settings)?;
    let seed = settings.seed.unwrap_or_else(rand::random);
    log::info!("Seed {}", seed);

    let mut round = RoundController::new(catalog, LocalScoreStore::load(), seed);

    round.start_round(GameMode::Endless)?;
    let mut moves = 0;
    while round.phase() == RoundPhase::Playing && moves < MAX_DEMO_MOVES {
        let Some(mv) = best_move(round.state()) else {
            break;
        };
        round.attempt_placement(mv.slot, mv.row, mv.col)?;
        moves += 1;
    }
    log_board(&round);
    log::info!(
        "Endless: {} placements, {} lines, score {} (best {})",
        moves,
        round.state().lines_cleared,
        round.score(),
        round.best_score()
    );

    let stages: Vec<u32> = round.catalog().iter().map(|(number, _)| number).collect();
    for number in stages {
        round.start_round(GameMode::Stage(number))?;
        let Some(solution) = solve_stage(round.state()) else {
            log::warn!("Stage {} has no solution", number);
            continue;
        };
        for mv in solution {
            round.attempt_placement(mv.slot, mv.row, mv.col)?;
        }
        log_board(&round);
        log::info!("Stage {}: {:?}", number, round.phase());
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Block Blast (native) starting...");

    if let Err(err) = run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's `start`, this is just to satisfy the compiler
}
