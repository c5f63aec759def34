//! Block Blast - an 8×8 block-placement puzzle
//!
//! Core modules:
//! - `sim`: Deterministic puzzle engine (shapes, board, stages, rounds)
//! - `persistence`: Best-score and stage storage contracts and backends
//! - `editor`: Level editor draft model
//! - `renderer`: Pure view model of round state plus a text renderer
//! - `platform`: Browser/native platform abstraction
//! - `settings`: User configuration

pub mod editor;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use persistence::{LocalScoreStore, MemoryScoreStore, ScoreStore, StageStore};
pub use settings::Settings;
pub use sim::{
    Board, Cell, GameMode, RoundController, RoundError, RoundPhase, StageCatalog, StageDefinition,
};

/// Game configuration constants
pub mod consts {
    /// Board edge length (the grid is square)
    pub const GRID_SIZE: usize = 8;
    /// Blocks offered at once in endless mode
    pub const ENDLESS_DOCK_SIZE: usize = 3;
    /// Line clear bonus factor: clearing n lines at once scores 10·n²
    pub const LINE_CLEAR_POINTS: u64 = 10;

    /// Block colours, indexed by `ColorId`
    pub const PALETTE: [&str; 7] = [
        "#4ecca3", "#e94560", "#fcdab7", "#a2d5f2", "#ff7675", "#fd79a8", "#fab1a0",
    ];
}
