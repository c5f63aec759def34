//! Best-score and stage persistence
//!
//! The round controller only talks to these traits. Best-score writes are
//! fire-and-forget: a failed write is logged and otherwise ignored.

pub mod stage_store;

pub use stage_store::{
    FileStageStore, MemoryStageStore, StageStore, StageStoreError, export_stages_js,
};

use crate::platform::storage;

/// Best-score persistence contract
pub trait ScoreStore {
    /// Stored best score, `None` when nothing was ever saved
    fn best_score(&self) -> Option<u64>;

    /// Record a new best score
    fn set_best_score(&mut self, score: u64);
}

/// In-process store; counts writes so callers can observe persistence
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: Option<u64>,
    writes: u32,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a best score
    pub fn with_best(best: u64) -> Self {
        Self {
            best: Some(best),
            writes: 0,
        }
    }

    /// Number of `set_best_score` calls so far
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ScoreStore for MemoryScoreStore {
    fn best_score(&self) -> Option<u64> {
        self.best
    }

    fn set_best_score(&mut self, score: u64) {
        self.best = Some(score);
        self.writes += 1;
    }
}

/// Browser LocalStorage store
///
/// Native builds have no LocalStorage, so the value only lives for the
/// session.
#[derive(Debug, Clone, Default)]
pub struct LocalScoreStore {
    cached: Option<u64>,
}

impl LocalScoreStore {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "blockBlastBestScore";

    /// Load the stored best score
    pub fn load() -> Self {
        let cached = storage::get_item(Self::STORAGE_KEY).and_then(|raw| raw.trim().parse().ok());
        match cached {
            Some(best) => log::info!("Loaded best score {}", best),
            None => log::info!("No best score found, starting fresh"),
        }
        Self { cached }
    }
}

impl ScoreStore for LocalScoreStore {
    fn best_score(&self) -> Option<u64> {
        self.cached
    }

    fn set_best_score(&mut self, score: u64) {
        self.cached = Some(score);
        if storage::set_item(Self::STORAGE_KEY, &score.to_string()) {
            log::info!("Best score saved ({})", score);
        } else {
            log::debug!("Best score {} kept in memory only", score);
        }
    }
}
