//! Round controller
//!
//! Owns everything one playthrough mutates: board, dock, score and phase.
//! Every operation runs to completion synchronously; animation timing is the
//! presentation layer's concern and never delays state changes here.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{Board, BoardError, ColorId, FullLines, Placement};
use super::shapes::{SHAPES, ShapeId};
use super::stage::{StageCatalog, StageDefinition};
use crate::consts::{ENDLESS_DOCK_SIZE, LINE_CLEAR_POINTS, PALETTE};
use crate::persistence::ScoreStore;

/// Which game is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Endless,
    /// 1-based stage number in the catalog
    Stage(u32),
}

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round running (menus)
    #[default]
    MenuIdle,
    Playing,
    /// Stage cleared; terminal until a new round starts
    Won,
    /// No legal move left; terminal until a new round starts
    Lost,
}

/// A pending block in the dock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockBlock {
    pub shape: ShapeId,
    pub color: ColorId,
    pub slot: usize,
}

/// Why a round was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// No pending block fits anywhere
    NoMoves,
    /// Stage blocks ran out with targets left
    OutOfBlocks,
}

/// Things that happened during one placement, for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEvent {
    LinesCleared { lines: FullLines, bonus: u64 },
    DockRefilled,
    NewBestScore(u64),
    StageCleared { stage: u32, final_stage: bool },
    GameOver(LossReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("dock slot {0} is empty or out of range")]
    InvalidSlot(usize),
    #[error("'{shape}' does not fit at ({row}, {col})")]
    InvalidPlacement { shape: ShapeId, row: i32, col: i32 },
    #[error("no round in progress")]
    NotPlaying,
    #[error("stage {0} is not in the catalog")]
    UnknownStage(u32),
    #[error("the current round is not a stage")]
    NotStageMode,
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub placement: Placement,
    /// Points gained by this placement (cells + line bonus)
    pub points: u64,
    pub lines: FullLines,
    pub events: Vec<RoundEvent>,
    pub phase: RoundPhase,
    pub score: u64,
    pub best_score: u64,
}

/// All mutable state of one round (serializable for Continue)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundState {
    pub mode: GameMode,
    pub phase: RoundPhase,
    pub board: Board,
    /// Dock slots; `None` once a block was placed
    pub dock: Vec<Option<DockBlock>>,
    pub score: u64,
    /// Stage being played (stage mode only)
    pub stage: Option<StageDefinition>,
    #[serde(default)]
    pub lines_cleared: u32,
    #[serde(default)]
    pub placements: u32,
}

impl RoundState {
    /// Blocks still waiting in the dock
    pub fn pending(&self) -> impl Iterator<Item = &DockBlock> {
        self.dock.iter().flatten()
    }

    pub fn dock_is_empty(&self) -> bool {
        self.dock.iter().all(Option::is_none)
    }

    /// Empty target cells (stage mode only)
    pub fn remaining_targets(&self) -> Option<usize> {
        self.stage
            .as_ref()
            .map(|stage| self.board.remaining_targets(&stage.layout))
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct RoundSnapshot<'a> {
    pub mode: GameMode,
    pub phase: RoundPhase,
    pub title: Option<&'a str>,
    pub score: u64,
    pub best_score: u64,
    pub remaining_targets: Option<usize>,
    pub board: &'a Board,
    pub dock: &'a [Option<DockBlock>],
}

/// Drives one round at a time
#[derive(Debug)]
pub struct RoundController<S: ScoreStore> {
    state: RoundState,
    catalog: StageCatalog,
    rng: Pcg32,
    best_score: u64,
    scores: S,
}

impl<S: ScoreStore> RoundController<S> {
    /// Controller in `MenuIdle`; the best score comes from `scores`
    pub fn new(catalog: StageCatalog, scores: S, seed: u64) -> Self {
        let best_score = scores.best_score().unwrap_or(0);
        Self {
            state: RoundState::default(),
            catalog,
            rng: Pcg32::seed_from_u64(seed),
            best_score,
            scores,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn dock(&self) -> &[Option<DockBlock>] {
        &self.state.dock
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn score_store(&self) -> &S {
        &self.scores
    }

    pub fn snapshot(&self) -> RoundSnapshot<'_> {
        RoundSnapshot {
            mode: self.state.mode,
            phase: self.state.phase,
            title: self.state.stage.as_ref().map(|s| s.title.as_str()),
            score: self.state.score,
            best_score: self.best_score,
            remaining_targets: self.state.remaining_targets(),
            board: &self.state.board,
            dock: &self.state.dock,
        }
    }

    /// Start a fresh round in `mode`
    pub fn start_round(&mut self, mode: GameMode) -> Result<(), RoundError> {
        let stage = match mode {
            GameMode::Endless => None,
            GameMode::Stage(number) => Some(
                self.catalog
                    .get(number)
                    .cloned()
                    .ok_or(RoundError::UnknownStage(number))?,
            ),
        };

        let mut board = Board::new();
        board.reset(stage.as_ref().map(StageDefinition::wall_mask).as_ref());

        let dock = match &stage {
            None => (0..ENDLESS_DOCK_SIZE)
                .map(|slot| Some(self.random_block(slot)))
                .collect(),
            Some(stage) => stage
                .blocks
                .iter()
                .enumerate()
                .map(|(slot, &shape)| {
                    Some(DockBlock {
                        shape,
                        color: self.random_color(),
                        slot,
                    })
                })
                .collect(),
        };

        match &stage {
            Some(stage) => log::info!("Started stage {:?} '{}'", mode, stage.title),
            None => log::info!("Started endless round"),
        }

        self.state = RoundState {
            mode,
            phase: RoundPhase::Playing,
            board,
            dock,
            score: 0,
            stage,
            lines_cleared: 0,
            placements: 0,
        };
        // A stage may be dealt a dock that cannot move at all
        self.check_deadlock();
        Ok(())
    }

    /// Start the current mode over
    pub fn restart(&mut self) -> Result<(), RoundError> {
        self.start_round(self.state.mode)
    }

    /// Leave the round; state is kept for display until the next start
    pub fn return_to_menu(&mut self) {
        self.state.phase = RoundPhase::MenuIdle;
    }

    /// Start the stage after the current one
    ///
    /// Returns the new stage number, or `None` when the last stage was
    /// already the current one (everything cleared; back to the menu).
    pub fn advance_stage(&mut self) -> Result<Option<u32>, RoundError> {
        let GameMode::Stage(current) = self.state.mode else {
            return Err(RoundError::NotStageMode);
        };
        match self.catalog.next_after(current) {
            Some(next) => {
                self.start_round(GameMode::Stage(next))?;
                Ok(Some(next))
            }
            None => {
                log::info!("All stages cleared");
                self.return_to_menu();
                Ok(None)
            }
        }
    }

    /// Continue a previously saved round
    pub fn resume(&mut self, state: RoundState) {
        log::info!(
            "Resumed {:?} round at score {} ({:?})",
            state.mode,
            state.score,
            state.phase
        );
        self.state = state;
    }

    /// Cells a dock block would fill at (row, col), for hover highlighting
    pub fn preview(&self, slot: usize, row: i32, col: i32) -> Option<Placement> {
        if self.state.phase != RoundPhase::Playing {
            return None;
        }
        let block = self.state.dock.get(slot).copied().flatten()?;
        self.state.board.can_place(block.shape.shape(), row, col)
    }

    /// Drop the block in `slot` with its bounding box at (row, col)
    ///
    /// On error nothing changes.
    pub fn attempt_placement(
        &mut self,
        slot: usize,
        row: i32,
        col: i32,
    ) -> Result<PlacementOutcome, RoundError> {
        if self.state.phase != RoundPhase::Playing {
            return Err(RoundError::NotPlaying);
        }
        let block = self
            .state
            .dock
            .get(slot)
            .copied()
            .flatten()
            .ok_or(RoundError::InvalidSlot(slot))?;
        let placement = self
            .state
            .board
            .can_place(block.shape.shape(), row, col)
            .ok_or(RoundError::InvalidPlacement {
                shape: block.shape,
                row,
                col,
            })?;

        self.state.board.place(&placement, block.color)?;
        self.state.dock[slot] = None;
        self.state.placements += 1;

        let mut points = placement.len() as u64;
        let mut events = Vec::new();
        let mut lines = FullLines::default();

        match self.state.mode {
            GameMode::Endless => {
                lines = self.state.board.detect_full_lines();
                if !lines.is_empty() {
                    let n = lines.count() as u64;
                    let bonus = LINE_CLEAR_POINTS * n * n;
                    points += bonus;
                    self.state.board.clear_lines(&lines);
                    self.state.lines_cleared += n as u32;
                    log::debug!(
                        "Cleared rows {:?} cols {:?} for {} bonus",
                        lines.rows,
                        lines.cols,
                        bonus
                    );
                    events.push(RoundEvent::LinesCleared {
                        lines: lines.clone(),
                        bonus,
                    });
                }
                if self.state.dock_is_empty() {
                    self.state.dock = (0..ENDLESS_DOCK_SIZE)
                        .map(|slot| Some(self.random_block(slot)))
                        .collect();
                    events.push(RoundEvent::DockRefilled);
                }
            }
            GameMode::Stage(number) => {
                if self.state.remaining_targets() == Some(0) {
                    let final_stage = self.catalog.next_after(number).is_none();
                    self.state.phase = RoundPhase::Won;
                    log::info!("Stage {} cleared", number);
                    events.push(RoundEvent::StageCleared {
                        stage: number,
                        final_stage,
                    });
                }
            }
        }

        self.state.score += points;
        log::debug!(
            "Placed {} at ({}, {}) for {} points (score {})",
            block.shape,
            row,
            col,
            points,
            self.state.score
        );

        if self.state.mode == GameMode::Endless && self.state.score > self.best_score {
            self.best_score = self.state.score;
            self.scores.set_best_score(self.best_score);
            events.push(RoundEvent::NewBestScore(self.best_score));
        }

        if let Some(reason) = self.check_deadlock() {
            events.push(RoundEvent::GameOver(reason));
        }

        Ok(PlacementOutcome {
            placement,
            points,
            lines,
            events,
            phase: self.state.phase,
            score: self.state.score,
            best_score: self.best_score,
        })
    }

    /// Whether any pending block fits anywhere
    pub fn has_legal_move(&self) -> bool {
        self.state
            .pending()
            .any(|block| self.state.board.has_any_placement(block.shape.shape()))
    }

    /// Move a playing round to `Lost` if it cannot continue
    pub fn check_deadlock(&mut self) -> Option<LossReason> {
        if self.state.phase != RoundPhase::Playing {
            return None;
        }
        let reason = if self.state.dock_is_empty() {
            match self.state.remaining_targets() {
                Some(left) if left > 0 => Some(LossReason::OutOfBlocks),
                _ => None,
            }
        } else if !self.has_legal_move() {
            Some(LossReason::NoMoves)
        } else {
            None
        };

        if let Some(reason) = reason {
            self.state.phase = RoundPhase::Lost;
            log::info!(
                "Round lost ({:?}) with score {}",
                reason,
                self.state.score
            );
        }
        reason
    }

    fn random_color(&mut self) -> ColorId {
        self.rng.random_range(0..PALETTE.len()) as ColorId
    }

    fn random_block(&mut self, slot: usize) -> DockBlock {
        let shape = ShapeId::from_index(self.rng.random_range(0..SHAPES.len()));
        DockBlock {
            shape,
            color: self.random_color(),
            slot,
        }
    }
}
