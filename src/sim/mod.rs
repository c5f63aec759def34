//! Deterministic puzzle engine
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Seeded RNG only
//! - Synchronous operations, no timers
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod board;
pub mod round;
pub mod shapes;
pub mod stage;

pub use autoplay::{Move, best_move, solve_stage};
pub use board::{Board, BoardError, Cell, ColorId, Coord, FullLines, Placement, WallMask};
pub use round::{
    DockBlock, GameMode, LossReason, PlacementOutcome, RoundController, RoundError, RoundEvent,
    RoundPhase, RoundSnapshot, RoundState,
};
pub use shapes::{SHAPES, Shape, ShapeError, ShapeId, shape_by_name, shapes_of};
pub use stage::{
    StageCatalog, StageCell, StageDefinition, StageError, StageLayout, StageRecord,
    StageParseError,
};
