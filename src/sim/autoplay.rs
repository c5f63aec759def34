//! Demo player
//!
//! Drives rounds without input: a greedy chooser for endless mode and an
//! exhaustive solver for stages.

use serde::{Deserialize, Serialize};

use super::board::{Board, Cell};
use super::round::{DockBlock, RoundState};
use super::stage::{StageCell, StageLayout};
use crate::consts::{GRID_SIZE, LINE_CLEAR_POINTS};

/// One placement: dock slot plus bounding-box origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub slot: usize,
    pub row: i32,
    pub col: i32,
}

/// Greedy endless move: the placement worth the most points right now
///
/// Ties keep the earliest slot, then the earliest origin in row-major order.
pub fn best_move(state: &RoundState) -> Option<Move> {
    let mut best: Option<(Move, u64)> = None;
    for block in state.pending() {
        let shape = block.shape.shape();
        for row in 0..GRID_SIZE as i32 {
            for col in 0..GRID_SIZE as i32 {
                let Some(placement) = state.board.can_place(shape, row, col) else {
                    continue;
                };
                let mut board = state.board.clone();
                if board.place(&placement, block.color).is_err() {
                    continue;
                }
                let n = board.detect_full_lines().count() as u64;
                let points = placement.len() as u64 + LINE_CLEAR_POINTS * n * n;
                match &best {
                    Some((_, best_points)) if points <= *best_points => {}
                    _ => {
                        best = Some((
                            Move {
                                slot: block.slot,
                                row,
                                col,
                            },
                            points,
                        ));
                    }
                }
            }
        }
    }
    best.map(|(mv, _)| mv)
}

/// Moves covering every stage target, or `None` if the dock cannot do it
///
/// Always fills the first uncovered target (row-major) with some remaining
/// block's first cell, so every tiling is reachable exactly once.
pub fn solve_stage(state: &RoundState) -> Option<Vec<Move>> {
    let stage = state.stage.as_ref()?;
    let mut moves = Vec::new();
    if search(&state.board, &stage.layout, &state.dock, &mut moves) {
        Some(moves)
    } else {
        None
    }
}

fn first_open_target(board: &Board, layout: &StageLayout) -> Option<(usize, usize)> {
    (0..GRID_SIZE)
        .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
        .find(|&(r, c)| layout[r][c] == StageCell::Target && board.cell(r, c) == Some(Cell::Empty))
}

fn search(
    board: &Board,
    layout: &StageLayout,
    dock: &[Option<DockBlock>],
    moves: &mut Vec<Move>,
) -> bool {
    let Some((row, col)) = first_open_target(board, layout) else {
        return true;
    };

    let mut tried = Vec::new();
    for (slot, entry) in dock.iter().enumerate() {
        let Some(block) = entry else { continue };
        // Identical shapes lead to identical subtrees
        if tried.contains(&block.shape) {
            continue;
        }
        tried.push(block.shape);

        let shape = block.shape.shape();
        let (fr, fc) = shape.first_cell();
        let origin_row = row as i32 - fr as i32;
        let origin_col = col as i32 - fc as i32;
        let Some(placement) = board.can_place(shape, origin_row, origin_col) else {
            continue;
        };
        let mut next_board = board.clone();
        if next_board.place(&placement, block.color).is_err() {
            continue;
        }
        let mut next_dock = dock.to_vec();
        next_dock[slot] = None;
        moves.push(Move {
            slot,
            row: origin_row,
            col: origin_col,
        });
        if search(&next_board, layout, &next_dock, moves) {
            return true;
        }
        moves.pop();
    }
    false
}
