//! The 8×8 occupancy grid
//!
//! Placement validity, commit, and line-clear detection. The list of cells a
//! successful `can_place` returns is exactly the set `place` fills, so hover
//! highlighting, validity and commit never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::shapes::Shape;
use super::stage::{StageCell, StageLayout};
use crate::consts::GRID_SIZE;

/// Palette index of a placed block
pub type ColorId = u8;

/// Per-stage wall layout; `true` marks a wall
pub type WallMask = [[bool; GRID_SIZE]; GRID_SIZE];

/// State of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Wall,
    Filled(ColorId),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// Absolute grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A validated placement: the absolute cells a shape would fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub cells: Vec<Coord>,
}

impl Placement {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }
}

/// Full rows and columns, ascending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullLines {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl FullLines {
    /// Total number of lines (rows + columns)
    pub fn count(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell {0} is out of bounds or not empty")]
    Occupied(Coord),
}

/// The playing grid
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

impl Board {
    /// An empty board without walls
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from raw cells (restoring a saved round)
    pub fn from_cells(cells: [[Cell; GRID_SIZE]; GRID_SIZE]) -> Self {
        Self { cells }
    }

    /// Clear every cell, then raise walls where `walls` is set
    pub fn reset(&mut self, walls: Option<&WallMask>) {
        self.cells = [[Cell::Empty; GRID_SIZE]; GRID_SIZE];
        if let Some(mask) = walls {
            for (r, row) in mask.iter().enumerate() {
                for (c, &wall) in row.iter().enumerate() {
                    if wall {
                        self.cells[r][c] = Cell::Wall;
                    }
                }
            }
        }
    }

    pub fn cells(&self) -> &[[Cell; GRID_SIZE]; GRID_SIZE] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Whether `shape` fits with its bounding box at (origin_row, origin_col)
    ///
    /// Origins are signed because a dragged block may hang off the board; any
    /// occupied cell that lands out of bounds or on a non-empty cell rejects
    /// the placement.
    pub fn can_place(&self, shape: &Shape, origin_row: i32, origin_col: i32) -> Option<Placement> {
        let mut cells = Vec::with_capacity(shape.area());
        for (dr, dc) in shape.cells() {
            let row = origin_row + dr as i32;
            let col = origin_col + dc as i32;
            if !(0..GRID_SIZE as i32).contains(&row) || !(0..GRID_SIZE as i32).contains(&col) {
                return None;
            }
            let (row, col) = (row as usize, col as usize);
            if !self.cells[row][col].is_empty() {
                return None;
            }
            cells.push(Coord::new(row, col));
        }
        Some(Placement { cells })
    }

    /// Fill every placement cell with `color`
    ///
    /// Nothing is written unless every cell is currently empty.
    pub fn place(&mut self, placement: &Placement, color: ColorId) -> Result<(), BoardError> {
        if let Some(bad) = placement
            .cells
            .iter()
            .find(|p| self.cell(p.row, p.col) != Some(Cell::Empty))
        {
            return Err(BoardError::Occupied(*bad));
        }
        for p in &placement.cells {
            self.cells[p.row][p.col] = Cell::Filled(color);
        }
        Ok(())
    }

    /// Rows and columns with no empty cell; walls count as occupied
    pub fn detect_full_lines(&self) -> FullLines {
        let rows = (0..GRID_SIZE)
            .filter(|&r| self.cells[r].iter().all(|cell| !cell.is_empty()))
            .collect();
        let cols = (0..GRID_SIZE)
            .filter(|&c| (0..GRID_SIZE).all(|r| !self.cells[r][c].is_empty()))
            .collect();
        FullLines { rows, cols }
    }

    /// Empty every cell of the listed lines, walls included
    ///
    /// Returns the number of distinct cells cleared.
    pub fn clear_lines(&mut self, lines: &FullLines) -> usize {
        let mut cleared = 0;
        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                if lines.rows.contains(&r) || lines.cols.contains(&c) {
                    if !self.cells[r][c].is_empty() {
                        cleared += 1;
                    }
                    self.cells[r][c] = Cell::Empty;
                }
            }
        }
        cleared
    }

    /// Stage target cells that are still empty
    pub fn remaining_targets(&self, layout: &StageLayout) -> usize {
        layout
            .iter()
            .zip(self.cells.iter())
            .map(|(stage_row, board_row)| {
                stage_row
                    .iter()
                    .zip(board_row.iter())
                    .filter(|(stage, cell)| **stage == StageCell::Target && cell.is_empty())
                    .count()
            })
            .sum()
    }

    /// Whether `shape` fits anywhere on the board
    pub fn has_any_placement(&self, shape: &Shape) -> bool {
        (0..GRID_SIZE as i32).any(|r| (0..GRID_SIZE as i32).any(|c| self.can_place(shape, r, c).is_some()))
    }

    /// Number of empty cells
    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::shapes::{SHAPES, shape_by_name};
    use proptest::prelude::*;

    fn full_board_except(hole: Coord) -> Board {
        let mut cells = [[Cell::Filled(0); GRID_SIZE]; GRID_SIZE];
        cells[hole.row][hole.col] = Cell::Empty;
        Board::from_cells(cells)
    }

    #[test]
    fn test_can_place_returns_absolute_cells() {
        let board = Board::new();
        let t = shape_by_name("t_down").unwrap();
        let placement = board.can_place(t, 2, 3).unwrap();
        assert_eq!(
            placement.cells,
            vec![Coord::new(2, 3), Coord::new(2, 4), Coord::new(2, 5), Coord::new(3, 4)]
        );
    }

    #[test]
    fn test_can_place_rejects_out_of_bounds() {
        let board = Board::new();
        let h4 = shape_by_name("h4").unwrap();
        assert!(board.can_place(h4, 0, 5).is_none());
        assert!(board.can_place(h4, -1, 0).is_none());
        assert!(board.can_place(h4, 7, 4).is_some());
    }

    #[test]
    fn test_can_place_ignores_holes_of_shape() {
        // l_bl's empty top-left cell may sit over a wall
        let l = shape_by_name("l_bl").unwrap();
        let mut walls = [[false; GRID_SIZE]; GRID_SIZE];
        walls[0][0] = true;
        let mut board = Board::new();
        board.reset(Some(&walls));
        assert!(board.can_place(l, 0, 0).is_some());
    }

    #[test]
    fn test_walls_block_placement() {
        let mut walls = [[false; GRID_SIZE]; GRID_SIZE];
        walls[4][4] = true;
        let mut board = Board::new();
        board.reset(Some(&walls));
        assert_eq!(board.cell(4, 4), Some(Cell::Wall));
        let square = shape_by_name("square").unwrap();
        assert!(board.can_place(square, 3, 3).is_none());
        assert!(board.can_place(square, 5, 5).is_some());
    }

    #[test]
    fn test_place_then_can_place_fails() {
        let mut board = Board::new();
        let square = shape_by_name("square").unwrap();
        let placement = board.can_place(square, 0, 0).unwrap();
        board.place(&placement, 2).unwrap();
        assert_eq!(board.cell(1, 1), Some(Cell::Filled(2)));
        assert!(board.can_place(square, 0, 0).is_none());
        assert_eq!(board.place(&placement, 3), Err(BoardError::Occupied(Coord::new(0, 0))));
        assert_eq!(board.cell(0, 0), Some(Cell::Filled(2)));
    }

    #[test]
    fn test_detect_full_lines_empty_board() {
        assert_eq!(Board::new().detect_full_lines(), FullLines::default());
    }

    #[test]
    fn test_detect_full_row_with_walls() {
        let mut walls = [[false; GRID_SIZE]; GRID_SIZE];
        walls[3][0] = true;
        walls[3][5] = true;
        let mut board = Board::new();
        board.reset(Some(&walls));
        let h3 = shape_by_name("h3").unwrap();
        let single = shape_by_name("single").unwrap();
        for (shape, col) in [(h3, 1), (single, 4), (single, 6), (single, 7)] {
            let p = board.can_place(shape, 3, col).unwrap();
            board.place(&p, 1).unwrap();
        }
        let lines = board.detect_full_lines();
        assert_eq!(lines.rows, vec![3]);
        assert!(lines.cols.is_empty());
    }

    #[test]
    fn test_clear_lines_removes_walls_too() {
        let mut cells = [[Cell::Empty; GRID_SIZE]; GRID_SIZE];
        cells[0] = [Cell::Filled(1); GRID_SIZE];
        cells[0][2] = Cell::Wall;
        cells[5][2] = Cell::Filled(4);
        let mut board = Board::from_cells(cells);
        let lines = FullLines { rows: vec![0], cols: vec![2] };
        assert_eq!(board.clear_lines(&lines), 9);
        assert_eq!(board.empty_count(), GRID_SIZE * GRID_SIZE);
    }

    #[test]
    fn test_remaining_targets_counts_empty_targets() {
        let mut layout = [[StageCell::Wall; GRID_SIZE]; GRID_SIZE];
        layout[2][2] = StageCell::Target;
        layout[2][3] = StageCell::Target;
        let mut board = Board::new();
        assert_eq!(board.remaining_targets(&layout), 2);
        let single = shape_by_name("single").unwrap();
        let p = board.can_place(single, 2, 3).unwrap();
        board.place(&p, 6).unwrap();
        assert_eq!(board.remaining_targets(&layout), 1);
    }

    #[test]
    fn test_isolated_hole_only_fits_single() {
        let board = full_board_except(Coord::new(4, 4));
        assert!(board.has_any_placement(shape_by_name("single").unwrap()));
        assert!(!board.has_any_placement(shape_by_name("h2").unwrap()));
        assert!(!board.has_any_placement(shape_by_name("v2").unwrap()));
    }

    proptest! {
        #[test]
        fn prop_can_place_matches_definition(
            shape_idx in 0..SHAPES.len(),
            origin_row in -4i32..10,
            origin_col in -4i32..10,
            filled in proptest::collection::vec((0..GRID_SIZE, 0..GRID_SIZE), 0..20),
        ) {
            let mut cells = [[Cell::Empty; GRID_SIZE]; GRID_SIZE];
            for (r, c) in filled {
                cells[r][c] = Cell::Filled(1);
            }
            let board = Board::from_cells(cells);
            let shape = &SHAPES[shape_idx];

            let expected: Vec<(i32, i32)> = shape
                .cells()
                .map(|(dr, dc)| (origin_row + dr as i32, origin_col + dc as i32))
                .collect();
            let fits = expected.iter().all(|&(r, c)| {
                (0..GRID_SIZE as i32).contains(&r)
                    && (0..GRID_SIZE as i32).contains(&c)
                    && board.cell(r as usize, c as usize) == Some(Cell::Empty)
            });

            match board.can_place(shape, origin_row, origin_col) {
                Some(placement) => {
                    prop_assert!(fits);
                    let got: Vec<(i32, i32)> = placement
                        .cells
                        .iter()
                        .map(|p| (p.row as i32, p.col as i32))
                        .collect();
                    prop_assert_eq!(got, expected);
                }
                None => prop_assert!(!fits),
            }
        }

        #[test]
        fn prop_no_double_placement(
            shape_idx in 0..SHAPES.len(),
            origin_row in 0i32..8,
            origin_col in 0i32..8,
        ) {
            let mut board = Board::new();
            let shape = &SHAPES[shape_idx];
            if let Some(placement) = board.can_place(shape, origin_row, origin_col) {
                board.place(&placement, 0).unwrap();
                prop_assert!(board.can_place(shape, origin_row, origin_col).is_none());
            }
        }
    }
}
