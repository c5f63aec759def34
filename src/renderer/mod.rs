//! Presentation view model
//!
//! Pure functions turning round state into what a frontend draws. The
//! browser frontend paints `CellView`s onto its grid; the native demo uses
//! the text renderer.

pub mod text;

use serde::Serialize;

use crate::consts::{GRID_SIZE, PALETTE};
use crate::sim::board::{Board, Cell, ColorId, Placement};
use crate::sim::stage::{StageCell, StageLayout};

/// What to draw in one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellView {
    Empty,
    /// Empty stage cell that still needs covering
    Target,
    Wall,
    Filled(ColorId),
    /// Hover highlight of a pending placement
    Preview(ColorId),
}

pub type BoardView = [[CellView; GRID_SIZE]; GRID_SIZE];

/// Build the view of a board
///
/// `layout` marks empty target cells in stage mode; `preview` overlays a
/// placement the player is hovering.
pub fn board_view(
    board: &Board,
    layout: Option<&StageLayout>,
    preview: Option<(&Placement, ColorId)>,
) -> BoardView {
    let mut view = [[CellView::Empty; GRID_SIZE]; GRID_SIZE];
    for (r, row) in board.cells().iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            view[r][c] = match cell {
                Cell::Wall => CellView::Wall,
                Cell::Filled(color) => CellView::Filled(*color),
                Cell::Empty => match layout {
                    Some(layout) if layout[r][c] == StageCell::Target => CellView::Target,
                    _ => CellView::Empty,
                },
            };
        }
    }
    if let Some((placement, color)) = preview {
        for coord in &placement.cells {
            if let Some(cell) = view.get_mut(coord.row).and_then(|row| row.get_mut(coord.col)) {
                *cell = CellView::Preview(color);
            }
        }
    }
    view
}

/// CSS colour of a palette entry (wraps around)
pub fn color_hex(color: ColorId) -> &'static str {
    PALETTE[color as usize % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::board::Coord;
    use crate::sim::shapes::shape_by_name;
    use crate::sim::stage::StageDefinition;

    #[test]
    fn test_endless_view() {
        let mut board = Board::new();
        let square = shape_by_name("square").unwrap();
        let placement = board.can_place(square, 0, 0).unwrap();
        board.place(&placement, 2).unwrap();

        let view = board_view(&board, None, None);
        assert_eq!(view[1][1], CellView::Filled(2));
        assert_eq!(view[2][2], CellView::Empty);
    }

    #[test]
    fn test_stage_view_with_preview() {
        let stage = StageDefinition::from_rows(
            "View",
            &[
                "########",
                "##..####",
                "########",
                "########",
                "########",
                "########",
                "########",
                "########",
            ],
            &["single", "single"],
        )
        .unwrap();
        let mut board = Board::new();
        board.reset(Some(&stage.wall_mask()));
        let single = shape_by_name("single").unwrap();
        let preview = board.can_place(single, 1, 3).unwrap();

        let view = board_view(&board, Some(&stage.layout), Some((&preview, 5)));
        assert_eq!(view[0][0], CellView::Wall);
        assert_eq!(view[1][2], CellView::Target);
        assert_eq!(view[1][3], CellView::Preview(5));
    }

    #[test]
    fn test_preview_outside_grid_is_skipped() {
        let board = Board::new();
        let placement = Placement {
            cells: vec![Coord::new(7, 7), Coord::new(8, 7), Coord::new(2, 40)],
        };
        let view = board_view(&board, None, Some((&placement, 3)));
        assert_eq!(view[7][7], CellView::Preview(3));
        let previews = view
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, CellView::Preview(_)))
            .count();
        assert_eq!(previews, 1);
    }

    #[test]
    fn test_color_hex_wraps() {
        assert_eq!(color_hex(0), "#4ecca3");
        assert_eq!(color_hex(PALETTE.len() as ColorId), "#4ecca3");
    }
}
