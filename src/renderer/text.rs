//! Plain-text rendering for the native demo and logs
//!
//! `.` empty, `o` target, `#` wall, a palette digit for filled cells and
//! `*` for a preview.

use super::{BoardView, CellView, color_hex};
use crate::sim::round::DockBlock;
use crate::sim::shapes::Shape;

fn cell_char(cell: CellView) -> char {
    match cell {
        CellView::Empty => '.',
        CellView::Target => 'o',
        CellView::Wall => '#',
        CellView::Filled(color) => char::from_digit(u32::from(color) % 10, 10).unwrap_or('?'),
        CellView::Preview(_) => '*',
    }
}

/// One line per row, no trailing newline
pub fn render_board(view: &BoardView) -> String {
    view.iter()
        .map(|row| row.iter().map(|&cell| cell_char(cell)).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shape bounding box with `#` for occupied cells
pub fn render_shape(shape: &Shape) -> String {
    shape
        .matrix()
        .iter()
        .map(|row| row.iter().map(|&on| if on { '#' } else { '.' }).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dock summary, e.g. `[0] square  [1] -  [2] h3`
pub fn render_dock(dock: &[Option<DockBlock>]) -> String {
    dock.iter()
        .enumerate()
        .map(|(slot, entry)| match entry {
            Some(block) => format!("[{}] {}", slot, block.shape),
            None => format!("[{}] -", slot),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Each pending block drawn as its shape, headed by slot, name and colour
pub fn render_dock_shapes(dock: &[Option<DockBlock>]) -> String {
    dock.iter()
        .flatten()
        .map(|block| {
            format!(
                "[{}] {} {}\n{}",
                block.slot,
                block.shape,
                color_hex(block.color),
                render_shape(block.shape.shape())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
