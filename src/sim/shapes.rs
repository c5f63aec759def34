//! Block shape catalog
//!
//! Every shape is a bitmask over its bounding rectangle. The catalog is a
//! fixed, ordered table shared read-only by every round.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named, immutable polyomino
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub name: &'static str,
    pub rows: u8,
    pub cols: u8,
    /// Bit `r * cols + c` set when cell (r, c) is occupied
    mask: u16,
}

impl Shape {
    /// Whether the cell at (row, col) inside the bounding box is occupied
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        if row >= self.rows as usize || col >= self.cols as usize {
            return false;
        }
        self.mask & (1 << (row * self.cols as usize + col)) != 0
    }

    /// Occupied cell offsets in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols as usize;
        (0..self.rows as usize * cols)
            .filter(move |bit| self.mask & (1 << bit) != 0)
            .map(move |bit| (bit / cols, bit % cols))
    }

    /// Number of occupied cells
    pub fn area(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// First occupied cell in row-major order
    pub fn first_cell(&self) -> (usize, usize) {
        let bit = self.mask.trailing_zeros() as usize;
        (bit / self.cols as usize, bit % self.cols as usize)
    }

    /// The shape as a boolean matrix (rows × cols)
    pub fn matrix(&self) -> Vec<Vec<bool>> {
        (0..self.rows as usize)
            .map(|r| (0..self.cols as usize).map(|c| self.is_occupied(r, c)).collect())
            .collect()
    }
}

const fn shape(name: &'static str, rows: &[&[u8]]) -> Shape {
    let height = rows.len();
    let width = rows[0].len();
    let mut mask = 0u16;
    let mut r = 0;
    while r < height {
        let mut c = 0;
        while c < width {
            if rows[r][c] == 1 {
                mask |= 1 << (r * width + c);
            }
            c += 1;
        }
        r += 1;
    }
    Shape {
        name,
        rows: height as u8,
        cols: width as u8,
        mask,
    }
}

/// The full catalog, in dock-draw order
pub static SHAPES: [Shape; 16] = [
    shape("single", &[&[1]]),
    shape("h2", &[&[1, 1]]),
    shape("v2", &[&[1], &[1]]),
    shape("h3", &[&[1, 1, 1]]),
    shape("v3", &[&[1], &[1], &[1]]),
    shape("h4", &[&[1, 1, 1, 1]]),
    shape("v4", &[&[1], &[1], &[1], &[1]]),
    shape("square", &[&[1, 1], &[1, 1]]),
    shape("l_br", &[&[1, 0], &[1, 1]]),
    shape("l_bl", &[&[0, 1], &[1, 1]]),
    shape("l_tr", &[&[1, 1], &[1, 0]]),
    shape("l_tl", &[&[1, 1], &[0, 1]]),
    shape("t_up", &[&[0, 1, 0], &[1, 1, 1]]),
    shape("t_down", &[&[1, 1, 1], &[0, 1, 0]]),
    shape("t_left", &[&[0, 1], &[1, 1], &[0, 1]]),
    shape("t_right", &[&[1, 0], &[1, 1], &[1, 0]]),
];

/// All catalog shapes, ordered
pub fn shapes_of() -> &'static [Shape] {
    &SHAPES
}

/// Look up a shape by name
pub fn shape_by_name(name: &str) -> Option<&'static Shape> {
    SHAPES.iter().find(|s| s.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("unknown block shape '{0}'")]
    UnknownShape(String),
}

/// Compact handle to a catalog shape; serializes as the shape name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeId(u8);

impl ShapeId {
    pub fn from_name(name: &str) -> Result<Self, ShapeError> {
        SHAPES
            .iter()
            .position(|s| s.name == name)
            .map(|idx| ShapeId(idx as u8))
            .ok_or_else(|| ShapeError::UnknownShape(name.to_string()))
    }

    /// Handle for the catalog entry at `index` (wraps around the catalog)
    pub fn from_index(index: usize) -> Self {
        ShapeId((index % SHAPES.len()) as u8)
    }

    pub fn shape(self) -> &'static Shape {
        &SHAPES[self.0 as usize]
    }

    pub fn name(self) -> &'static str {
        self.shape().name
    }
}

impl TryFrom<String> for ShapeId {
    type Error = ShapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ShapeId::from_name(&value)
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.name().to_string()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let mut names: Vec<_> = shapes_of().iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SHAPES.len());
    }

    #[test]
    fn test_every_shape_has_cells() {
        for shape in shapes_of() {
            assert!(shape.area() >= 1, "{} is empty", shape.name);
            assert_eq!(shape.cells().count(), shape.area());
        }
    }

    #[test]
    fn test_t_up_matrix() {
        let t = shape_by_name("t_up").unwrap();
        assert_eq!((t.rows, t.cols), (2, 3));
        assert_eq!(
            t.matrix(),
            vec![vec![false, true, false], vec![true, true, true]]
        );
        assert_eq!(t.first_cell(), (0, 1));
        assert_eq!(t.cells().collect::<Vec<_>>(), vec![(0, 1), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_l_bl_first_cell_skips_hole() {
        let l = shape_by_name("l_bl").unwrap();
        assert_eq!(l.first_cell(), (0, 1));
        assert!(!l.is_occupied(0, 0));
        assert_eq!(l.area(), 3);
    }

    #[test]
    fn test_shape_id_serializes_as_name() {
        let id = ShapeId::from_name("square").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"square\"");
        let back: ShapeId = serde_json::from_str("\"t_left\"").unwrap();
        assert_eq!(back.name(), "t_left");
        assert!(serde_json::from_str::<ShapeId>("\"pentomino\"").is_err());
    }

    #[test]
    fn test_unknown_name() {
        assert!(shape_by_name("zigzag").is_none());
        assert_eq!(
            ShapeId::from_name("zigzag"),
            Err(ShapeError::UnknownShape("zigzag".to_string()))
        );
    }
}
