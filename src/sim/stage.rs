//! Stage definitions and the stage catalog
//!
//! A stage is an 8×8 layout of walls and targets plus the ordered block
//! sequence the player receives. Stages travel as `StageRecord` JSON
//! (`{ id?, title, grid, blocks }`, grid value 1 = target, anything else =
//! wall) and are immutable once loaded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::board::WallMask;
use super::shapes::{ShapeError, ShapeId};
use crate::consts::GRID_SIZE;

/// Title given to records saved without one
pub const UNTITLED_STAGE: &str = "Untitled Stage";

/// One cell of a stage layout; every non-wall cell is a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageCell {
    Wall,
    Target,
}

pub type StageLayout = [[StageCell; GRID_SIZE]; GRID_SIZE];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("stage grid must be 8x8, found {rows} rows with a {cols}-column row")]
    Dimensions { rows: usize, cols: usize },
    #[error(transparent)]
    UnknownShape(#[from] ShapeError),
}

/// An immutable stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub title: String,
    pub layout: StageLayout,
    pub blocks: Vec<ShapeId>,
}

impl StageDefinition {
    /// Parse an ASCII layout: `#` is a wall, any other character a target
    pub fn from_rows(title: &str, rows: &[&str], blocks: &[&str]) -> Result<Self, StageError> {
        let widest = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if rows.len() != GRID_SIZE || rows.iter().any(|r| r.chars().count() != GRID_SIZE) {
            return Err(StageError::Dimensions {
                rows: rows.len(),
                cols: widest,
            });
        }
        let mut layout = [[StageCell::Wall; GRID_SIZE]; GRID_SIZE];
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                if ch != '#' {
                    layout[r][c] = StageCell::Target;
                }
            }
        }
        let blocks = blocks
            .iter()
            .map(|name| ShapeId::from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            title: title.to_string(),
            layout,
            blocks,
        })
    }

    /// Validate a wire record
    pub fn from_record(record: &StageRecord) -> Result<Self, StageError> {
        let grid = &record.grid;
        if grid.len() != GRID_SIZE || grid.iter().any(|row| row.len() != GRID_SIZE) {
            return Err(StageError::Dimensions {
                rows: grid.len(),
                cols: grid.iter().map(Vec::len).find(|&n| n != GRID_SIZE).unwrap_or(GRID_SIZE),
            });
        }
        let mut layout = [[StageCell::Wall; GRID_SIZE]; GRID_SIZE];
        for (r, row) in grid.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                // Any JSON number equal to 1 (`1` or `1.0`)
                if value.as_f64() == Some(1.0) {
                    layout[r][c] = StageCell::Target;
                }
            }
        }
        let blocks = record
            .blocks
            .iter()
            .map(|name| ShapeId::from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        let title = if record.title.trim().is_empty() {
            UNTITLED_STAGE.to_string()
        } else {
            record.title.clone()
        };
        Ok(Self {
            title,
            layout,
            blocks,
        })
    }

    /// Wire record for this stage
    pub fn to_record(&self, id: Option<u64>) -> StageRecord {
        StageRecord {
            id,
            title: self.title.clone(),
            grid: self
                .layout
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| Value::from(u8::from(*cell == StageCell::Target)))
                        .collect()
                })
                .collect(),
            blocks: self.blocks.iter().map(|b| b.name().to_string()).collect(),
        }
    }

    pub fn wall_mask(&self) -> WallMask {
        self.layout.map(|row| row.map(|cell| cell == StageCell::Wall))
    }

    pub fn target_count(&self) -> usize {
        self.layout
            .iter()
            .flatten()
            .filter(|c| **c == StageCell::Target)
            .count()
    }

    /// Total cells covered by the whole block sequence
    pub fn block_area(&self) -> usize {
        self.blocks.iter().map(|b| b.shape().area()).sum()
    }
}

/// Persisted stage shape shared by every stage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub grid: Vec<Vec<Value>>,
    pub blocks: Vec<String>,
}

/// Ordered stages, addressed by 1-based stage number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCatalog {
    stages: Vec<StageDefinition>,
}

impl StageCatalog {
    pub fn new(stages: Vec<StageDefinition>) -> Self {
        Self { stages }
    }

    /// Catalog from an id → definition map, ordered by ascending id
    pub fn from_map(map: BTreeMap<u64, StageDefinition>) -> Self {
        Self {
            stages: map.into_values().collect(),
        }
    }

    /// Parse the `{ "<id>": StageRecord, ... }` payload a stage backend serves
    pub fn from_json(json: &str) -> Result<Self, StageParseError> {
        let records: BTreeMap<u64, StageRecord> = serde_json::from_str(json)?;
        let mut map = BTreeMap::new();
        for (id, record) in records {
            map.insert(id, StageDefinition::from_record(&record)?);
        }
        log::info!("Loaded {} stages", map.len());
        Ok(Self::from_map(map))
    }

    /// The stages shipped with the game
    pub fn builtin() -> Result<Self, StageError> {
        let stages = BUILTIN_STAGES
            .iter()
            .map(|(title, rows, blocks)| StageDefinition::from_rows(title, rows, blocks))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stages })
    }

    /// Stage by 1-based number
    pub fn get(&self, number: u32) -> Option<&StageDefinition> {
        (number as usize)
            .checked_sub(1)
            .and_then(|idx| self.stages.get(idx))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of the stage after `number`, if any
    pub fn next_after(&self, number: u32) -> Option<u32> {
        let next = number.checked_add(1)?;
        self.get(next).map(|_| next)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &StageDefinition)> {
        self.stages.iter().enumerate().map(|(i, s)| (i as u32 + 1, s))
    }
}

/// Failure to read a stage payload
#[derive(Debug, Error)]
pub enum StageParseError {
    #[error("malformed stage JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid stage: {0}")]
    Stage(#[from] StageError),
}

type BuiltinStage = (&'static str, [&'static str; GRID_SIZE], &'static [&'static str]);

const BUILTIN_STAGES: &[BuiltinStage] = &[
    (
        "Warm Up",
        [
            "########",
            "########",
            "##....##",
            "##....##",
            "##....##",
            "##....##",
            "########",
            "########",
        ],
        &["square", "square", "square", "square"],
    ),
    (
        "Twin Rails",
        [
            "########",
            "########",
            "########",
            "........",
            "........",
            "########",
            "########",
            "########",
        ],
        &["h4", "h4", "h4", "h4"],
    ),
    (
        "Corners",
        [
            "########",
            "########",
            "########",
            "#......#",
            "#......#",
            "########",
            "########",
            "########",
        ],
        &["l_br", "l_tl", "l_br", "l_tl"],
    ),
    (
        "Pillars",
        [
            "########",
            "########",
            "##....##",
            "##....##",
            "##....##",
            "########",
            "########",
            "########",
        ],
        &["v3", "h2", "h2", "h2", "v3"],
    ),
    (
        "Signpost",
        [
            "########",
            "########",
            "########",
            "###..###",
            "###..###",
            "###..###",
            "########",
            "########",
        ],
        &["t_right", "single", "single"],
    ),
];
