//! Level editor model
//!
//! A stage draft being painted: each cell cycles Empty → Target → Wall, and
//! blocks are appended to an ordered sequence. Drafts turn into
//! `StageDefinition`s for saving and export.

use serde::{Deserialize, Serialize};

use crate::consts::GRID_SIZE;
use crate::persistence::{StageStore, StageStoreError};
use crate::sim::shapes::ShapeId;
use crate::sim::stage::{StageCell, StageDefinition, StageParseError, StageRecord, UNTITLED_STAGE};

/// Editor paint state of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DraftCell {
    #[default]
    Empty,
    Target,
    Wall,
}

impl DraftCell {
    fn next(self) -> Self {
        match self {
            DraftCell::Empty => DraftCell::Target,
            DraftCell::Target => DraftCell::Wall,
            DraftCell::Wall => DraftCell::Empty,
        }
    }
}

/// Stage under construction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageDraft {
    pub title: String,
    cells: [[DraftCell; GRID_SIZE]; GRID_SIZE],
    blocks: Vec<ShapeId>,
}

impl StageDraft {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Draft pre-filled from an existing stage
    pub fn from_definition(stage: &StageDefinition) -> Self {
        let mut cells = [[DraftCell::Empty; GRID_SIZE]; GRID_SIZE];
        for (r, row) in stage.layout.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                cells[r][c] = match cell {
                    StageCell::Target => DraftCell::Target,
                    StageCell::Wall => DraftCell::Wall,
                };
            }
        }
        Self {
            title: stage.title.clone(),
            cells,
            blocks: stage.blocks.clone(),
        }
    }

    /// Reopen a stage exported as a JSON record
    pub fn from_record_json(json: &str) -> Result<Self, StageParseError> {
        let record: StageRecord = serde_json::from_str(json)?;
        Ok(Self::from_definition(&StageDefinition::from_record(&record)?))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<DraftCell> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Cycle a cell; returns its new state (`None` when out of bounds)
    pub fn toggle_cell(&mut self, row: usize, col: usize) -> Option<DraftCell> {
        let cell = self.cells.get_mut(row)?.get_mut(col)?;
        *cell = cell.next();
        Some(*cell)
    }

    pub fn blocks(&self) -> &[ShapeId] {
        &self.blocks
    }

    pub fn add_block(&mut self, shape: ShapeId) {
        self.blocks.push(shape);
    }

    /// Remove the block at `index`; out-of-range indices are ignored
    pub fn remove_block(&mut self, index: usize) -> Option<ShapeId> {
        (index < self.blocks.len()).then(|| self.blocks.remove(index))
    }

    pub fn clear_blocks(&mut self) {
        self.blocks.clear();
    }

    /// Number of Target cells painted so far
    pub fn target_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == DraftCell::Target)
            .count()
    }

    /// Stage as played: every non-Target cell becomes a Wall
    pub fn to_definition(&self) -> StageDefinition {
        let mut layout = [[StageCell::Wall; GRID_SIZE]; GRID_SIZE];
        for (r, row) in self.cells.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell == DraftCell::Target {
                    layout[r][c] = StageCell::Target;
                }
            }
        }
        let title = if self.title.trim().is_empty() {
            UNTITLED_STAGE.to_string()
        } else {
            self.title.clone()
        };
        StageDefinition {
            title,
            layout,
            blocks: self.blocks.clone(),
        }
    }

    /// Pretty JSON stage record for copy/paste
    pub fn export_json(&self) -> Result<String, StageStoreError> {
        Ok(serde_json::to_string_pretty(&self.to_definition().to_record(None))?)
    }

    /// Persist through a stage store; returns the id used
    pub fn save(&self, store: &mut impl StageStore, id: Option<u64>) -> Result<u64, StageStoreError> {
        let stage = self.to_definition();
        if stage.target_count() != stage.block_area() {
            log::warn!(
                "Saving '{}' with {} targets but {} block cells",
                stage.title,
                stage.target_count(),
                stage.block_area()
            );
        }
        store.save(&stage, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStageStore;
    use crate::sim::stage::StageCatalog;

    #[test]
    fn test_toggle_cycles() {
        let mut draft = StageDraft::new("Cycle");
        assert_eq!(draft.toggle_cell(2, 3), Some(DraftCell::Target));
        assert_eq!(draft.toggle_cell(2, 3), Some(DraftCell::Wall));
        assert_eq!(draft.toggle_cell(2, 3), Some(DraftCell::Empty));
        assert_eq!(draft.toggle_cell(8, 0), None);
    }

    #[test]
    fn test_block_sequence_edits() {
        let mut draft = StageDraft::new("Blocks");
        draft.add_block(ShapeId::from_name("h2").unwrap());
        draft.add_block(ShapeId::from_name("square").unwrap());
        draft.add_block(ShapeId::from_name("single").unwrap());
        assert_eq!(draft.remove_block(1).map(|s| s.name()), Some("square"));
        assert_eq!(draft.remove_block(5), None);
        let names: Vec<_> = draft.blocks().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["h2", "single"]);
        draft.clear_blocks();
        assert!(draft.blocks().is_empty());
    }

    #[test]
    fn test_empty_and_wall_both_become_walls() {
        let mut draft = StageDraft::new("");
        draft.toggle_cell(0, 0);
        draft.toggle_cell(0, 1);
        draft.toggle_cell(0, 1);
        let stage = draft.to_definition();
        assert_eq!(stage.title, UNTITLED_STAGE);
        assert_eq!(stage.layout[0][0], StageCell::Target);
        assert_eq!(stage.layout[0][1], StageCell::Wall);
        assert_eq!(stage.layout[5][5], StageCell::Wall);
        assert_eq!(stage.target_count(), 1);
    }

    #[test]
    fn test_export_json_is_a_stage_record() {
        let mut draft = StageDraft::new("Export");
        draft.toggle_cell(4, 4);
        draft.add_block(ShapeId::from_name("single").unwrap());
        let json = draft.export_json().unwrap();
        let record: StageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.title, "Export");
        assert_eq!(record.blocks, vec!["single".to_string()]);
        assert_eq!(record.grid[4][4], 1);
        assert_eq!(record.grid[0][0], 0);
    }

    #[test]
    fn test_exported_draft_reopens_for_editing() {
        let mut draft = StageDraft::new("Reopen");
        draft.toggle_cell(1, 1);
        draft.toggle_cell(1, 2);
        draft.add_block(ShapeId::from_name("h2").unwrap());
        let json = draft.export_json().unwrap();

        let mut reopened = StageDraft::from_record_json(&json).unwrap();
        assert_eq!(reopened.title, "Reopen");
        assert_eq!(reopened.cell(1, 1), Some(DraftCell::Target));
        assert_eq!(reopened.cell(0, 0), Some(DraftCell::Wall));
        assert_eq!(reopened.blocks(), draft.blocks());
        assert_eq!(reopened.toggle_cell(1, 2), Some(DraftCell::Wall));
        assert!(matches!(
            StageDraft::from_record_json("{}"),
            Err(StageParseError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_reload_through_store() {
        let builtin = StageCatalog::builtin().unwrap();
        let draft = StageDraft::from_definition(builtin.get(3).unwrap());
        let mut store = MemoryStageStore::new();
        let id = draft.save(&mut store, None).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(&loaded[&id], builtin.get(3).unwrap());
    }
}
