//! Stage record storage
//!
//! Two backends share the `StageRecord` JSON shape:
//! - `MemoryStageStore`: an append-only row log (a later row with the same
//!   id wins on load)
//! - `FileStageStore`: one JSON file holding the id → record map, rewritten
//!   in full on every save (tmp file, then rename)

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sim::stage::{StageDefinition, StageError, StageParseError, StageRecord};

/// Stage backend failures
#[derive(Debug, Error)]
pub enum StageStoreError {
    #[error("stage file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed stage JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid stage: {0}")]
    Stage(#[from] StageError),
}

impl From<StageParseError> for StageStoreError {
    fn from(err: StageParseError) -> Self {
        match err {
            StageParseError::Json(err) => StageStoreError::Json(err),
            StageParseError::Stage(err) => StageStoreError::Stage(err),
        }
    }
}

/// Stage persistence contract used by the editor and the stage catalog loader
pub trait StageStore {
    /// Every stored stage keyed by id
    fn load_all(&self) -> Result<BTreeMap<u64, StageDefinition>, StageStoreError>;

    /// Store a stage; a missing id gets the next free one. Returns the id used.
    fn save(&mut self, stage: &StageDefinition, id: Option<u64>) -> Result<u64, StageStoreError>;
}

fn next_id<'a>(ids: impl Iterator<Item = &'a u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

/// Append-only in-memory row log
#[derive(Debug, Clone, Default)]
pub struct MemoryStageStore {
    rows: Vec<StageRecord>,
}

impl MemoryStageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw row as-is (rows may be malformed)
    pub fn push_record(&mut self, record: StageRecord) {
        self.rows.push(record);
    }

    /// Number of rows ever appended
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl StageStore for MemoryStageStore {
    fn load_all(&self) -> Result<BTreeMap<u64, StageDefinition>, StageStoreError> {
        let mut stages = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            let Some(id) = row.id else {
                log::warn!("Skipping stage row {} without an id", i);
                continue;
            };
            match StageDefinition::from_record(row) {
                Ok(stage) => {
                    stages.insert(id, stage);
                }
                Err(err) => log::warn!("Skipping stage row {}: {}", i, err),
            }
        }
        Ok(stages)
    }

    fn save(&mut self, stage: &StageDefinition, id: Option<u64>) -> Result<u64, StageStoreError> {
        let id = id.unwrap_or_else(|| next_id(self.rows.iter().filter_map(|r| r.id.as_ref())));
        self.rows.push(stage.to_record(Some(id)));
        log::info!("Stage '{}' saved as {}", stage.title, id);
        Ok(id)
    }
}

/// JSON file of `{ "<id>": StageRecord }`
#[derive(Debug, Clone)]
pub struct FileStageStore {
    path: PathBuf,
}

impl FileStageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<BTreeMap<u64, StageRecord>, StageStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl StageStore for FileStageStore {
    fn load_all(&self) -> Result<BTreeMap<u64, StageDefinition>, StageStoreError> {
        let mut stages = BTreeMap::new();
        for (id, record) in self.read_records()? {
            stages.insert(id, StageDefinition::from_record(&record)?);
        }
        log::info!("Loaded {} stages from {}", stages.len(), self.path.display());
        Ok(stages)
    }

    fn save(&mut self, stage: &StageDefinition, id: Option<u64>) -> Result<u64, StageStoreError> {
        let mut records = self.read_records()?;
        let id = id.unwrap_or_else(|| next_id(records.keys()));
        records.insert(id, stage.to_record(None));

        let json = serde_json::to_string_pretty(&records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::info!("Stage '{}' saved as {} in {}", stage.title, id, self.path.display());
        Ok(id)
    }
}

/// Legacy `stages.js` text (`const STAGES = {...};`) for static hosting
pub fn export_stages_js(stages: &BTreeMap<u64, StageDefinition>) -> Result<String, StageStoreError> {
    let records: BTreeMap<u64, StageRecord> = stages
        .iter()
        .map(|(id, stage)| (*id, stage.to_record(None)))
        .collect();
    let body = serde_json::to_string_pretty(&records)?;
    Ok(format!("const STAGES = {};\n", body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::stage::StageCatalog;

    fn stage(number: u32) -> StageDefinition {
        StageCatalog::builtin().unwrap().get(number).unwrap().clone()
    }

    #[test]
    fn test_memory_store_later_rows_win() {
        let mut store = MemoryStageStore::new();
        assert_eq!(store.save(&stage(1), None).unwrap(), 1);
        assert_eq!(store.save(&stage(2), None).unwrap(), 2);
        assert_eq!(store.save(&stage(3), Some(1)).unwrap(), 1);
        assert_eq!(store.row_count(), 3);

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&1].title, "Corners");
        assert_eq!(all[&2].title, "Twin Rails");
    }

    #[test]
    fn test_memory_store_skips_malformed_rows() {
        let mut store = MemoryStageStore::new();
        store.save(&stage(1), Some(5)).unwrap();
        let mut bad = stage(2).to_record(Some(6));
        bad.grid.pop();
        store.push_record(bad);
        let all = store.load_all().unwrap();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStageStore::new(dir.path().join("stages.json"));
        assert!(store.load_all().unwrap().is_empty());

        let original = stage(4);
        let id = store.save(&original, None).unwrap();
        assert_eq!(id, 1);
        store.save(&stage(5), Some(10)).unwrap();

        let reopened = FileStageStore::new(store.path());
        let all = reopened.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&1].layout, original.layout);
        assert_eq!(all[&1].blocks, original.blocks);
        assert_eq!(all[&10].title, "Signpost");
    }

    #[test]
    fn test_file_store_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stages.json");
        fs::write(&path, "const STAGES = {};").unwrap();
        let store = FileStageStore::new(&path);
        assert!(matches!(store.load_all(), Err(StageStoreError::Json(_))));
    }

    #[test]
    fn test_parse_errors_convert_to_store_errors() {
        let json_err = StageCatalog::from_json("{ not json").unwrap_err();
        assert!(matches!(StageStoreError::from(json_err), StageStoreError::Json(_)));

        let short = r#"{"1": {"title": "Short", "grid": [[1]], "blocks": []}}"#;
        let stage_err = StageCatalog::from_json(short).unwrap_err();
        assert!(matches!(StageStoreError::from(stage_err), StageStoreError::Stage(_)));
    }

    #[test]
    fn test_export_stages_js() {
        let mut stages = BTreeMap::new();
        stages.insert(1, stage(5));
        let js = export_stages_js(&stages).unwrap();
        assert!(js.starts_with("const STAGES = {"));
        assert!(js.trim_end().ends_with("};"));
        assert!(js.contains("\"t_right\""));
        assert!(!js.contains("\"id\""));
    }
}
