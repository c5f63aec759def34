//! WASM API module for browser/JS interop
//!
//! The page owns the DOM, drag handling and animations; it drives a
//! `WasmRound` and redraws from the JSON snapshots it returns.

use wasm_bindgen::prelude::*;

use crate::editor::StageDraft;
use crate::persistence::LocalScoreStore;
use crate::platform::storage;
use crate::renderer::board_view;
use crate::settings::Settings;
use crate::sim::{GameMode, RoundController, RoundState, StageCatalog, best_move};

/// LocalStorage key of the saved in-progress round
const ROUND_KEY: &str = "blockBlastRound";

/// Install the panic hook and console logger
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Block Blast starting...");
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json(value: &impl serde::Serialize) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(to_js)
}

/// One game session bound to the page
#[wasm_bindgen]
pub struct WasmRound {
    controller: RoundController<LocalScoreStore>,
    settings: Settings,
}

#[wasm_bindgen]
impl WasmRound {
    /// Create a session from the stage backend's JSON payload
    ///
    /// An empty payload uses the built-in stages.
    #[wasm_bindgen(constructor)]
    pub fn new(stages_json: &str) -> Result<WasmRound, JsValue> {
        let catalog = if stages_json.trim().is_empty() {
            StageCatalog::builtin().map_err(to_js)?
        } else {
            StageCatalog::from_json(stages_json).map_err(to_js)?
        };
        let settings = Settings::load();
        let seed = settings.seed.unwrap_or_else(rand::random);
        Ok(Self {
            controller: RoundController::new(catalog, LocalScoreStore::load(), seed),
            settings,
        })
    }

    #[wasm_bindgen(js_name = stageCount)]
    pub fn stage_count(&self) -> u32 {
        self.controller.catalog().len() as u32
    }

    #[wasm_bindgen(js_name = settingsJson)]
    pub fn settings_json(&self) -> Result<String, JsValue> {
        to_json(&self.settings)
    }

    #[wasm_bindgen(js_name = startEndless)]
    pub fn start_endless(&mut self) -> Result<(), JsValue> {
        self.controller.start_round(GameMode::Endless).map_err(to_js)
    }

    /// Start a 1-based stage
    #[wasm_bindgen(js_name = startStage)]
    pub fn start_stage(&mut self, number: u32) -> Result<(), JsValue> {
        self.controller.start_round(GameMode::Stage(number)).map_err(to_js)
    }

    pub fn restart(&mut self) -> Result<(), JsValue> {
        self.controller.restart().map_err(to_js)
    }

    /// Next stage number, or `undefined` after the last one
    #[wasm_bindgen(js_name = nextStage)]
    pub fn next_stage(&mut self) -> Result<Option<u32>, JsValue> {
        self.controller.advance_stage().map_err(to_js)
    }

    #[wasm_bindgen(js_name = returnToMenu)]
    pub fn return_to_menu(&mut self) {
        self.controller.return_to_menu();
    }

    /// Board view with the hovered placement highlighted (JSON)
    pub fn preview(&self, slot: usize, row: i32, col: i32) -> Result<String, JsValue> {
        let state = self.controller.state();
        let layout = state.stage.as_ref().map(|s| &s.layout);
        let hover = if self.settings.hover_preview {
            self.controller.preview(slot, row, col)
        } else {
            None
        };
        let color = state.dock.get(slot).copied().flatten().map_or(0, |b| b.color);
        let view = board_view(&state.board, layout, hover.as_ref().map(|p| (p, color)));
        to_json(&view)
    }

    /// Place a dock block; returns the placement outcome (JSON)
    pub fn place(&mut self, slot: usize, row: i32, col: i32) -> Result<String, JsValue> {
        let outcome = self
            .controller
            .attempt_placement(slot, row, col)
            .map_err(to_js)?;
        to_json(&outcome)
    }

    /// Everything the page needs to redraw (JSON)
    pub fn snapshot(&self) -> Result<String, JsValue> {
        to_json(&self.controller.snapshot())
    }

    /// Board view without hover (JSON)
    #[wasm_bindgen(js_name = boardView)]
    pub fn board_view(&self) -> Result<String, JsValue> {
        let state = self.controller.state();
        let layout = state.stage.as_ref().map(|s| &s.layout);
        to_json(&board_view(&state.board, layout, None))
    }

    /// Suggested move (JSON) or `undefined`
    pub fn hint(&self) -> Result<Option<String>, JsValue> {
        best_move(self.controller.state())
            .map(|mv| to_json(&mv))
            .transpose()
    }

    /// Persist the in-progress round for Continue
    #[wasm_bindgen(js_name = saveRound)]
    pub fn save_round(&self) -> Result<bool, JsValue> {
        let json = to_json(self.controller.state())?;
        Ok(storage::set_item(ROUND_KEY, &json))
    }

    /// Restore a saved round; returns whether one was found
    #[wasm_bindgen(js_name = continueRound)]
    pub fn continue_round(&mut self) -> Result<bool, JsValue> {
        let Some(json) = storage::get_item(ROUND_KEY) else {
            return Ok(false);
        };
        let state: RoundState = serde_json::from_str(&json).map_err(to_js)?;
        self.controller.resume(state);
        Ok(true)
    }
}

/// Editor draft bound to the level editor page
#[wasm_bindgen]
pub struct WasmDraft {
    draft: StageDraft,
}

#[wasm_bindgen]
impl WasmDraft {
    #[wasm_bindgen(constructor)]
    pub fn new(title: &str) -> WasmDraft {
        Self {
            draft: StageDraft::new(title),
        }
    }

    /// Reopen a stage exported by `exportJson`
    #[wasm_bindgen(js_name = fromRecordJson)]
    pub fn from_record_json(json: &str) -> Result<WasmDraft, JsValue> {
        Ok(Self {
            draft: StageDraft::from_record_json(json).map_err(to_js)?,
        })
    }

    #[wasm_bindgen(js_name = setTitle)]
    pub fn set_title(&mut self, title: &str) {
        self.draft.title = title.to_string();
    }

    /// Cycle a cell; returns the new state name
    #[wasm_bindgen(js_name = toggleCell)]
    pub fn toggle_cell(&mut self, row: usize, col: usize) -> Option<String> {
        self.draft.toggle_cell(row, col).map(|cell| format!("{:?}", cell))
    }

    #[wasm_bindgen(js_name = addBlock)]
    pub fn add_block(&mut self, name: &str) -> Result<(), JsValue> {
        let shape = crate::sim::ShapeId::from_name(name).map_err(to_js)?;
        self.draft.add_block(shape);
        Ok(())
    }

    #[wasm_bindgen(js_name = removeBlock)]
    pub fn remove_block(&mut self, index: usize) {
        self.draft.remove_block(index);
    }

    #[wasm_bindgen(js_name = clearBlocks)]
    pub fn clear_blocks(&mut self) {
        self.draft.clear_blocks();
    }

    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        self.draft.export_json().map_err(to_js)
    }
}
