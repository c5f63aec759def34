//! Game settings and preferences
//!
//! Persisted separately from the best score. Browser builds use LocalStorage;
//! native builds read an optional JSON file named by `BLOCK_BLAST_SETTINGS`.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed RNG seed; random per session when unset
    pub seed: Option<u64>,

    // === Input ===
    /// Highlight the cells a dragged block would fill
    pub hover_preview: bool,

    // === Accessibility ===
    /// Skip line-clear and refill animations
    pub reduced_motion: bool,

    // === Animation timing (advisory, presentation only) ===
    pub line_clear_delay_ms: u32,
    pub refill_delay_ms: u32,
    /// Pause before the win/loss overlay
    pub result_delay_ms: u32,

    // === Stages ===
    /// Stage file used by the native file store
    pub stage_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            hover_preview: true,
            reduced_motion: false,
            line_clear_delay_ms: 400,
            refill_delay_ms: 300,
            result_delay_ms: 500,
            stage_file: "stages.json".to_string(),
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "blockBlastSettings";

    /// Native override: path of a JSON settings file
    pub const ENV_VAR: &'static str = "BLOCK_BLAST_SETTINGS";

    /// Parse settings; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Animation delays with reduced motion applied
    pub fn effective_line_clear_delay_ms(&self) -> u32 {
        if self.reduced_motion { 0 } else { self.line_clear_delay_ms }
    }

    pub fn effective_refill_delay_ms(&self) -> u32 {
        if self.reduced_motion { 0 } else { self.refill_delay_ms }
    }

    /// Parse or fall back to defaults with a warning
    fn parse_or_default(json: &str, source: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", source);
                settings
            }
            Err(err) => {
                log::warn!("Ignoring invalid settings in {}: {}", source, err);
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match storage::get_item(Self::STORAGE_KEY) {
            Some(json) => Self::parse_or_default(&json, "LocalStorage"),
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from the file named by `BLOCK_BLAST_SETTINGS`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_VAR) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => Self::parse_or_default(&json, &path),
            Err(err) => {
                log::warn!("Cannot read settings file {}: {}", path, err);
                Self::default()
            }
        }
    }

    /// Save settings to LocalStorage; native builds keep them in memory
    pub fn save(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Settings not saved: {}", err);
                return;
            }
        };
        if storage::set_item(Self::STORAGE_KEY, &json) {
            log::info!("Settings saved");
        } else {
            log::debug!("Settings kept in memory only");
        }
    }
}
