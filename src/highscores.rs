//! High score persistence
//!
//! A single best score, persisted to LocalStorage as a plain integer string.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Best score across sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sky_jumper_high_score";

    pub fn new() -> Self {
        Self { best: 0 }
    }

    /// Record a score; returns true if it is a new best
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Parse the stored representation
    pub fn from_stored(raw: &str) -> anyhow::Result<Self> {
        let best = raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid stored high score {raw:?}"))?;
        Ok(Self { best })
    }

    pub fn to_stored(&self) -> String {
        self.best.to_string()
    }

    /// Load the high score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match storage_get(Self::STORAGE_KEY).and_then(|raw| raw.map(|r| Self::from_stored(&r)).transpose()) {
            Ok(Some(score)) => {
                log::info!("Loaded high score {}", score.best);
                score
            }
            Ok(None) => {
                log::info!("No high score found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Could not load high score: {e:#}");
                Self::new()
            }
        }
    }

    /// Save the high score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        match storage_set(Self::STORAGE_KEY, &self.to_stored()) {
            Ok(()) => log::info!("High score saved ({})", self.best),
            Err(e) => log::error!("Failed to save high score: {e:#}"),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> anyhow::Result<web_sys::Storage> {
    web_sys::window()
        .ok_or_else(|| anyhow::anyhow!("No window found"))?
        .local_storage()
        .map_err(|err| anyhow::anyhow!("Error opening LocalStorage : {:#?}", err))?
        .ok_or_else(|| anyhow::anyhow!("LocalStorage not available"))
}

/// Read a LocalStorage value
#[cfg(target_arch = "wasm32")]
pub(crate) fn storage_get(key: &str) -> anyhow::Result<Option<String>> {
    local_storage()?
        .get_item(key)
        .map_err(|err| anyhow::anyhow!("Error reading {key} : {:#?}", err))
}

/// Write a LocalStorage value
#[cfg(target_arch = "wasm32")]
pub(crate) fn storage_set(key: &str, value: &str) -> anyhow::Result<()> {
    local_storage()?
        .set_item(key, value)
        .map_err(|err| anyhow::anyhow!("Error writing {key} : {:#?}", err))
}
