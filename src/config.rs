//! Sanctuary configuration, read from a RON file next to the executable.
//!
//! Every field has a default, so a missing file or a file that only sets a
//! few keys is fine:
//!
//! ```ron
//! (
//!     slot_count: 4,
//!     rng_seed: Some(42),
//!     fallback: Guest("Biscuit"),
//! )
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::shared::*;

/// What the scheduler does when an affinity scan finds no eligible guest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionFallback {
    /// Leave that visit out and keep going.
    #[default]
    Skip,
    /// Use this guest instead, if it exists and is not itself excluded.
    Guest(GuestId),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanctuaryConfig {
    pub slot_count: usize,
    /// Fixed seed for visit generation. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
    pub fallback: SelectionFallback,
    /// Build a fresh schedule for an exhausted slot while its item is fresh.
    pub auto_reschedule: bool,
    pub autosave: bool,
    pub save_path: String,
}

impl Default for SanctuaryConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            rng_seed: None,
            fallback: SelectionFallback::Skip,
            auto_reschedule: true,
            autosave: true,
            save_path: String::from("saves/sanctuary.json"),
        }
    }
}

impl SanctuaryConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    /// Reads `path` if it exists; a missing file yields the defaults and a
    /// malformed one is logged and also yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("[Config] {} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("[Config] Loaded {}", path.display());
                config
            }
            Err(e) => {
                warn!("[Config] {}; using defaults", e);
                Self::default()
            }
        }
    }
}
