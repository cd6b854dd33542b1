//! Simulation settings
//!
//! The generator seed and physics tuning a replay needs besides the level
//! and the input tape. The screen extents are only read to cull quads.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::LoadError;
use crate::sim::fixed::Fixed;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed of the deterministic generator
    pub seed: u64,

    // === Screen ===
    pub screen_width: i32,
    pub screen_height: i32,

    // === Physics ===
    /// Downward acceleration per frame, before per-behaviour coefficients
    pub gravity: Fixed,
    /// Terminal vertical speed of falling objects
    pub max_fall_speed: Fixed,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            gravity: DEFAULT_GRAVITY,
            max_fall_speed: DEFAULT_MAX_FALL_SPEED,
        }
    }
}

impl Settings {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
