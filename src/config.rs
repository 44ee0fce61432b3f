//! # Configuration Module
//!
//! Data directory setup and the optional runtime configuration file.
//!
//! ## Data Storage
//!
//! tiertune keeps its state in the platform-standard data directory:
//! - Linux: `~/.local/share/tiertune/`
//! - macOS: `~/Library/Application Support/tiertune/`
//! - Windows: `%APPDATA%\tiertune\`
//!
//! The directory holds `state.db` (the SQLite snapshot store) and, if the
//! user creates one, `config.json`:
//!
//! ```json
//! {
//!   "rewards": { "free_per_track": 5.0, "top_bonus": 100.0 },
//!   "recommend": { "max_favorites": 20 }
//! }
//! ```
//!
//! Every field is optional and falls back to its default.

use crate::plan::RewardSchedule;
use crate::recommend::RecommendConfig;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tiertune";
const STATE_FILE: &str = "state.db";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate data directory, creating it if needed.
///
/// # Errors
///
/// Fails when the system data directory cannot be determined or the
/// `tiertune` subdirectory cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!("Could not determine the platform data directory")
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create tiertune data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Returns the default state file path inside the data directory.
pub fn get_state_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(STATE_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the SQLite state file
    pub state_path: PathBuf,
    pub rewards: RewardSchedule,
    pub recommend: RecommendConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_path: get_state_path().unwrap_or_else(|_| PathBuf::from(STATE_FILE)),
            rewards: RewardSchedule::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load `config.json` from the data directory, or defaults when absent.
    pub fn load() -> Result<Self> {
        Self::from_file(&get_data_dir()?.join(CONFIG_FILE))
    }

    /// Parse a configuration file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Create configuration with explicit state path
    #[must_use]
    pub fn with_state_path(mut self, state_path: PathBuf) -> Self {
        self.state_path = state_path;
        self
    }
}
