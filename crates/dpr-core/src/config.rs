use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::click_history::{DEFAULT_CAPACITY, DEFAULT_TTL_MS};
use crate::page_resolver::DEFAULT_RECENT_WINDOW_MS;

/// Global configuration loaded from `~/.config/dpr/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DprConfig {
    /// Maximum number of remembered page clicks.
    pub click_history_capacity: usize,
    /// Clicks older than this (milliseconds) are pruned when a download starts.
    pub click_history_ttl_ms: i64,
    /// How recent a click must be (milliseconds) to attribute a download with no domain match.
    pub recent_click_window_ms: i64,
    /// Settings database; defaults to `~/.local/state/dpr/dpr.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Default for DprConfig {
    fn default() -> Self {
        Self {
            click_history_capacity: DEFAULT_CAPACITY,
            click_history_ttl_ms: DEFAULT_TTL_MS,
            recent_click_window_ms: DEFAULT_RECENT_WINDOW_MS,
            database_path: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dpr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DprConfig> {
    load_or_init_at(&config_path()?)
}

/// As [`load_or_init`], for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<DprConfig> {
    if !path.exists() {
        let default_cfg = DprConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: DprConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
