//! Settings store and match log.
//!
//! Settings live in a key-value layout mirroring the browser extension
//! storage: a `settings` key holding `{ "rules": [...] }` and a separate
//! `enabled` key. Missing keys are not errors; they read as an empty rule set
//! and `enabled = true`.

mod memory;
mod sqlite;

use anyhow::Result;

use crate::rules::{ConflictAction, DownloadId, Settings};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key holding the serialized [`Settings`].
pub const SETTINGS_KEY: &str = "settings";
/// Key holding the global on/off switch.
pub const ENABLED_KEY: &str = "enabled";

/// One applied suggestion, kept for `dpr history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub download_id: DownloadId,
    pub rule_id: String,
    pub url: String,
    pub page_url: Option<String>,
    /// Suggested path relative to the download directory.
    pub filename: String,
    pub conflict_action: ConflictAction,
    /// Unix milliseconds.
    pub matched_at: i64,
}

/// Async access to persisted settings.
///
/// Implementations are read fresh on every filename decision, so they should
/// not cache across calls.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn load_settings(&self) -> Result<Settings>;
    async fn save_settings(&self, settings: &Settings) -> Result<()>;
    async fn load_enabled(&self) -> Result<bool>;
    async fn save_enabled(&self, enabled: bool) -> Result<()>;
    async fn record_match(&self, record: &MatchRecord) -> Result<()>;
    /// Most recent records first.
    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>>;
}
