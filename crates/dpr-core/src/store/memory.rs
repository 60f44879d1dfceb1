//! In-process store for dry runs and tests.

use anyhow::Result;
use tokio::sync::Mutex;

use super::{MatchRecord, SettingsStore};
use crate::rules::Settings;

#[derive(Debug, Default)]
struct MemoryState {
    settings: Option<Settings>,
    enabled: Option<bool>,
    matches: Vec<MatchRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                settings: Some(settings),
                ..MemoryState::default()
            }),
        }
    }
}

impl SettingsStore for MemoryStore {
    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.state.lock().await.settings.clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.state.lock().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn load_enabled(&self) -> Result<bool> {
        Ok(self.state.lock().await.enabled.unwrap_or(true))
    }

    async fn save_enabled(&self, enabled: bool) -> Result<()> {
        self.state.lock().await.enabled = Some(enabled);
        Ok(())
    }

    async fn record_match(&self, record: &MatchRecord) -> Result<()> {
        self.state.lock().await.matches.push(record.clone());
        Ok(())
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>> {
        let state = self.state.lock().await;
        Ok(state.matches.iter().rev().take(limit).cloned().collect())
    }
}
