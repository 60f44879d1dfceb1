//! Host-facing download router.
//!
//! The router owns the per-session state (click history and the
//! download → page mapping) and turns browser events into filename
//! suggestions. Events are delivered one at a time, so the state is plain
//! owned data mutated through `&mut self`; it is lost when the process exits.

use std::collections::HashMap;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::click_history::ClickHistory;
use crate::clock::unix_millis;
use crate::config::DprConfig;
use crate::page_resolver::PageUrlResolver;
use crate::protocol::{HostEvent, HostResponse};
use crate::rules::{resolve_match_at, DownloadId, DownloadItem, Suggestion};
use crate::store::{MatchRecord, SettingsStore};

/// Download lifecycle state as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Complete,
    Interrupted,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DownloadState::Complete | DownloadState::Interrupted)
    }
}

pub struct DownloadRouter<S> {
    store: S,
    history: ClickHistory,
    resolver: PageUrlResolver,
    page_urls: HashMap<DownloadId, String>,
}

impl<S: SettingsStore> DownloadRouter<S> {
    /// Router with history and resolver bounds taken from `cfg`.
    pub fn new(store: S, cfg: &DprConfig) -> Self {
        Self::with_parts(
            store,
            ClickHistory::new(cfg.click_history_capacity, cfg.click_history_ttl_ms),
            PageUrlResolver::new(cfg.recent_click_window_ms),
        )
    }

    pub fn with_parts(store: S, history: ClickHistory, resolver: PageUrlResolver) -> Self {
        Self {
            store,
            history,
            resolver,
            page_urls: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn history(&self) -> &ClickHistory {
        &self.history
    }

    /// Page URL cached for an in-flight download.
    pub fn page_url_for(&self, id: DownloadId) -> Option<&str> {
        self.page_urls.get(&id).map(String::as_str)
    }

    /// A page reported a user interaction.
    pub fn on_page_click(&mut self, page_url: &str, timestamp: i64) {
        self.history.record_click(page_url, timestamp);
    }

    /// A download started: prune the click history and remember which page it came from.
    pub fn on_download_created(&mut self, item: &DownloadItem, now: i64) -> Option<&str> {
        let pruned = self.history.cleanup(now);
        if pruned > 0 {
            tracing::debug!(pruned, "expired click history entries");
        }

        let page_url = self.resolver.find_page_url(&self.history, &item.url, now)?;
        tracing::info!(download_id = item.id, %page_url, "download attributed to page");
        self.page_urls.insert(item.id, page_url);
        self.page_url_for(item.id)
    }

    /// A download changed state; terminal states release its page mapping.
    pub fn on_download_changed(&mut self, id: DownloadId, state: DownloadState) {
        if state.is_terminal() && self.page_urls.remove(&id).is_some() {
            tracing::debug!(download_id = id, ?state, "released page mapping");
        }
    }

    /// Decide the filename for a download; `None` means keep the browser default.
    pub async fn on_determining_filename(&self, item: &DownloadItem) -> Option<Suggestion> {
        self.on_determining_filename_at(item, Local::now().naive_local())
            .await
    }

    /// As [`Self::on_determining_filename`], expanding rename templates at `now`.
    pub async fn on_determining_filename_at(
        &self,
        item: &DownloadItem,
        now: NaiveDateTime,
    ) -> Option<Suggestion> {
        let enabled = match self.store.load_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                tracing::warn!(download_id = item.id, "could not read enabled flag: {:#}", e);
                return None;
            }
        };
        if !enabled {
            tracing::debug!(download_id = item.id, "routing disabled");
            return None;
        }

        let settings = match self.store.load_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(download_id = item.id, "could not read settings: {:#}", e);
                return None;
            }
        };
        if settings.rules.is_empty() {
            return None;
        }

        let page_url = self.page_url_for(item.id);
        let Some(matched) = resolve_match_at(&settings.rules, item, page_url, now) else {
            tracing::debug!(download_id = item.id, filename = %item.filename, "no rule matched");
            return None;
        };

        tracing::info!(
            download_id = item.id,
            rule_id = %matched.rule.id,
            filename = %matched.suggestion.filename,
            "rule applied"
        );

        let record = MatchRecord {
            download_id: item.id,
            rule_id: matched.rule.id.clone(),
            url: item.url.clone(),
            page_url: page_url.map(str::to_string),
            filename: matched.suggestion.filename.clone(),
            conflict_action: matched.suggestion.conflict_action,
            matched_at: unix_millis(),
        };
        if let Err(e) = self.store.record_match(&record).await {
            tracing::warn!(download_id = item.id, "could not record match: {:#}", e);
        }

        Some(matched.suggestion)
    }

    /// Dispatch one host event. Only filename decisions produce a response.
    pub async fn handle(&mut self, event: HostEvent) -> Option<HostResponse> {
        match event {
            HostEvent::PageClick {
                page_url,
                timestamp,
            } => {
                self.on_page_click(&page_url, timestamp);
                None
            }
            HostEvent::DownloadCreated(item) => {
                self.on_download_created(&item, unix_millis());
                None
            }
            HostEvent::DownloadChanged { id, state } => {
                self.on_download_changed(id, state);
                None
            }
            HostEvent::DeterminingFilename(item) => {
                let suggestion = self.on_determining_filename(&item).await;
                Some(HostResponse {
                    id: item.id,
                    suggestion,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ConflictAction, Rule, RuleCategory, RuleCondition, Settings};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    const NOW: i64 = 1_700_000_000_000;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn router(rules: Vec<Rule>) -> DownloadRouter<MemoryStore> {
        DownloadRouter::new(
            MemoryStore::with_settings(Settings { rules }),
            &DprConfig::default(),
        )
    }

    fn github_rules() -> Vec<Rule> {
        vec![
            Rule::new("gh", RuleCategory::Site, RuleCondition::Extension, "zip", "GitHub")
                .with_site_pattern("github.com")
                .with_priority(1),
            Rule::new("any-zip", RuleCategory::General, RuleCondition::Extension, "zip", "Archives")
                .with_priority(1),
        ]
    }

    #[tokio::test]
    async fn site_rule_uses_page_from_click_history() {
        let mut router = router(github_rules());
        router.on_page_click("https://www.github.com/owner/repo", NOW - 2_000);

        let item = DownloadItem::new(7, "https://codeload.github.com/owner/repo/zip", "repo.zip");
        let page = router.on_download_created(&item, NOW).map(str::to_string);
        assert_eq!(page.as_deref(), Some("https://www.github.com/owner/repo"));

        let s = router.on_determining_filename_at(&item, at()).await.unwrap();
        assert_eq!(s.filename, "GitHub/repo.zip");

        let log = router.store().recent_matches(5).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].rule_id, "gh");
        assert_eq!(log[0].page_url.as_deref(), Some("https://www.github.com/owner/repo"));
    }

    #[tokio::test]
    async fn terminal_state_releases_mapping() {
        let mut router = router(github_rules());
        router.on_page_click("https://github.com/x", NOW - 100);
        let item = DownloadItem::new(1, "https://github.com/x/archive.zip", "archive.zip");
        router.on_download_created(&item, NOW);
        assert!(router.page_url_for(1).is_some());

        router.on_download_changed(1, DownloadState::InProgress);
        assert!(router.page_url_for(1).is_some());

        router.on_download_changed(1, DownloadState::Complete);
        assert!(router.page_url_for(1).is_none());
    }

    #[tokio::test]
    async fn creation_prunes_expired_clicks() {
        let mut router = router(vec![]);
        router.on_page_click("https://old.example.com/", NOW - 31_000);
        router.on_page_click("https://new.example.com/", NOW - 1_000);
        let item = DownloadItem::new(2, "https://files.other.org/a.bin", "a.bin");
        let page = router.on_download_created(&item, NOW).map(str::to_string);
        assert_eq!(router.history().len(), 1);
        assert_eq!(page.as_deref(), Some("https://new.example.com/"));
    }

    #[tokio::test]
    async fn disabled_router_passes_through() {
        let router = router(github_rules());
        router.store().save_enabled(false).await.unwrap();
        let item = DownloadItem::new(3, "https://github.com/a.zip", "a.zip");
        assert!(router.on_determining_filename_at(&item, at()).await.is_none());
        assert!(router.store().recent_matches(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_page_falls_back_to_general_rule() {
        let router = router(github_rules());
        let item = DownloadItem::new(4, "https://downloads.example.net/a.zip", "a.zip");
        let s = router.on_determining_filename_at(&item, at()).await.unwrap();
        assert_eq!(s.filename, "Archives/a.zip");
        assert_eq!(s.conflict_action, ConflictAction::Uniquify);
    }

    #[tokio::test]
    async fn handle_responds_only_to_filename_events() {
        let mut router = router(github_rules());
        let click = HostEvent::PageClick {
            page_url: "https://github.com/".to_string(),
            timestamp: unix_millis(),
        };
        assert!(router.handle(click).await.is_none());

        let item = DownloadItem::new(9, "https://example.org/readme.txt", "readme.txt");
        assert!(router
            .handle(HostEvent::DownloadCreated(item.clone()))
            .await
            .is_none());

        let response = router
            .handle(HostEvent::DeterminingFilename(item))
            .await
            .unwrap();
        assert_eq!(response.id, 9);
        assert!(response.suggestion.is_none());
    }

    #[tokio::test]
    async fn extreme_click_timestamp_from_host_is_pruned() {
        let mut router = router(github_rules());
        let click = crate::protocol::parse_event(
            r#"{"type":"pageClick","pageUrl":"https://github.com/","timestamp":-9223372036854775808}"#,
        )
        .unwrap();
        assert!(router.handle(click).await.is_none());

        let item = DownloadItem::new(10, "https://files.other.org/a.zip", "a.zip");
        assert!(router
            .handle(HostEvent::DownloadCreated(item))
            .await
            .is_none());
        assert!(router.history().is_empty());
        assert!(router.page_url_for(10).is_none());
    }
}
