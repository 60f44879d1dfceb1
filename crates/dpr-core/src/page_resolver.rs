//! Attribute a download to the page that most likely triggered it.
//!
//! Downloads are often served from a host other than the page the user
//! clicked on (a CDN subdomain, a storage bucket), so the lookup goes through
//! three tiers, first success wins:
//!
//! 1. the newest click whose page shares the download's parent domain
//! 2. the newest click whose page has exactly the download's hostname
//! 3. the newest click overall, but only if it happened within the recency
//!    window
//!
//! When the download URL has no determinable parent domain (e.g. `data:` or
//! `blob:` URLs) the lookup goes straight to tier 3.

use crate::click_history::ClickHistory;
use crate::domain::{extract_domain, extract_parent_domain};

/// Window (ms) within which the newest click is accepted without any domain match.
pub const DEFAULT_RECENT_WINDOW_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageUrlResolver {
    recent_window_ms: i64,
}

impl Default for PageUrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_WINDOW_MS)
    }
}

impl PageUrlResolver {
    pub fn new(recent_window_ms: i64) -> Self {
        Self { recent_window_ms }
    }

    /// Resolve the originating page URL for `download_url`, evaluated at `now` (Unix ms).
    pub fn find_page_url(
        &self,
        history: &ClickHistory,
        download_url: &str,
        now: i64,
    ) -> Option<String> {
        let Some(parent) = extract_parent_domain(download_url) else {
            tracing::debug!(download_url, "no parent domain; trying recent click");
            return self.recent_fallback(history, now);
        };

        if let Some(entry) = history
            .iter()
            .find(|e| extract_parent_domain(&e.page_url).as_deref() == Some(parent.as_str()))
        {
            tracing::debug!(
                download_url,
                page_url = %entry.page_url,
                %parent,
                "parent-domain match"
            );
            return Some(entry.page_url.clone());
        }

        if let Some(domain) = extract_domain(download_url) {
            if let Some(entry) = history
                .iter()
                .find(|e| extract_domain(&e.page_url).as_deref() == Some(domain.as_str()))
            {
                tracing::debug!(
                    download_url,
                    page_url = %entry.page_url,
                    %domain,
                    "exact-domain match"
                );
                return Some(entry.page_url.clone());
            }
        }

        self.recent_fallback(history, now)
    }

    fn recent_fallback(&self, history: &ClickHistory, now: i64) -> Option<String> {
        let recent = history.latest()?;
        if now.saturating_sub(recent.timestamp) < self.recent_window_ms {
            tracing::debug!(page_url = %recent.page_url, "recent-click fallback");
            Some(recent.page_url.clone())
        } else {
            None
        }
    }
}

/// Resolve with the default recency window.
pub fn find_page_url(history: &ClickHistory, download_url: &str, now: i64) -> Option<String> {
    PageUrlResolver::default().find_page_url(history, download_url, now)
}
