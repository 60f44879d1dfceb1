//! Short-lived log of page interactions.
//!
//! Every click reported by a page is prepended here so that a download
//! starting shortly afterwards can be attributed to the page that triggered
//! it. The log is bounded in size and pruned by age, but pruning only happens
//! when `cleanup` is called (the router does so on each new download).

use std::collections::VecDeque;

/// Maximum number of entries kept; the oldest entry is dropped beyond this.
pub const DEFAULT_CAPACITY: usize = 50;

/// Entries older than this (in milliseconds) are removed by `cleanup`.
pub const DEFAULT_TTL_MS: i64 = 30_000;

/// A single page interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickHistoryEntry {
    pub page_url: String,
    /// Unix milliseconds at which the page reported the interaction.
    pub timestamp: i64,
}

/// Most-recent-first log of page interactions.
#[derive(Debug, Clone)]
pub struct ClickHistory {
    entries: VecDeque<ClickHistoryEntry>,
    capacity: usize,
    ttl_ms: i64,
}

impl Default for ClickHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL_MS)
    }
}

impl ClickHistory {
    pub fn new(capacity: usize, ttl_ms: i64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            ttl_ms,
        }
    }

    /// Record a page interaction as the newest entry.
    pub fn record_click(&mut self, page_url: impl Into<String>, timestamp: i64) {
        self.entries.push_front(ClickHistoryEntry {
            page_url: page_url.into(),
            timestamp,
        });
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Remove every entry whose age at `now` has reached the TTL.
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl_ms;
        self.entries.retain(|e| now.saturating_sub(e.timestamp) < ttl);
        before - self.entries.len()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ClickHistoryEntry> + '_ {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ClickHistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
