//! JSON-lines protocol spoken by `dpr serve`.
//!
//! Each input line is one browser event tagged by `type`; only
//! `determiningFilename` gets an answer line, carrying either a suggestion or
//! `null` (keep the browser default).
//!
//! ```text
//! {"type":"pageClick","pageUrl":"https://github.com/o/r","timestamp":1700000000000}
//! {"type":"downloadCreated","id":7,"url":"https://codeload.github.com/o/r/zip","filename":""}
//! {"type":"determiningFilename","id":7,"url":"https://codeload.github.com/o/r/zip","filename":"r.zip"}
//! {"type":"downloadChanged","id":7,"state":"complete"}
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::router::DownloadState;
use crate::rules::{DownloadId, DownloadItem, Suggestion};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    PageClick { page_url: String, timestamp: i64 },
    DownloadCreated(DownloadItem),
    DownloadChanged { id: DownloadId, state: DownloadState },
    DeterminingFilename(DownloadItem),
}

/// Answer to a `determiningFilename` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResponse {
    pub id: DownloadId,
    pub suggestion: Option<Suggestion>,
}

/// Parse one protocol line.
pub fn parse_event(line: &str) -> Result<HostEvent> {
    serde_json::from_str(line.trim()).with_context(|| format!("invalid host event: {line}"))
}

/// Encode a response as a single line (no trailing newline).
pub fn encode_response(response: &HostResponse) -> Result<String> {
    serde_json::to_string(response).context("serialize host response")
}
