//! Download routing rules.
//!
//! A rule says "downloads whose extension / filename / URL contains X go to
//! folder Y", optionally scoped to a site and optionally renaming the file.
//! Rules are ordered by category (`site` before `general`) and then by a
//! per-category priority; the first matching rule decides the destination.
//!
//! The serialized layout uses camelCase keys so settings written by the
//! browser side (`sitePattern`, `overrideFilename`, `renameFilename`) load
//! unchanged.

mod edit;
mod engine;
mod error;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use edit::{
    add_rule, delete_rule, duplicate_rule, move_rule, next_rule_id, normalize_priorities,
    update_rule,
};
pub use engine::{
    final_filename_at, resolve, resolve_match, resolve_match_at, sort_rules, RuleMatch,
};
pub use error::RuleError;

/// Browser-assigned download identifier.
pub type DownloadId = i64;

/// Rule grouping. Site rules are scoped by `site_pattern` and always checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Site,
    General,
}

impl RuleCategory {
    /// Categories in evaluation order.
    pub const ALL: [RuleCategory; 2] = [RuleCategory::Site, RuleCategory::General];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Site => "site",
            RuleCategory::General => "general",
        }
    }

    fn rank(self) -> u8 {
        match self {
            RuleCategory::Site => 0,
            RuleCategory::General => 1,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site" => Ok(RuleCategory::Site),
            "general" => Ok(RuleCategory::General),
            _ => Err(RuleError::InvalidCategory(s.to_string())),
        }
    }
}

/// Which field of the download the rule's pattern is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCondition {
    Extension,
    Filename,
    Url,
}

impl RuleCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleCondition::Extension => "extension",
            RuleCondition::Filename => "filename",
            RuleCondition::Url => "url",
        }
    }
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCondition {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extension" | "ext" => Ok(RuleCondition::Extension),
            "filename" => Ok(RuleCondition::Filename),
            "url" => Ok(RuleCondition::Url),
            _ => Err(RuleError::InvalidCondition(s.to_string())),
        }
    }
}

/// How the browser should handle a name collision at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    /// Append a disambiguating suffix.
    #[default]
    Uniquify,
    Overwrite,
}

impl ConflictAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictAction::Uniquify => "uniquify",
            ConflictAction::Overwrite => "overwrite",
        }
    }

    pub(crate) fn from_db_str(s: &str) -> Self {
        match s {
            "overwrite" => ConflictAction::Overwrite,
            _ => ConflictAction::Uniquify,
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A single routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub category: RuleCategory,
    /// Substring of the download URL or the originating page URL (site rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_pattern: Option<String>,
    pub condition: RuleCondition,
    pub pattern: String,
    /// Destination subfolder relative to the browser's download directory.
    #[serde(default)]
    pub folder: String,
    /// Overwrite an existing file instead of uniquifying the name.
    #[serde(default, skip_serializing_if = "is_false")]
    pub override_filename: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rename: bool,
    /// Rename template, see [`crate::template`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_filename: Option<String>,
    /// Position within the category, 1-based; `None` sorts after every ranked rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        category: RuleCategory,
        condition: RuleCondition,
        pattern: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            site_pattern: None,
            condition,
            pattern: pattern.into(),
            folder: folder.into(),
            override_filename: false,
            rename: false,
            rename_filename: None,
            priority: None,
        }
    }

    pub fn with_site_pattern(mut self, site_pattern: impl Into<String>) -> Self {
        self.site_pattern = Some(site_pattern.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_rename(mut self, template: impl Into<String>) -> Self {
        self.rename = true;
        self.rename_filename = Some(template.into());
        self
    }

    pub fn with_overwrite(mut self) -> Self {
        self.override_filename = true;
        self
    }

    /// Destination folder with trailing slashes removed.
    pub fn folder_path(&self) -> &str {
        self.folder.trim_end_matches('/')
    }

    pub fn conflict_action(&self) -> ConflictAction {
        if self.override_filename {
            ConflictAction::Overwrite
        } else {
            ConflictAction::Uniquify
        }
    }

    /// The rename template, when renaming is on and a template is set.
    pub fn rename_template(&self) -> Option<&str> {
        if !self.rename {
            return None;
        }
        self.rename_filename.as_deref().filter(|t| !t.is_empty())
    }

    /// Sort key within a category.
    pub(crate) fn priority_rank(&self) -> u64 {
        self.priority.map_or(u64::MAX, u64::from)
    }

    /// Check the constraints a rule must satisfy before it is stored.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }
        if self.pattern.trim().is_empty() {
            return Err(RuleError::EmptyPattern);
        }
        if self.category == RuleCategory::Site
            && self.site_pattern.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            return Err(RuleError::MissingSitePattern);
        }
        Ok(())
    }

    /// Trim text fields and drop values that do not apply to this rule's settings.
    pub(crate) fn normalized(mut self) -> Self {
        self.pattern = self.pattern.trim().to_string();
        self.folder = self.folder.trim().to_string();
        self.site_pattern = match self.category {
            RuleCategory::Site => self
                .site_pattern
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            RuleCategory::General => None,
        };
        self.rename_filename = if self.rename {
            self.rename_filename
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        } else {
            None
        };
        self
    }
}

/// The persisted rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Settings {
    pub fn find(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules of one category in priority order.
    pub fn category_rules(&self, category: RuleCategory) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().filter(|r| r.category == category).collect();
        rules.sort_by_key(|r| r.priority_rank());
        rules
    }
}

/// The part of a browser download the rules look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: DownloadId,
    pub url: String,
    #[serde(default)]
    pub filename: String,
}

impl DownloadItem {
    pub fn new(id: DownloadId, url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            filename: filename.into(),
        }
    }
}

/// Where and how to save a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Path relative to the download directory, `folder/name` or just `name`.
    pub filename: String,
    pub conflict_action: ConflictAction,
}
