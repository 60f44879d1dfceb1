//! SQLite-backed settings store (sqlx).
//!
//! The database file lives under the XDG state directory:
//! `~/.local/state/dpr/dpr.db`. Settings are stored as JSON values in a small
//! key-value table so the layout matches the browser side key for key.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

use super::{MatchRecord, SettingsStore, ENABLED_KEY, SETTINGS_KEY};
use crate::clock::unix_millis;
use crate::rules::{ConflictAction, Settings};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Default database path: `~/.local/state/dpr/dpr.db`.
    pub fn default_path() -> Result<std::path::PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("dpr")?;
        Ok(xdg_dirs.get_state_home().join("dpr").join("dpr.db"))
    }

    /// Open (or create) the default database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open settings db: {}", path.display()))?;
        let store = SqliteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory database; contents vanish with the store.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = SqliteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS match_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                download_id INTEGER NOT NULL,
                rule_id TEXT NOT NULL,
                url TEXT NOT NULL,
                page_url TEXT,
                filename TEXT NOT NULL,
                conflict_action TEXT NOT NULL,
                matched_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(unix_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl SettingsStore for SqliteStore {
    async fn load_settings(&self) -> Result<Settings> {
        match self.get_value(SETTINGS_KEY).await? {
            Some(json) => serde_json::from_str(&json).context("parse stored settings"),
            None => Ok(Settings::default()),
        }
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings).context("serialize settings")?;
        self.put_value(SETTINGS_KEY, &json).await
    }

    async fn load_enabled(&self) -> Result<bool> {
        match self.get_value(ENABLED_KEY).await? {
            // Anything but an explicit `false` counts as enabled.
            Some(json) => Ok(serde_json::from_str::<bool>(&json).unwrap_or(true)),
            None => Ok(true),
        }
    }

    async fn save_enabled(&self, enabled: bool) -> Result<()> {
        self.put_value(ENABLED_KEY, if enabled { "true" } else { "false" })
            .await
    }

    async fn record_match(&self, record: &MatchRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO match_log (
                download_id, rule_id, url, page_url,
                filename, conflict_action, matched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(record.download_id)
        .bind(&record.rule_id)
        .bind(&record.url)
        .bind(record.page_url.as_deref())
        .bind(&record.filename)
        .bind(record.conflict_action.as_str())
        .bind(record.matched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT download_id, rule_id, url, page_url, filename, conflict_action, matched_at
            FROM match_log
            ORDER BY matched_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let conflict_action: String = row.get("conflict_action");
            out.push(MatchRecord {
                download_id: row.get("download_id"),
                rule_id: row.get("rule_id"),
                url: row.get("url"),
                page_url: row.get("page_url"),
                filename: row.get("filename"),
                conflict_action: ConflictAction::from_db_str(&conflict_action),
                matched_at: row.get("matched_at"),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, RuleCategory, RuleCondition};

    fn record(download_id: i64, matched_at: i64) -> MatchRecord {
        MatchRecord {
            download_id,
            rule_id: "r1".to_string(),
            url: "https://cdn.example.com/a.pdf".to_string(),
            page_url: Some("https://www.example.com/".to_string()),
            filename: "Docs/a.pdf".to_string(),
            conflict_action: ConflictAction::Overwrite,
            matched_at,
        }
    }

    #[test]
    fn sqlite_uri_escapes_special_chars() {
        let uri = path_to_sqlite_uri(Path::new("/tmp/my dir/#1/dpr.db"));
        assert_eq!(uri, "sqlite:///tmp/my%20dir/%231/dpr.db");
    }

    #[tokio::test]
    async fn empty_store_reads_defaults() {
        let store = SqliteStore::open_memory().await.unwrap();
        assert!(store.load_settings().await.unwrap().rules.is_empty());
        assert!(store.load_enabled().await.unwrap());
        assert!(store.recent_matches(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn settings_roundtrip_and_overwrite() {
        let store = SqliteStore::open_memory().await.unwrap();
        let rule = Rule::new("1", RuleCategory::General, RuleCondition::Extension, "pdf", "Docs")
            .with_priority(1);
        let mut settings = Settings { rules: vec![rule] };
        store.save_settings(&settings).await.unwrap();
        assert_eq!(store.load_settings().await.unwrap(), settings);

        settings.rules.clear();
        store.save_settings(&settings).await.unwrap();
        assert!(store.load_settings().await.unwrap().rules.is_empty());
    }

    #[tokio::test]
    async fn enabled_flag_roundtrip() {
        let store = SqliteStore::open_memory().await.unwrap();
        store.save_enabled(false).await.unwrap();
        assert!(!store.load_enabled().await.unwrap());
        store.save_enabled(true).await.unwrap();
        assert!(store.load_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_settings_value_is_an_error() {
        let store = SqliteStore::open_memory().await.unwrap();
        store.put_value(SETTINGS_KEY, "{not json").await.unwrap();
        assert!(store.load_settings().await.is_err());
    }

    #[tokio::test]
    async fn match_log_newest_first_with_limit() {
        let store = SqliteStore::open_memory().await.unwrap();
        store.record_match(&record(1, 100)).await.unwrap();
        store.record_match(&record(2, 300)).await.unwrap();
        store.record_match(&record(3, 200)).await.unwrap();

        let recent = store.recent_matches(2).await.unwrap();
        let ids: Vec<i64> = recent.iter().map(|r| r.download_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(recent[0].conflict_action, ConflictAction::Overwrite);
        assert_eq!(recent[0].page_url.as_deref(), Some("https://www.example.com/"));
    }

    #[tokio::test]
    async fn open_at_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dpr.db");
        {
            let store = SqliteStore::open_at(&path).await.unwrap();
            store.save_enabled(false).await.unwrap();
        }
        let store = SqliteStore::open_at(&path).await.unwrap();
        assert!(!store.load_enabled().await.unwrap());
    }
}
