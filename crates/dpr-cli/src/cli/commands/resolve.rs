//! `dpr resolve <url> <filename>` – dry-run a download against the stored rules.

use anyhow::Result;
use dpr_core::rules::{resolve_match, DownloadItem};
use dpr_core::store::SettingsStore;

pub async fn run_resolve<S: SettingsStore>(
    store: &S,
    url: &str,
    filename: &str,
    page_url: Option<&str>,
) -> Result<()> {
    if !store.load_enabled().await? {
        println!("Routing is disabled; showing what would apply once enabled.");
    }
    let settings = store.load_settings().await?;
    let item = DownloadItem::new(0, url, filename);

    match resolve_match(&settings.rules, &item, page_url) {
        Some(m) => println!(
            "{} -> {} ({}, rule {})",
            filename,
            m.suggestion.filename,
            m.suggestion.conflict_action.as_str(),
            m.rule.id
        ),
        None => println!("No matching rule; the browser default name is kept."),
    }
    Ok(())
}
