//! `dpr history` – show recently applied rules.

use anyhow::Result;
use dpr_core::clock::format_local_millis;
use dpr_core::store::SettingsStore;

pub async fn run_history<S: SettingsStore>(store: &S, limit: usize) -> Result<()> {
    let records = store.recent_matches(limit).await?;
    if records.is_empty() {
        println!("No downloads routed yet.");
    } else {
        println!(
            "{:<19} {:<8} {:<15} {:<9} {}",
            "WHEN", "DOWNLOAD", "RULE", "ON CLASH", "PATH"
        );
        for r in records {
            println!(
                "{:<19} {:<8} {:<15} {:<9} {}",
                format_local_millis(r.matched_at),
                r.download_id,
                r.rule_id,
                r.conflict_action.as_str(),
                r.filename
            );
        }
    }
    Ok(())
}
