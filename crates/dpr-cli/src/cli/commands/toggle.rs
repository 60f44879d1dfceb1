//! `dpr enable` / `dpr disable` – flip the global routing switch.

use anyhow::Result;
use dpr_core::store::SettingsStore;

pub async fn run_set_enabled<S: SettingsStore>(store: &S, enabled: bool) -> Result<()> {
    store.save_enabled(enabled).await?;
    tracing::info!(enabled, "routing switch changed");
    println!("Routing {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}
