//! `dpr rules ...` – list and edit routing rules.

use anyhow::Result;
use dpr_core::clock::unix_millis;
use dpr_core::rules::{
    add_rule, delete_rule, duplicate_rule, move_rule, next_rule_id, update_rule, Rule,
    RuleCategory,
};
use dpr_core::store::SettingsStore;

use crate::cli::RuleArgs;

fn describe_target(rule: &Rule) -> String {
    let folder = match rule.folder_path() {
        "" => ".",
        f => f,
    };
    match rule.rename_template() {
        Some(template) => format!("{folder}/{template}"),
        None => format!("{folder}/"),
    }
}

pub async fn run_rules_list<S: SettingsStore>(store: &S) -> Result<()> {
    let settings = store.load_settings().await?;
    if settings.rules.is_empty() {
        println!("No rules configured.");
        return Ok(());
    }

    println!(
        "{:<8} {:<4} {:<15} {:<18} {:<9} {:<12} {}",
        "CATEGORY", "POS", "ID", "SITE", "CONDITION", "PATTERN", "TARGET"
    );
    for category in RuleCategory::ALL {
        for (pos, rule) in settings.category_rules(category).into_iter().enumerate() {
            let mut target = describe_target(rule);
            if rule.override_filename {
                target.push_str(" (overwrite)");
            }
            println!(
                "{:<8} {:<4} {:<15} {:<18} {:<9} {:<12} {}",
                category,
                pos + 1,
                rule.id,
                rule.site_pattern.as_deref().unwrap_or("-"),
                rule.condition.as_str(),
                rule.pattern,
                target
            );
        }
    }
    Ok(())
}

pub async fn run_rules_add<S: SettingsStore>(store: &S, args: RuleArgs) -> Result<()> {
    let mut settings = store.load_settings().await?;
    let id = next_rule_id(&settings, unix_millis());
    let id = add_rule(&mut settings, args.into_rule(id))?;
    store.save_settings(&settings).await?;
    println!("Added rule {id}");
    Ok(())
}

pub async fn run_rules_update<S: SettingsStore>(store: &S, id: &str, args: RuleArgs) -> Result<()> {
    let mut settings = store.load_settings().await?;
    update_rule(&mut settings, args.into_rule(id))?;
    store.save_settings(&settings).await?;
    println!("Updated rule {id}");
    Ok(())
}

pub async fn run_rules_remove<S: SettingsStore>(store: &S, id: &str) -> Result<()> {
    let mut settings = store.load_settings().await?;
    let removed = delete_rule(&mut settings, id)?;
    store.save_settings(&settings).await?;
    println!(
        "Removed rule {} ({} {} \"{}\")",
        removed.id, removed.category, removed.condition, removed.pattern
    );
    Ok(())
}

pub async fn run_rules_duplicate<S: SettingsStore>(store: &S, id: &str) -> Result<()> {
    let mut settings = store.load_settings().await?;
    let new_id = next_rule_id(&settings, unix_millis());
    let new_id = duplicate_rule(&mut settings, id, new_id)?;
    store.save_settings(&settings).await?;
    println!("Duplicated rule {id} as {new_id}");
    Ok(())
}

/// `from` and `to` are 0-based.
pub async fn run_rules_move<S: SettingsStore>(
    store: &S,
    category: RuleCategory,
    from: usize,
    to: usize,
) -> Result<()> {
    let mut settings = store.load_settings().await?;
    move_rule(&mut settings, category, from, to)?;
    store.save_settings(&settings).await?;
    println!("Moved {category} rule from position {} to {}", from + 1, to + 1);
    Ok(())
}
