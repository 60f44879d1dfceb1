//! CLI for the DPR download path router.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use dpr_core::config;
use dpr_core::rules::{Rule, RuleCategory, RuleCondition};
use dpr_core::store::SqliteStore;

use commands::{
    run_completions, run_history, run_resolve, run_rules_add, run_rules_duplicate,
    run_rules_list, run_rules_move, run_rules_remove, run_rules_update, run_serve,
    run_set_enabled,
};

/// Top-level CLI for the DPR download path router.
#[derive(Debug, Parser)]
#[command(name = "dpr")]
#[command(about = "DPR: route browser downloads into folders by rule", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Answer browser download events as JSON lines on stdin/stdout.
    Serve,

    /// Show where a download would be routed, without touching the match log.
    Resolve {
        /// Download URL.
        url: String,
        /// Filename the browser proposed.
        filename: String,
        /// Page the download was started from, for site rules.
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,
    },

    /// List and edit routing rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Turn routing on.
    Enable,

    /// Turn routing off; every download keeps the browser default.
    Disable,

    /// Show recently applied rules.
    History {
        /// Number of entries to show.
        #[arg(long, default_value = "20", value_name = "N")]
        limit: usize,
    },

    /// Print a shell completion script to stdout.
    Completions {
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List rules in evaluation order.
    List,

    /// Add a rule at the top of its category.
    Add(RuleArgs),

    /// Replace an existing rule's fields.
    Update {
        /// Rule identifier.
        id: String,
        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Remove a rule by ID.
    Remove {
        /// Rule identifier.
        id: String,
    },

    /// Copy a rule to the top of its category under a new ID.
    Duplicate {
        /// Rule identifier.
        id: String,
    },

    /// Move a rule within its category (1-based positions as shown by `rules list`).
    Move {
        /// "site" or "general".
        category: RuleCategory,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        from: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        to: u32,
    },
}

/// Rule fields shared by `rules add` and `rules update`.
#[derive(Debug, Clone, Args)]
pub struct RuleArgs {
    /// "site" or "general".
    #[arg(long, default_value = "general")]
    pub category: RuleCategory,

    /// Substring of the download or page URL; required for site rules.
    #[arg(long = "site", value_name = "PATTERN")]
    pub site_pattern: Option<String>,

    /// What the pattern is tested against: ext, filename or url.
    #[arg(long)]
    pub condition: RuleCondition,

    /// Extension, or substring of the filename or URL.
    #[arg(long)]
    pub pattern: String,

    /// Destination folder relative to the download directory.
    #[arg(long, default_value = "")]
    pub folder: String,

    /// Overwrite an existing file instead of picking a unique name.
    #[arg(long)]
    pub overwrite: bool,

    /// Rename template, e.g. "[date]-[filename]".
    #[arg(long, value_name = "TEMPLATE")]
    pub rename: Option<String>,
}

impl RuleArgs {
    pub fn into_rule(self, id: impl Into<String>) -> Rule {
        let mut rule = Rule::new(id, self.category, self.condition, self.pattern, self.folder);
        if let Some(site) = self.site_pattern {
            rule = rule.with_site_pattern(site);
        }
        if let Some(template) = self.rename {
            rule = rule.with_rename(template);
        }
        if self.overwrite {
            rule = rule.with_overwrite();
        }
        rule
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = match &cfg.database_path {
            Some(path) => SqliteStore::open_at(path).await?,
            None => SqliteStore::open_default().await?,
        };

        match cli.command {
            CliCommand::Serve => run_serve(store, &cfg).await?,
            CliCommand::Resolve {
                url,
                filename,
                page_url,
            } => run_resolve(&store, &url, &filename, page_url.as_deref()).await?,
            CliCommand::Rules { command } => match command {
                RulesCommand::List => run_rules_list(&store).await?,
                RulesCommand::Add(args) => run_rules_add(&store, args).await?,
                RulesCommand::Update { id, rule } => run_rules_update(&store, &id, rule).await?,
                RulesCommand::Remove { id } => run_rules_remove(&store, &id).await?,
                RulesCommand::Duplicate { id } => run_rules_duplicate(&store, &id).await?,
                RulesCommand::Move { category, from, to } => {
                    run_rules_move(&store, category, from as usize - 1, to as usize - 1).await?
                }
            },
            CliCommand::Enable => run_set_enabled(&store, true).await?,
            CliCommand::Disable => run_set_enabled(&store, false).await?,
            CliCommand::History { limit } => run_history(&store, limit).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
