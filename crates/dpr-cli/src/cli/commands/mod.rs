//! CLI command handlers. Each command is in its own file.

mod completions;
mod history;
mod resolve;
mod rules;
mod serve;
mod toggle;

pub use completions::run_completions;
pub use history::run_history;
pub use resolve::run_resolve;
pub use rules::{
    run_rules_add, run_rules_duplicate, run_rules_list, run_rules_move, run_rules_remove,
    run_rules_update,
};
pub use serve::run_serve;
pub use toggle::run_set_enabled;
