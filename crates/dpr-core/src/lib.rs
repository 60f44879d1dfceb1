pub mod config;
pub mod logging;

pub mod click_history;
pub mod clock;
pub mod domain;
pub mod page_resolver;
pub mod protocol;
pub mod router;
pub mod rules;
pub mod store;
pub mod template;
