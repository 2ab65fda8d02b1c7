pub mod loader;
pub mod ruleset;

pub use loader::{load_rules, RuleSources};
pub use ruleset::{normalize_extension, RuleConfig, RuleSet};
