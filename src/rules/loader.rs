use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::ruleset::RuleConfig;
use crate::common::config::Config;

/// Where to read the two rule documents from
#[derive(Debug, Clone)]
pub struct RuleSources {
    pub delete_rules: PathBuf,
    pub replace_rules: PathBuf,
}

impl RuleSources {
    /// Resolve rule file paths: explicit overrides win over the configured paths
    pub fn resolve(
        config: &Config,
        delete_override: Option<&Path>,
        replace_override: Option<&Path>,
    ) -> Self {
        Self {
            delete_rules: delete_override
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config.delete_rules_path.clone()),
            replace_rules: replace_override
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config.replace_rules_path.clone()),
        }
    }
}

/// Load both rule documents and merge in the rule options from config.
pub fn load_rules(sources: &RuleSources, config: &Config) -> Result<RuleConfig> {
    let extensions_to_delete: Vec<String> = read_json(&sources.delete_rules, "delete rules")?;
    let extension_replacements: BTreeMap<String, String> =
        read_json(&sources.replace_rules, "replacement rules")?;

    tracing::debug!(
        "Loaded {} delete rules from {}, {} replacements from {}",
        extensions_to_delete.len(),
        sources.delete_rules.display(),
        extension_replacements.len(),
        sources.replace_rules.display()
    );

    Ok(RuleConfig {
        extensions_to_delete,
        extension_replacements,
        prefixes_to_delete: config.delete_prefixes.clone(),
        lowercase_extensions: config.lowercase_extensions,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let contents = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read {}: {} (run 'housekeeper config init' to create it)",
            label,
            path.display()
        )
    })?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}: {}", label, path.display()))
}
