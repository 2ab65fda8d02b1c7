use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::common::errors::HousekeeperError;

/// Rule data as decoded from configuration, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Extensions whose files are deleted
    #[serde(default)]
    pub extensions_to_delete: Vec<String>,

    /// Extension → replacement extension
    #[serde(default)]
    pub extension_replacements: BTreeMap<String, String>,

    /// File-name prefixes whose files are deleted
    #[serde(default)]
    pub prefixes_to_delete: Vec<String>,

    /// Lower-case upper-case extensions that have no explicit mapping
    #[serde(default)]
    pub lowercase_extensions: bool,
}

/// Normalized, read-only classification rules for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    deny_extensions: BTreeSet<String>,
    rename_map: BTreeMap<String, String>,
    deny_prefixes: Vec<String>,
    lowercase_fallback: bool,
}

impl RuleSet {
    /// Build a rule set from raw deny and rename entries.
    ///
    /// Extensions are trimmed, lower-cased and given exactly one leading dot.
    /// Empty entries and entries with path separators are rejected.
    pub fn normalize<D, R, K, V>(deny: D, rename: R) -> Result<Self, HousekeeperError>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let deny_extensions = deny
            .into_iter()
            .map(|raw| normalize_match_extension(raw.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut rename_map = BTreeMap::new();
        for (from, to) in rename {
            let from_raw = from.as_ref();
            let key = normalize_match_extension(from_raw)?;
            let value = normalize_extension(to.as_ref())?;
            if let Some(existing) = rename_map.get(&key) {
                if existing != &value {
                    return Err(HousekeeperError::invalid_config(
                        from_raw,
                        format!("maps to both '{}' and '{}'", existing, value),
                    ));
                }
            }
            rename_map.insert(key, value);
        }

        let rules = RuleSet {
            deny_extensions,
            rename_map,
            deny_prefixes: Vec::new(),
            lowercase_fallback: false,
        };

        for ext in rules.conflicts() {
            tracing::warn!("Extension {} is both denied and renamed; delete wins", ext);
        }
        Ok(rules)
    }

    /// Build a rule set from decoded configuration, including the optional rules.
    pub fn from_config(config: &RuleConfig) -> Result<Self, HousekeeperError> {
        Ok(Self::normalize(&config.extensions_to_delete, &config.extension_replacements)?
            .with_delete_prefixes(&config.prefixes_to_delete)?
            .with_lowercase_fallback(config.lowercase_extensions))
    }

    /// Add file-name prefixes that mark files for deletion (matched case-insensitively).
    pub fn with_delete_prefixes<I>(mut self, prefixes: I) -> Result<Self, HousekeeperError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for raw in prefixes {
            let raw = raw.as_ref();
            let prefix = raw.trim();
            if prefix.is_empty() {
                return Err(HousekeeperError::invalid_config(raw, "empty prefix"));
            }
            if prefix.contains(['/', '\\']) {
                return Err(HousekeeperError::invalid_config(
                    raw,
                    "contains a path separator",
                ));
            }
            let prefix = prefix.to_lowercase();
            if !self.deny_prefixes.contains(&prefix) {
                self.deny_prefixes.push(prefix);
            }
        }
        Ok(self)
    }

    /// Enable renaming `NAME.JPG` → `NAME.jpg` when no mapping applies.
    pub fn with_lowercase_fallback(mut self, enabled: bool) -> Self {
        self.lowercase_fallback = enabled;
        self
    }

    /// Whether a normalized extension is on the deny list
    pub fn is_denied(&self, ext: &str) -> bool {
        self.deny_extensions.contains(ext)
    }

    /// Whether a file name starts with a deny prefix
    pub fn has_denied_prefix(&self, file_name: &str) -> bool {
        if self.deny_prefixes.is_empty() {
            return false;
        }
        let lower = file_name.to_lowercase();
        self.deny_prefixes.iter().any(|p| lower.starts_with(p.as_str()))
    }

    /// Replacement extension for a normalized extension
    pub fn rename_target(&self, ext: &str) -> Option<&str> {
        self.rename_map.get(ext).map(String::as_str)
    }

    pub fn lowercase_fallback(&self) -> bool {
        self.lowercase_fallback
    }

    pub fn deny_extensions(&self) -> impl Iterator<Item = &str> {
        self.deny_extensions.iter().map(String::as_str)
    }

    pub fn rename_map(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rename_map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn deny_prefixes(&self) -> impl Iterator<Item = &str> {
        self.deny_prefixes.iter().map(String::as_str)
    }

    /// Extensions that are both denied and renamed
    pub fn conflicts(&self) -> Vec<&str> {
        self.rename_map
            .keys()
            .filter(|k| self.deny_extensions.contains(*k))
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deny_extensions.is_empty()
            && self.rename_map.is_empty()
            && self.deny_prefixes.is_empty()
            && !self.lowercase_fallback
    }
}

/// Normalize one raw extension to lower-case, single-leading-dot form.
pub fn normalize_extension(raw: &str) -> Result<String, HousekeeperError> {
    let trimmed = raw.trim();
    if trimmed.contains(['/', '\\']) {
        return Err(HousekeeperError::invalid_config(
            raw,
            "contains a path separator",
        ));
    }
    let bare = trimmed.trim_start_matches('.');
    if bare.is_empty() {
        return Err(HousekeeperError::invalid_config(raw, "empty extension"));
    }
    Ok(format!(".{}", bare.to_lowercase()))
}

/// Normalize an extension that is matched against files.
///
/// Only the last dot-separated part of a name is its extension, so a rule
/// like `.tar.gz` could never match and is rejected.
fn normalize_match_extension(raw: &str) -> Result<String, HousekeeperError> {
    let ext = normalize_extension(raw)?;
    if ext[1..].contains('.') {
        return Err(HousekeeperError::invalid_config(
            raw,
            "has an inner dot; only the last extension of a name can match",
        ));
    }
    Ok(ext)
}
