use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that relocates the Housekeeper data directory
pub const HOME_ENV: &str = "HOUSEKEEPER_HOME";

/// Global Housekeeper configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory scanned when no directory is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_root: Option<PathBuf>,

    /// JSON array of extensions to delete
    #[serde(default = "default_delete_rules_path")]
    pub delete_rules_path: PathBuf,

    /// JSON object mapping extension → replacement extension
    #[serde(default = "default_replace_rules_path")]
    pub replace_rules_path: PathBuf,

    /// File-name prefixes that mark a file for deletion (e.g. "._")
    #[serde(default)]
    pub delete_prefixes: Vec<String>,

    /// Rename upper-case extensions to lower-case when no mapping applies
    #[serde(default)]
    pub lowercase_extensions: bool,

    /// Clear the read-only flag before deleting or renaming
    #[serde(default)]
    pub unlock_read_only: bool,

    /// Sample paths shown per change type by `simulate`
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Logging preferences
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Write logs to a daily-rolling file under `log_dir`
    #[serde(default)]
    pub log_to_file: bool,

    /// Directory holding log files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Enable debug-level logs
    #[serde(default)]
    pub debug: bool,

    /// Keep printing to the console when logging to a file
    #[serde(default = "default_true")]
    pub also_print_to_console: bool,
}

fn default_delete_rules_path() -> PathBuf {
    Config::rules_dir().join("extensions_to_delete.json")
}
fn default_replace_rules_path() -> PathBuf {
    Config::rules_dir().join("extension_replacements.json")
}
fn default_sample_limit() -> usize {
    5
}
fn default_log_dir() -> PathBuf {
    Config::logs_dir()
}
fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_dir: default_log_dir(),
            debug: false,
            also_print_to_console: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_root: None,
            delete_rules_path: default_delete_rules_path(),
            replace_rules_path: default_replace_rules_path(),
            delete_prefixes: Vec::new(),
            lowercase_extensions: false,
            unlock_read_only: false,
            sample_limit: default_sample_limit(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Get the Housekeeper data directory ($HOUSEKEEPER_HOME or ~/.housekeeper)
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".housekeeper")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the rule files directory
    pub fn rules_dir() -> PathBuf {
        Self::data_dir().join("rules")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from the default location, or fall back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file, or fall back to defaults if it does not exist
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to a file
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Initialize Housekeeper directories and seed empty rule files
    pub fn init_dirs(&self) -> Result<()> {
        for dir in [Self::data_dir(), Self::rules_dir(), self.logging.log_dir.clone()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let seeds = [
            (&self.delete_rules_path, "[]\n"),
            (&self.replace_rules_path, "{}\n"),
        ];
        for (path, seed) in seeds {
            if !path.exists() {
                std::fs::write(path, seed)
                    .with_context(|| format!("Failed to seed rule file: {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Apply a `config set KEY VALUE` update
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default_root" => {
                self.default_root = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "delete_rules_path" => self.delete_rules_path = PathBuf::from(value),
            "replace_rules_path" => self.replace_rules_path = PathBuf::from(value),
            "delete_prefixes" => {
                self.delete_prefixes = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            "lowercase_extensions" => self.lowercase_extensions = value.parse()?,
            "unlock_read_only" => self.unlock_read_only = value.parse()?,
            "sample_limit" => self.sample_limit = value.parse()?,
            "logging.log_to_file" => self.logging.log_to_file = value.parse()?,
            "logging.log_dir" => self.logging.log_dir = PathBuf::from(value),
            "logging.debug" => self.logging.debug = value.parse()?,
            "logging.also_print_to_console" => {
                self.logging.also_print_to_console = value.parse()?
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }
}
