use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::planner::ChangeType;

/// Housekeeper: plan and apply extension-based cleanups of a directory tree
#[derive(Parser, Debug)]
#[command(
    name = "housekeeper",
    version,
    about = "Plan and apply extension-based cleanups of a directory tree",
    long_about = "Housekeeper walks a directory, deletes files with denied extensions,\n\
                   renames files whose extension has a replacement, and removes\n\
                   directories left empty. Every run starts with a reviewable plan.",
    after_help = "EXAMPLES:\n  \
        housekeeper plan ~/Downloads                Show the change plan\n  \
        housekeeper simulate ~/Downloads            Dry-run summary\n  \
        housekeeper apply ~/Downloads               Apply after confirmation\n  \
        housekeeper apply . --only delete,rename    Leave empty directories alone\n  \
        housekeeper plan . --format json            Plan as JSON\n  \
        housekeeper rules                           Show the loaded rules\n  \
        housekeeper config set default_root ~/Inbox"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: $HOUSEKEEPER_HOME/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "HOUSEKEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Deny-list JSON file (array of extensions)
    #[arg(long, global = true, value_name = "PATH")]
    pub delete_rules: Option<PathBuf>,

    /// Replacement JSON file (object of extension → extension)
    #[arg(long, global = true, value_name = "PATH")]
    pub replace_rules: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode: minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Also write logs to a daily file under $HOUSEKEEPER_HOME/logs
    #[arg(long, global = true)]
    pub log_file: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and print the change plan without touching anything
    Plan {
        /// Directory to scan (default: config default_root, else the current directory)
        dir: Option<PathBuf>,
    },

    /// Print a dry-run summary of what apply would do
    Simulate {
        /// Directory to scan
        dir: Option<PathBuf>,
    },

    /// Build the plan, confirm, and apply it
    Apply {
        /// Directory to scan
        dir: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Only apply these change kinds (delete, rename, remove-dir)
        #[arg(long, value_delimiter = ',', value_name = "KINDS")]
        only: Option<Vec<ChangeType>>,

        /// Make read-only files writable before deleting or renaming them
        #[arg(long)]
        unlock: bool,
    },

    /// Show the normalized rules
    Rules,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Initialize Housekeeper directories, rule files and default config
    Init,

    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_only_parses_change_kinds() {
        let cli = Cli::parse_from(["housekeeper", "apply", "/tmp/x", "--only", "delete,remove-dir"]);
        match cli.command {
            Commands::Apply { only, dir, .. } => {
                assert_eq!(dir, Some(PathBuf::from("/tmp/x")));
                assert_eq!(
                    only,
                    Some(vec![ChangeType::DeleteFile, ChangeType::RemoveDir])
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
