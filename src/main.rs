use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

use housekeeper::cleaner::{self, ApplyOptions};
use housekeeper::cli::args::{Cli, Commands, CompletionShell, ConfigAction, OutputFormat};
use housekeeper::cli::output;
use housekeeper::common::config::Config;
use housekeeper::common::{format, logging, CancelToken};
use housekeeper::planner::{self, ChangeType, Selection};
use housekeeper::rules::{self, RuleSet, RuleSources};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)?;
    if cli.log_file {
        config.logging.log_to_file = true;
    }
    let _log_guard = logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Plan { ref dir } => cmd_plan(&cli, &config, dir.as_deref()),

        Commands::Simulate { ref dir } => cmd_simulate(&cli, &config, dir.as_deref()),

        Commands::Apply {
            ref dir,
            yes,
            ref only,
            unlock,
        } => cmd_apply(&cli, &config, dir.as_deref(), yes, only.as_deref(), unlock),

        Commands::Rules => cmd_rules(&cli, &config),

        Commands::Config { ref action } => cmd_config(action, config, &config_path),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "housekeeper", &mut std::io::stdout());
            Ok(())
        }
    }
}

// ─── Shared ───────────────────────────────────────────────────────────────────

/// Load rule files (CLI overrides win over config) and normalize them
fn load_rule_set(cli: &Cli, config: &Config) -> Result<RuleSet> {
    let sources = RuleSources::resolve(
        config,
        cli.delete_rules.as_deref(),
        cli.replace_rules.as_deref(),
    );
    let rule_config = rules::load_rules(&sources, config)?;
    let rule_set = RuleSet::from_config(&rule_config).context("Invalid rules")?;
    Ok(rule_set)
}

/// Directory to scan: argument, then config `default_root`, then the current directory
fn resolve_root(dir: Option<&Path>, config: &Config) -> Result<PathBuf> {
    match dir.map(Path::to_path_buf).or_else(|| config.default_root.clone()) {
        Some(path) => Ok(expand_tilde(&path)),
        None => std::env::current_dir().context("Failed to read the current directory"),
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if s == "~" || s.starts_with("~/") {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(s.trim_start_matches('~').trim_start_matches('/'))
    } else {
        path.to_path_buf()
    }
}

// ─── Plan ─────────────────────────────────────────────────────────────────────

fn cmd_plan(cli: &Cli, config: &Config, dir: Option<&Path>) -> Result<()> {
    let rules = load_rule_set(cli, config)?;
    let root = resolve_root(dir, config)?;

    let outcome = planner::build_plan(&root, &rules, &CancelToken::new())?;

    match cli.format {
        OutputFormat::Human if cli.quiet => output::print_plan_quiet(&outcome),
        OutputFormat::Human => output::print_plan(&outcome),
        OutputFormat::Json => output::print_json(&outcome),
        OutputFormat::Quiet => output::print_plan_quiet(&outcome),
    }

    Ok(())
}

// ─── Simulate ─────────────────────────────────────────────────────────────────

fn cmd_simulate(cli: &Cli, config: &Config, dir: Option<&Path>) -> Result<()> {
    let rules = load_rule_set(cli, config)?;
    let root = resolve_root(dir, config)?;

    let simulation = planner::simulate(&root, &rules, &CancelToken::new(), config.sample_limit)?;

    match cli.format {
        OutputFormat::Human if cli.quiet => output::print_simulation_quiet(&simulation),
        OutputFormat::Human => output::print_simulation(&simulation),
        OutputFormat::Json => output::print_json(&simulation),
        OutputFormat::Quiet => output::print_simulation_quiet(&simulation),
    }

    Ok(())
}

// ─── Apply ────────────────────────────────────────────────────────────────────

fn cmd_apply(
    cli: &Cli,
    config: &Config,
    dir: Option<&Path>,
    yes: bool,
    only: Option<&[ChangeType]>,
    unlock: bool,
) -> Result<()> {
    let human = matches!(cli.format, OutputFormat::Human) && !cli.quiet;
    if !yes && !human {
        anyhow::bail!("Refusing to apply without confirmation: pass --yes with --format json/quiet");
    }

    let rules = load_rule_set(cli, config)?;
    let root = resolve_root(dir, config)?;
    let cancel = CancelToken::new();

    let outcome = planner::build_plan(&root, &rules, &cancel)?;
    let plan = match only {
        Some(types) => outcome
            .plan
            .with_selection(&Selection::only_types(&outcome.plan, types)),
        None => outcome.plan.clone(),
    };

    if human {
        output::print_plan(&outcome);
    }

    let selected = plan.selected_count();
    if selected == 0 {
        if human {
            println!("  {} Nothing to apply.", "✓".green());
            println!();
        }
        return Ok(());
    }

    // Confirm unless --yes
    if !yes {
        print!(
            "  {} Apply {} in {}? [y/N] ",
            "❓",
            format::format_count(selected, "change"),
            format::format_path(&outcome.root)
        );
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("  {} Cancelled", "✗".red());
            return Ok(());
        }
    }

    let options = ApplyOptions {
        show_progress: human,
        unlock_read_only: unlock || config.unlock_read_only,
    };
    let report = cleaner::apply(&plan, &options, &cancel);

    match cli.format {
        OutputFormat::Human if cli.quiet => output::print_apply_quiet(&report),
        OutputFormat::Human => output::print_apply_report(&report, cli.verbose),
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Quiet => output::print_apply_quiet(&report),
    }

    Ok(())
}

// ─── Rules ────────────────────────────────────────────────────────────────────

fn cmd_rules(cli: &Cli, config: &Config) -> Result<()> {
    let rules = load_rule_set(cli, config)?;

    match cli.format {
        OutputFormat::Json => output::print_json(&rules),
        OutputFormat::Human | OutputFormat::Quiet => output::print_rules(&rules),
    }

    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction, mut config: Config, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Init => {
            config.save_to(config_path)?;
            config.init_dirs()?;
            println!(
                "  {} Housekeeper initialized at {}",
                "✓".green(),
                format::format_path(&Config::data_dir())
            );
            println!("  Created: config.toml, rules/, logs/");
            Ok(())
        }
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save_to(config_path)?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            config.save_to(config_path)?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}
