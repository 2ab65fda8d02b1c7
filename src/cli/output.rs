use colored::*;
use serde::Serialize;

use crate::cleaner::{ApplyReport, Outcome};
use crate::common::errors::ScanError;
use crate::common::format::{self, change_tag, format_relative};
use crate::planner::{BuildOutcome, Simulation};
use crate::rules::RuleSet;

/// Print the plan in human-readable format
pub fn print_plan(outcome: &BuildOutcome) {
    println!();
    println!("{}  Housekeeper Plan", "🧹");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {}  •  scanned {} in {}",
        format::format_path(&outcome.root).bold(),
        format::format_count_plural(outcome.entries_scanned, "entry", "entries").dimmed(),
        format::format_duration(outcome.duration_secs).cyan(),
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if outcome.plan.is_empty() {
        println!("  {} Nothing to do.", "✨");
    }

    for change in &outcome.plan {
        let target = format_relative(change.target(), &outcome.root);
        match change.new_name() {
            Some(new_name) => println!(
                "  {} {} {} {}",
                change_tag(change.change_type()),
                target,
                "→".dimmed(),
                format_relative(new_name, &outcome.root).cyan()
            ),
            None => println!("  {} {}", change_tag(change.change_type()), target),
        }
    }

    print_scan_errors(&outcome.errors);
    if outcome.cancelled {
        println!();
        println!("  {} Scan cancelled: the plan is partial.", "⚠".yellow());
    }

    let counts = outcome.plan.counts();
    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} delete  •  {} rename  •  {} remove dir",
        counts.delete_file.to_string().red(),
        counts.rename_file.to_string().yellow(),
        counts.remove_dir.to_string().magenta(),
    );
    if !outcome.plan.is_empty() {
        println!(
            "  {} Run {} to apply",
            "💡",
            format!("housekeeper apply {}", outcome.root.display()).cyan()
        );
    }
    println!();
}

/// Print recovered scan errors, if any
pub fn print_scan_errors(errors: &[ScanError]) {
    if errors.is_empty() {
        return;
    }
    println!();
    println!(
        "  {} {}",
        "⚠".yellow(),
        format!("{}:", format::format_count(errors.len(), "scan error")).yellow()
    );
    for error in errors.iter().take(20) {
        println!("    {} {}", "→".dimmed(), error.to_string().dimmed());
    }
    if errors.len() > 20 {
        println!(
            "    ... and {} more",
            (errors.len() - 20).to_string().dimmed()
        );
    }
}

/// Print a plan as a one-line summary
pub fn print_plan_quiet(outcome: &BuildOutcome) {
    let counts = outcome.plan.counts();
    println!(
        "{}  {}  {}  {}",
        counts.delete_file,
        counts.rename_file,
        counts.remove_dir,
        outcome.errors.len()
    );
}

/// Print a dry-run summary
pub fn print_simulation(simulation: &Simulation) {
    println!();
    println!("{}  Housekeeper Simulation", "🔍");
    println!("{}", "─".repeat(60).dimmed());
    for line in simulation.summary().lines() {
        println!("  {}", line);
    }
    println!("{}", "─".repeat(60).dimmed());
    println!();
}

pub fn print_simulation_quiet(simulation: &Simulation) {
    println!(
        "{}  {}  {}  {}",
        simulation.counts.delete_file,
        simulation.counts.rename_file,
        simulation.counts.remove_dir,
        simulation.errors.len()
    );
}

/// Print an apply report
pub fn print_apply_report(report: &ApplyReport, verbose: bool) {
    println!();
    for result in &report.results {
        let marker = match result.outcome {
            Outcome::Succeeded => "✓".green(),
            Outcome::Skipped => "-".dimmed(),
            Outcome::Failed => "✗".red(),
        };
        if result.outcome == Outcome::Skipped && !verbose {
            continue;
        }
        println!(
            "  {} {} {}  {}",
            marker,
            change_tag(result.change.change_type()),
            format::format_path(result.change.target()),
            result.detail.dimmed()
        );
    }

    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} {} succeeded  •  {} failed  •  {} skipped  ({})",
        if report.failed() == 0 { "✓".green() } else { "⚠".yellow() },
        report.succeeded().to_string().green(),
        report.failed().to_string().red(),
        report.skipped().to_string().dimmed(),
        format::format_duration(report.duration_secs).cyan(),
    );

    if report.failed() > 0 {
        println!();
        println!("  {} Failures:", "⚠".yellow());
        for (i, result) in report.failures().enumerate().take(10) {
            let kind = result
                .failure
                .map(|f| f.to_string())
                .unwrap_or_default();
            println!(
                "    {} {} ({}): {}",
                format!("{}.", i + 1).dimmed(),
                result.change,
                kind.yellow(),
                result.detail.dimmed()
            );
        }
        if report.failed() > 10 {
            println!(
                "    ... and {} more",
                (report.failed() - 10).to_string().dimmed()
            );
        }
    }
    if report.cancelled {
        println!();
        println!("  {} Cancelled before the end of the plan.", "⚠".yellow());
    }
    println!();
}

pub fn print_apply_quiet(report: &ApplyReport) {
    println!(
        "{}  {}  {}",
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
}

/// Print the normalized rules
pub fn print_rules(rules: &RuleSet) {
    format::print_header("Rules");

    let deny: Vec<&str> = rules.deny_extensions().collect();
    format::print_kv(
        "Delete extensions",
        &if deny.is_empty() { "(none)".to_string() } else { deny.join(", ") },
    );
    let prefixes: Vec<&str> = rules.deny_prefixes().collect();
    format::print_kv(
        "Delete prefixes",
        &if prefixes.is_empty() { "(none)".to_string() } else { prefixes.join(", ") },
    );
    format::print_kv(
        "Lowercase extensions",
        &rules.lowercase_fallback().to_string(),
    );

    println!();
    println!("  {}", "Replacements:".dimmed());
    let mut any = false;
    for (from, to) in rules.rename_map() {
        any = true;
        println!("    {:<12} {} {}", from, "→".dimmed(), to.cyan());
    }
    if !any {
        println!("    (none)");
    }

    let conflicts = rules.conflicts();
    if !conflicts.is_empty() {
        println!();
        println!(
            "  {} Denied and also mapped (delete wins): {}",
            "⚠".yellow(),
            conflicts.join(", ").yellow()
        );
    }
    println!();
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}
