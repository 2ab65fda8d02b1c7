use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::builder::{build_plan, BuildOutcome};
use super::plan::{ChangeCounts, ChangeType};
use crate::common::errors::{HousekeeperError, ScanError};
use crate::common::format;
use crate::common::CancelToken;
use crate::rules::RuleSet;

/// Dry-run statistics derived from a plan
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub root: PathBuf,
    pub counts: ChangeCounts,
    /// Up to `sample_limit` example paths per change type, in plan order
    pub samples: BTreeMap<ChangeType, Vec<String>>,
    pub errors: Vec<ScanError>,
    pub cancelled: bool,
    pub entries_scanned: usize,
    pub duration_secs: f64,
}

/// Run the plan builder only and summarize what a real run would do.
///
/// Shares the walker, classifier and builder with the real path, so the
/// counts always agree with `build_plan` on the same tree.
pub fn simulate(
    root: &Path,
    rules: &RuleSet,
    cancel: &CancelToken,
    sample_limit: usize,
) -> Result<Simulation, HousekeeperError> {
    let outcome = build_plan(root, rules, cancel)?;
    Ok(Simulation::from_outcome(&outcome, sample_limit))
}

impl Simulation {
    pub fn from_outcome(outcome: &BuildOutcome, sample_limit: usize) -> Self {
        let mut samples: BTreeMap<ChangeType, Vec<String>> = BTreeMap::new();
        for change in &outcome.plan {
            let bucket = samples.entry(change.change_type()).or_default();
            if bucket.len() >= sample_limit {
                continue;
            }
            let target = format::format_relative(change.target(), &outcome.root);
            let line = match change.new_name() {
                Some(new_name) => format!(
                    "{} → {}",
                    target,
                    format::format_relative(new_name, &outcome.root)
                ),
                None => target,
            };
            bucket.push(line);
        }

        Self {
            root: outcome.root.clone(),
            counts: outcome.plan.counts(),
            samples,
            errors: outcome.errors.clone(),
            cancelled: outcome.cancelled,
            entries_scanned: outcome.entries_scanned,
            duration_secs: outcome.duration_secs,
        }
    }

    /// Plain-text summary
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        writeln!(out, "Scanning directory: {}", self.root.display())?;
        writeln!(
            out,
            "Scanned {} in {}",
            format::format_count_plural(self.entries_scanned, "entry", "entries"),
            format::format_duration(self.duration_secs)
        )?;

        for change_type in ChangeType::ALL {
            let count = self.counts.get(change_type);
            let line = match change_type {
                ChangeType::DeleteFile => format!("Would delete {}", format::format_count(count, "file")),
                ChangeType::RenameFile => format!("Would rename {}", format::format_count(count, "file")),
                ChangeType::RemoveDir => format!(
                    "Would remove {}",
                    format::format_count_plural(count, "empty directory", "empty directories")
                ),
            };
            writeln!(out, "{}", line)?;
            for sample in self.samples.get(&change_type).into_iter().flatten() {
                writeln!(out, "  - {}", sample)?;
            }
            if count > self.samples.get(&change_type).map_or(0, Vec::len) {
                writeln!(out, "  ...")?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(out, "{}", format::format_count(self.errors.len(), "scan error"))?;
            for error in &self.errors {
                writeln!(out, "  ! {}", error)?;
            }
        }
        if self.cancelled {
            writeln!(out, "Scan cancelled: summary is partial")?;
        }
        writeln!(out, "No changes made (dry run)")?;

        f.write_str(&out)
    }
}
