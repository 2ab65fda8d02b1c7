use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::common::errors::ApplyFailure;
use crate::common::{format, permissions, CancelToken};
use crate::planner::plan::{Change, ChangeKind, Plan};
use crate::scanner::classifier::destination_taken;

/// Per-change outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Skipped,
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Succeeded => write!(f, "succeeded"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// What happened to one change
#[derive(Debug, Clone, Serialize)]
pub struct ChangeResult {
    pub change: Change,
    pub outcome: Outcome,
    /// Set only when `outcome` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ApplyFailure>,
    pub detail: String,
}

impl ChangeResult {
    fn succeeded(change: &Change, detail: impl Into<String>) -> Self {
        Self {
            change: change.clone(),
            outcome: Outcome::Succeeded,
            failure: None,
            detail: detail.into(),
        }
    }

    fn skipped(change: &Change) -> Self {
        Self {
            change: change.clone(),
            outcome: Outcome::Skipped,
            failure: None,
            detail: "not selected".to_string(),
        }
    }

    fn failed(change: &Change, failure: ApplyFailure, detail: impl Into<String>) -> Self {
        Self {
            change: change.clone(),
            outcome: Outcome::Failed,
            failure: Some(failure),
            detail: detail.into(),
        }
    }
}

/// Knobs for one apply run
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub show_progress: bool,
    /// Restore the owner write bit on read-only files before deleting or renaming them
    pub unlock_read_only: bool,
}

/// Report from an apply run
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// One entry per change that was reached, in plan order
    pub results: Vec<ChangeResult>,
    /// Stopped before the end of the plan
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl ApplyReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(Outcome::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChangeResult> {
        self.results.iter().filter(|r| r.outcome == Outcome::Failed)
    }
}

/// Apply the selected changes of `plan`, strictly in plan order.
///
/// One failed change never aborts the batch. Cancellation is checked before
/// each change, so nothing is ever left half-applied. There is no rollback.
pub fn apply(plan: &Plan, options: &ApplyOptions, cancel: &CancelToken) -> ApplyReport {
    let started_at = Utc::now();
    let start = Instant::now();
    let mut results = Vec::with_capacity(plan.len());
    let mut cancelled = false;

    tracing::info!(
        "Applying {} of {} changes",
        plan.selected_count(),
        plan.len()
    );

    let pb = if options.show_progress {
        let pb = ProgressBar::new(plan.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.red} [{bar:40.red/blue}] {pos}/{len} Applying... {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━░"),
        );
        Some(pb)
    } else {
        None
    };

    for change in plan {
        if cancel.is_cancelled() {
            tracing::warn!(
                "Apply cancelled with {} of {} changes processed",
                results.len(),
                plan.len()
            );
            cancelled = true;
            break;
        }

        if let Some(ref pb) = pb {
            pb.set_message(format::truncate(&format::format_path(change.target()), 40));
        }

        let result = if change.selected() {
            apply_change(change, options)
        } else {
            ChangeResult::skipped(change)
        };

        match result.outcome {
            Outcome::Succeeded => tracing::info!("{}: {}", change, result.detail),
            Outcome::Failed => tracing::warn!("{} failed: {}", change, result.detail),
            Outcome::Skipped => tracing::debug!("{} skipped", change),
        }
        results.push(result);

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    ApplyReport {
        results,
        cancelled,
        started_at,
        duration_secs: start.elapsed().as_secs_f64(),
    }
}

fn apply_change(change: &Change, options: &ApplyOptions) -> ChangeResult {
    match change.kind() {
        ChangeKind::DeleteFile => delete_file(change, options),
        ChangeKind::RenameFile { new_name } => rename_file(change, new_name, options),
        ChangeKind::RemoveDir => remove_dir(change),
    }
}

fn delete_file(change: &Change, options: &ApplyOptions) -> ChangeResult {
    let target = change.target();
    if options.unlock_read_only {
        if let Err(result) = unlock_target(change) {
            return result;
        }
    }

    match std::fs::remove_file(target) {
        Ok(()) => ChangeResult::succeeded(change, "deleted"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            ChangeResult::succeeded(change, "already gone")
        }
        Err(e) => failed_with_hint(change, &e, options),
    }
}

fn rename_file(change: &Change, new_name: &Path, options: &ApplyOptions) -> ChangeResult {
    let target = change.target();
    if let Err(e) = std::fs::symlink_metadata(target) {
        return ChangeResult::failed(change, ApplyFailure::from(&e), e.to_string());
    }

    // The tree may have changed since planning
    if destination_taken(target, new_name) {
        return ChangeResult::failed(
            change,
            ApplyFailure::RenameCollision,
            format!("{} already exists", new_name.display()),
        );
    }

    if options.unlock_read_only {
        if let Err(result) = unlock_target(change) {
            return result;
        }
    }

    match std::fs::rename(target, new_name) {
        Ok(()) => ChangeResult::succeeded(change, format!("renamed to {}", new_name.display())),
        Err(e) => failed_with_hint(change, &e, options),
    }
}

/// Failed result for a file change; read-only targets get a pointer to unlocking
fn failed_with_hint(change: &Change, e: &std::io::Error, options: &ApplyOptions) -> ChangeResult {
    let failure = ApplyFailure::from(e);
    let detail = if failure == ApplyFailure::PermissionDenied
        && !options.unlock_read_only
        && permissions::is_read_only(change.target())
    {
        format!("{} (file is read-only; retry with --unlock)", e)
    } else {
        e.to_string()
    };
    ChangeResult::failed(change, failure, detail)
}

fn remove_dir(change: &Change) -> ChangeResult {
    let target = change.target();
    let mut listing = match std::fs::read_dir(target) {
        Ok(listing) => listing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ChangeResult::succeeded(change, "already gone");
        }
        Err(e) => return ChangeResult::failed(change, ApplyFailure::from(&e), e.to_string()),
    };
    if listing.next().is_some() {
        return ChangeResult::failed(
            change,
            ApplyFailure::DirectoryNotEmpty,
            "entries appeared since planning",
        );
    }

    // Non-recursive: a directory that filled up in the meantime is refused by the OS
    match std::fs::remove_dir(target) {
        Ok(()) => ChangeResult::succeeded(change, "removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            ChangeResult::succeeded(change, "already gone")
        }
        Err(e) => ChangeResult::failed(change, ApplyFailure::from(&e), e.to_string()),
    }
}

fn unlock_target(change: &Change) -> Result<(), ChangeResult> {
    match permissions::unlock(change.target()) {
        Ok(true) => {
            tracing::debug!("Unlocked {}", change.target().display());
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ChangeResult::failed(
            change,
            ApplyFailure::from(&e),
            format!("could not unlock: {}", e),
        )),
    }
}
