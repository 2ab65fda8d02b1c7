use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::plan::{Change, ChangeType, Plan};
use crate::common::errors::{CollisionReason, HousekeeperError, ScanError};
use crate::common::{safety, CancelToken};
use crate::rules::RuleSet;
use crate::scanner::{classify, DirectoryWalker, Entry};

/// Result of one plan-building pass
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    /// Scan root the plan was built for
    pub root: PathBuf,

    /// Ordered changes (partial if cancelled)
    pub plan: Plan,

    /// Unreadable subtrees and dropped rename candidates
    pub errors: Vec<ScanError>,

    /// The scan was stopped before the walk finished
    pub cancelled: bool,

    /// Files and directories visited
    pub entries_scanned: usize,

    pub duration_secs: f64,
}

/// What remains of a directory once its children's fates are known
#[derive(Debug, Default)]
struct DirTally {
    remaining_files: usize,
    surviving_subdirs: usize,
    /// A read error touched this directory, so its contents are not fully known
    blocked: bool,
}

impl DirTally {
    fn is_empty_after_plan(&self) -> bool {
        !self.blocked && self.remaining_files == 0 && self.surviving_subdirs == 0
    }
}

/// Check the scan root before any traversal and return its absolute form
pub fn validate_root(root: &Path) -> Result<PathBuf, HousekeeperError> {
    let absolute = std::path::absolute(root)
        .map_err(|e| HousekeeperError::invalid_root(root, e.to_string()))?;

    let metadata = std::fs::metadata(&absolute)
        .map_err(|e| HousekeeperError::invalid_root(&absolute, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(HousekeeperError::invalid_root(&absolute, "not a directory"));
    }
    if safety::is_protected(&absolute) {
        return Err(HousekeeperError::invalid_root(
            &absolute,
            "refusing to scan a protected system path",
        ));
    }
    Ok(absolute)
}

/// Build the change plan for `root` without touching the filesystem.
///
/// One post-order walk drives everything: files are classified as they are
/// seen and tallied against their parent, and each directory is judged once
/// all of its children have been. Only an invalid root is fatal; read
/// failures and rename collisions are collected in `errors`.
pub fn build_plan(
    root: &Path,
    rules: &RuleSet,
    cancel: &CancelToken,
) -> Result<BuildOutcome, HousekeeperError> {
    build_plan_observed(root, rules, cancel, |_| {})
}

/// `build_plan` with a callback run on every entry read from the walk
fn build_plan_observed(
    root: &Path,
    rules: &RuleSet,
    cancel: &CancelToken,
    mut on_entry: impl FnMut(&Entry),
) -> Result<BuildOutcome, HousekeeperError> {
    let start = Instant::now();
    let root = validate_root(root)?;
    tracing::info!("Building plan for {}", root.display());

    let mut plan = Plan::new();
    let mut errors = Vec::new();
    let mut cancelled = false;
    let mut entries_scanned = 0usize;

    let mut tallies: HashMap<PathBuf, DirTally> = HashMap::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut removal_disabled = false;

    for item in DirectoryWalker::new(&root).walk() {
        if cancel.is_cancelled() {
            tracing::warn!("Plan building cancelled after {} entries", entries_scanned);
            cancelled = true;
            break;
        }

        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                match err.path() {
                    Some(path) => {
                        tallies.entry(path.to_path_buf()).or_default().blocked = true;
                        if let Some(parent) = path.parent() {
                            tallies.entry(parent.to_path_buf()).or_default().blocked = true;
                        }
                    }
                    None => {
                        tracing::warn!("Read error at an unknown location; directory removal disabled");
                        removal_disabled = true;
                    }
                }
                let scan_error = err.into_scan_error(&root);
                tracing::warn!("Scan error: {}", scan_error);
                errors.push(scan_error);
                continue;
            }
        };
        entries_scanned += 1;
        on_entry(&entry);

        let parent = parent_of(&entry, &root);
        if entry.is_dir() {
            let tally = tallies.remove(entry.path()).unwrap_or_default();
            if !removal_disabled && tally.is_empty_after_plan() {
                plan.push(Change::remove_dir(entry.path()));
            } else {
                tallies.entry(parent).or_default().surviving_subdirs += 1;
            }
            continue;
        }

        let file_stays = match classify(&entry, rules) {
            None => true,
            Some(classification) => {
                let change = classification.change;
                match change.change_type() {
                    ChangeType::DeleteFile => {
                        plan.push(change);
                        false
                    }
                    ChangeType::RenameFile => {
                        let new_name = change.new_name().map(Path::to_path_buf).unwrap_or_default();
                        let reason = if classification.collides {
                            Some(CollisionReason::ExistingEntry)
                        } else if claimed.contains(&new_name) {
                            Some(CollisionReason::EarlierRename)
                        } else {
                            None
                        };
                        match reason {
                            Some(reason) => {
                                let scan_error =
                                    ScanError::rename_collision(change.target(), new_name, reason);
                                tracing::warn!("Dropping rename: {}", scan_error);
                                errors.push(scan_error);
                            }
                            None => {
                                claimed.insert(new_name);
                                plan.push(change);
                            }
                        }
                        true
                    }
                    ChangeType::RemoveDir => true,
                }
            }
        };

        if file_stays {
            tallies.entry(parent).or_default().remaining_files += 1;
        }
    }

    let counts = plan.counts();
    tracing::info!(
        "Plan ready: {} deletes, {} renames, {} directory removals, {} errors",
        counts.delete_file,
        counts.rename_file,
        counts.remove_dir,
        errors.len()
    );

    Ok(BuildOutcome {
        root,
        plan,
        errors,
        cancelled,
        entries_scanned,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}

fn parent_of(entry: &Entry, root: &Path) -> PathBuf {
    entry
        .path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf())
}
