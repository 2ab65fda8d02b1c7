use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::selection::Selection;

/// The three kinds of change a plan can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    DeleteFile,
    RenameFile,
    RemoveDir,
}

impl ChangeType {
    pub const ALL: [ChangeType; 3] = [
        ChangeType::DeleteFile,
        ChangeType::RenameFile,
        ChangeType::RemoveDir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::DeleteFile => "delete_file",
            ChangeType::RenameFile => "rename_file",
            ChangeType::RemoveDir => "remove_dir",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "delete_file" | "delete" => Ok(ChangeType::DeleteFile),
            "rename_file" | "rename" => Ok(ChangeType::RenameFile),
            "remove_dir" | "rmdir" => Ok(ChangeType::RemoveDir),
            other => Err(format!("unknown change type '{}'", other)),
        }
    }
}

/// What a change does. The rename variant carries the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    DeleteFile,
    RenameFile { new_name: PathBuf },
    RemoveDir,
}

/// One proposed filesystem mutation.
///
/// Everything except `selected` is fixed at construction. Renames always
/// stay in the target's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChangeRecord", into = "ChangeRecord")]
pub struct Change {
    kind: ChangeKind,
    target: PathBuf,
    selected: bool,
}

impl Change {
    pub fn delete_file(target: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::DeleteFile,
            target: target.into(),
            selected: true,
        }
    }

    /// Rename `target` to `new_file_name` inside the same directory.
    pub fn rename_file(target: impl Into<PathBuf>, new_file_name: impl AsRef<OsStr>) -> Self {
        let target = target.into();
        let new_name = target.with_file_name(new_file_name);
        Self {
            kind: ChangeKind::RenameFile { new_name },
            target,
            selected: true,
        }
    }

    pub fn remove_dir(target: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::RemoveDir,
            target: target.into(),
            selected: true,
        }
    }

    /// Copy of this change with a different selection flag
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn kind(&self) -> &ChangeKind {
        &self.kind
    }

    pub fn change_type(&self) -> ChangeType {
        match self.kind {
            ChangeKind::DeleteFile => ChangeType::DeleteFile,
            ChangeKind::RenameFile { .. } => ChangeType::RenameFile,
            ChangeKind::RemoveDir => ChangeType::RemoveDir,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn new_name(&self) -> Option<&Path> {
        match &self.kind {
            ChangeKind::RenameFile { new_name } => Some(new_name),
            _ => None,
        }
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Whether this change acts on a file (as opposed to a directory)
    pub fn is_file_change(&self) -> bool {
        !matches!(self.kind, ChangeKind::RemoveDir)
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ChangeKind::DeleteFile => write!(f, "delete {}", self.target.display()),
            ChangeKind::RenameFile { new_name } => write!(
                f,
                "rename {} → {}",
                self.target.display(),
                new_name.display()
            ),
            ChangeKind::RemoveDir => write!(f, "remove dir {}", self.target.display()),
        }
    }
}

/// Problems decoding a plan that came back from a caller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("rename of '{}' has no newName", .0.display())]
    MissingNewName(PathBuf),

    #[error("{change_type} of '{}' must not carry a newName", .target.display())]
    UnexpectedNewName {
        change_type: ChangeType,
        target: PathBuf,
    },

    #[error("rename of '{}' leaves its directory", .0.display())]
    RenameLeavesDirectory(PathBuf),

    #[error("target '{}' is not an absolute path", .0.display())]
    RelativeTarget(PathBuf),

    #[error("'{}' is changed after its directory '{}' is removed", .target.display(), .dir.display())]
    OutOfOrder { target: PathBuf, dir: PathBuf },
}

/// JSON shape of a change: `{type, target, newName, selected}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeRecord {
    #[serde(rename = "type")]
    change_type: ChangeType,
    target: PathBuf,
    #[serde(default)]
    new_name: PathBuf,
    #[serde(default = "default_selected")]
    selected: bool,
}

fn default_selected() -> bool {
    true
}

impl From<Change> for ChangeRecord {
    fn from(change: Change) -> Self {
        let change_type = change.change_type();
        let new_name = match change.kind {
            ChangeKind::RenameFile { new_name } => new_name,
            _ => PathBuf::new(),
        };
        ChangeRecord {
            change_type,
            target: change.target,
            new_name,
            selected: change.selected,
        }
    }
}

impl TryFrom<ChangeRecord> for Change {
    type Error = WireError;

    fn try_from(record: ChangeRecord) -> Result<Self, Self::Error> {
        if !record.target.is_absolute() {
            return Err(WireError::RelativeTarget(record.target));
        }
        let has_new_name = !record.new_name.as_os_str().is_empty();

        let kind = match record.change_type {
            ChangeType::RenameFile => {
                if !has_new_name {
                    return Err(WireError::MissingNewName(record.target));
                }
                if record.new_name.parent() != record.target.parent()
                    || record.new_name.file_name().is_none()
                {
                    return Err(WireError::RenameLeavesDirectory(record.target));
                }
                ChangeKind::RenameFile {
                    new_name: record.new_name,
                }
            }
            other if has_new_name => {
                return Err(WireError::UnexpectedNewName {
                    change_type: other,
                    target: record.target,
                })
            }
            ChangeType::DeleteFile => ChangeKind::DeleteFile,
            ChangeType::RemoveDir => ChangeKind::RemoveDir,
        };

        Ok(Change {
            kind,
            target: record.target,
            selected: record.selected,
        })
    }
}

/// Number of changes per type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub delete_file: usize,
    pub rename_file: usize,
    pub remove_dir: usize,
}

impl ChangeCounts {
    pub fn get(&self, change_type: ChangeType) -> usize {
        match change_type {
            ChangeType::DeleteFile => self.delete_file,
            ChangeType::RenameFile => self.rename_file,
            ChangeType::RemoveDir => self.remove_dir,
        }
    }

    pub fn total(&self) -> usize {
        self.delete_file + self.rename_file + self.remove_dir
    }

    fn bump(&mut self, change_type: ChangeType) {
        match change_type {
            ChangeType::DeleteFile => self.delete_file += 1,
            ChangeType::RenameFile => self.rename_file += 1,
            ChangeType::RemoveDir => self.remove_dir += 1,
        }
    }
}

/// Ordered list of changes for one scan.
///
/// File changes inside a directory always come before the removal of that
/// directory or any of its ancestors, so applying top to bottom is safe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    changes: Vec<Change>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for change in &self.changes {
            counts.bump(change.change_type());
        }
        counts
    }

    pub fn selected_count(&self) -> usize {
        self.changes.iter().filter(|c| c.selected()).count()
    }

    /// New plan with the selection overrides applied; this plan is unchanged.
    pub fn with_selection(&self, selection: &Selection) -> Plan {
        let changes = self
            .changes
            .iter()
            .enumerate()
            .map(|(index, change)| match selection.get(index) {
                Some(selected) => change.clone().with_selected(selected),
                None => change.clone(),
            })
            .collect();
        Plan { changes }
    }

    /// Verify that no file change follows the removal of one of its ancestors.
    pub fn check_order(&self) -> Result<(), WireError> {
        let mut removed: HashSet<&Path> = HashSet::new();
        for change in &self.changes {
            if let Some(dir) = change
                .target()
                .ancestors()
                .skip(1)
                .find(|a| removed.contains(a))
            {
                return Err(WireError::OutOfOrder {
                    target: change.target().to_path_buf(),
                    dir: dir.to_path_buf(),
                });
            }
            if !change.is_file_change() {
                removed.insert(change.target());
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Decode a plan handed back by a caller, validating every record and the ordering.
    pub fn from_json(json: &str) -> anyhow::Result<Plan> {
        let plan: Plan = serde_json::from_str(json)?;
        plan.check_order()?;
        Ok(plan)
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl FromIterator<Change> for Plan {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Plan {
            changes: iter.into_iter().collect(),
        }
    }
}
