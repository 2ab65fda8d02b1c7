use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for Housekeeper operations.
/// We use `anyhow` at the top level for CLI error handling,
/// but these typed errors allow the engine to be precise about failures.

/// Fatal errors: raised before any traversal starts.
#[derive(Debug, Error)]
pub enum HousekeeperError {
    /// Rule data is malformed
    #[error("Invalid config entry '{entry}': {reason}")]
    InvalidConfig { entry: String, reason: String },

    /// Scan root is missing, not a directory, or protected
    #[error("Invalid root '{}': {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },
}

impl HousekeeperError {
    pub fn invalid_config(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        HousekeeperError::InvalidConfig {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HousekeeperError::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A recoverable problem found while building a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{}: {kind}", .path.display())]
pub struct ScanError {
    pub path: PathBuf,
    pub kind: ScanErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanErrorKind {
    /// A subtree could not be read; the walk continued past it
    #[error("unreadable: {cause}")]
    Unreadable { cause: String },

    /// A rename candidate was dropped; the source file stays as it is
    #[error("rename to '{}' collides with {reason}", .new_name.display())]
    RenameCollision {
        new_name: PathBuf,
        reason: CollisionReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionReason {
    /// Something already exists at the destination
    ExistingEntry,
    /// An earlier rename in the same plan claimed the destination
    EarlierRename,
}

impl std::fmt::Display for CollisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionReason::ExistingEntry => write!(f, "an existing entry"),
            CollisionReason::EarlierRename => write!(f, "an earlier rename"),
        }
    }
}

impl ScanError {
    pub fn unreadable(path: impl Into<PathBuf>, cause: impl std::fmt::Display) -> Self {
        ScanError {
            path: path.into(),
            kind: ScanErrorKind::Unreadable {
                cause: cause.to_string(),
            },
        }
    }

    pub fn rename_collision(
        path: impl Into<PathBuf>,
        new_name: impl Into<PathBuf>,
        reason: CollisionReason,
    ) -> Self {
        ScanError {
            path: path.into(),
            kind: ScanErrorKind::RenameCollision {
                new_name: new_name.into(),
                reason,
            },
        }
    }

    pub fn is_rename_collision(&self) -> bool {
        matches!(self.kind, ScanErrorKind::RenameCollision { .. })
    }
}

/// Why a single change failed at apply time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyFailure {
    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("rename destination already exists")]
    RenameCollision,

    #[error("directory is not empty")]
    DirectoryNotEmpty,

    #[error("I/O error")]
    Io,
}

impl From<&std::io::Error> for ApplyFailure {
    fn from(e: &std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ApplyFailure::NotFound,
            std::io::ErrorKind::PermissionDenied => ApplyFailure::PermissionDenied,
            std::io::ErrorKind::DirectoryNotEmpty => ApplyFailure::DirectoryNotEmpty,
            std::io::ErrorKind::AlreadyExists => ApplyFailure::RenameCollision,
            _ => ApplyFailure::Io,
        }
    }
}
