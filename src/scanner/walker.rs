use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::common::errors::ScanError;

/// Whether an entry is a directory or something treated as a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One filesystem entry produced by the walker.
///
/// Symlinks are never followed and always come out as `File`, whatever they point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: PathBuf,
    kind: EntryKind,
    is_symlink: bool,
    depth: usize,
}

impl Entry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            is_symlink: false,
            depth: 1,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            is_symlink: false,
            depth: 1,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    /// Depth below the walk root (direct children are 1)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// File name as UTF-8, lossily converted
    pub fn file_name(&self) -> Option<std::borrow::Cow<'_, str>> {
        self.path.file_name().map(|n| n.to_string_lossy())
    }

    /// Normalized extension (`.tmp` form) of a file; `None` for directories,
    /// dotfiles, and names without a dot.
    pub fn extension(&self) -> Option<String> {
        if self.is_dir() {
            return None;
        }
        self.path
            .extension()
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
    }
}

impl From<walkdir::DirEntry> for Entry {
    fn from(dent: walkdir::DirEntry) -> Self {
        let file_type = dent.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Self {
            is_symlink: file_type.is_symlink(),
            depth: dent.depth(),
            kind,
            path: dent.into_path(),
        }
    }
}

/// A read failure during a walk.
///
/// `path` is `None` when the failing location could not be determined.
#[derive(Debug)]
pub struct WalkError {
    path: Option<PathBuf>,
    cause: String,
}

impl WalkError {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// Convert to a recorded scan error, attributing unknown locations to `root`
    pub fn into_scan_error(self, root: &Path) -> ScanError {
        let path = self.path.unwrap_or_else(|| root.to_path_buf());
        ScanError::unreadable(path, self.cause)
    }
}

impl From<walkdir::Error> for WalkError {
    fn from(err: walkdir::Error) -> Self {
        let cause = match err.io_error() {
            Some(io) => io.to_string(),
            None => err.to_string(),
        };
        Self {
            path: err.path().map(Path::to_path_buf),
            cause,
        }
    }
}

/// Depth-first, post-order walker over one root directory.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    root: PathBuf,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a fresh walk. Each call is independent of any other.
    ///
    /// Directories are yielded after all their descendants, siblings in
    /// file-name order. The root itself is never yielded. An unreadable
    /// directory yields an error and the walk carries on past it.
    pub fn walk(&self) -> Walk {
        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .contents_first(true)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        Walk { inner }
    }
}

/// Lazy iterator returned by [`DirectoryWalker::walk`].
pub struct Walk {
    inner: walkdir::IntoIter,
}

impl Iterator for Walk {
    type Item = Result<Entry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|res| res.map(Entry::from).map_err(WalkError::from))
    }
}
