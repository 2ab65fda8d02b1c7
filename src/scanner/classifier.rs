use std::ffi::OsString;
use std::path::Path;

use super::walker::Entry;
use crate::planner::plan::Change;
use crate::rules::RuleSet;

/// Outcome of classifying one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub change: Change,
    /// The rename destination already exists on disk
    pub collides: bool,
}

/// Decide what, if anything, should happen to one entry. First match wins:
///
/// 1. directories: nothing (removal is decided from aggregate state later)
/// 2. denied extension or denied name prefix: delete
/// 3. extension with a replacement mapping: rename
/// 4. upper-case extension, when the lowercase fallback is on: rename
///
/// Reads the filesystem only to flag rename collisions.
pub fn classify(entry: &Entry, rules: &RuleSet) -> Option<Classification> {
    if entry.is_dir() {
        return None;
    }

    let ext = entry.extension();
    let denied_ext = ext.as_deref().is_some_and(|e| rules.is_denied(e));
    let denied_prefix = entry
        .file_name()
        .is_some_and(|name| rules.has_denied_prefix(&name));
    if denied_ext || denied_prefix {
        tracing::debug!("delete candidate: {}", entry.path().display());
        return Some(Classification {
            change: Change::delete_file(entry.path()),
            collides: false,
        });
    }

    // Renames rebuild the name from the extension text, so it must be valid UTF-8
    let raw_ext = entry.path().extension()?.to_str()?;
    let ext = ext?;
    let new_ext = match rules.rename_target(&ext) {
        Some(mapped) => mapped.to_string(),
        None if rules.lowercase_fallback() && raw_ext.chars().any(char::is_uppercase) => {
            format!(".{}", raw_ext.to_lowercase())
        }
        None => return None,
    };

    let new_file_name = replace_extension(entry.path(), &new_ext)?;
    if Some(new_file_name.as_os_str()) == entry.path().file_name() {
        return None;
    }

    let change = Change::rename_file(entry.path(), &new_file_name);
    let collides = change
        .new_name()
        .is_some_and(|dest| destination_taken(entry.path(), dest));
    tracing::debug!(
        "rename candidate: {} → {:?}{}",
        entry.path().display(),
        new_file_name,
        if collides { " (collides)" } else { "" }
    );

    Some(Classification { change, collides })
}

/// `stem` + new extension, keeping the stem's original bytes
fn replace_extension(path: &Path, new_ext: &str) -> Option<OsString> {
    let mut name = path.file_stem()?.to_os_string();
    name.push(new_ext);
    Some(name)
}


/// Whether `dest` is occupied by something other than `source` itself.
///
/// On case-insensitive filesystems `a.LOG` and `a.log` are the same file,
/// which must not count as a collision.
pub(crate) fn destination_taken(source: &Path, dest: &Path) -> bool {
    let Ok(dest_meta) = std::fs::symlink_metadata(dest) else {
        return false;
    };
    let Ok(source_meta) = std::fs::symlink_metadata(source) else {
        return true;
    };
    !same_file(&source_meta, &dest_meta, source, dest)
}

#[cfg(unix)]
fn same_file(a: &std::fs::Metadata, b: &std::fs::Metadata, _: &Path, _: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(_: &std::fs::Metadata, _: &std::fs::Metadata, a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}
