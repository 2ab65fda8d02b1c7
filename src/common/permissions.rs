use std::path::Path;

/// Check if a file is marked read-only
pub fn is_read_only(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(false)
}

/// Restore the owner write bit on a read-only file so it can be deleted or renamed.
///
/// Symlinks are left alone: changing permissions would follow the link.
/// Returns `Ok(false)` when nothing needed changing.
pub fn unlock(path: &Path) -> std::io::Result<bool> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() || !metadata.permissions().readonly() {
        return Ok(false);
    }

    let mut perms = metadata.permissions();
    make_writable(&mut perms);
    std::fs::set_permissions(path, perms)?;
    Ok(true)
}

#[cfg(unix)]
fn make_writable(perms: &mut std::fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;
    perms.set_mode(perms.mode() | 0o200);
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(perms: &mut std::fs::Permissions) {
    perms.set_readonly(false);
}
