use std::path::Path;

/// Roots that must NEVER be scanned for cleanup.
/// A plan over one of these could delete or rename system files en masse.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/home",
    "/root",
    "/usr",
    "/bin",
    "/sbin",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/proc",
    "/sys",
    "/dev",
    "/boot",
    "/Volumes",
];

/// Paths under home that must never be used as a scan root
const PROTECTED_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    "Library",
    ".ssh",
    ".gnupg",
    ".config",
];

/// Check if a path is protected and must not be used as a scan root
pub fn is_protected(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    let trimmed = if path_str.len() > 1 {
        path_str.trim_end_matches('/')
    } else {
        path_str.as_ref()
    };

    if PROTECTED_PATHS.iter().any(|p| trimmed == *p) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        for dir in PROTECTED_HOME_DIRS {
            let protected_path = if dir.is_empty() {
                home.clone()
            } else {
                home.join(dir)
            };
            if path == protected_path {
                return true;
            }
        }
    }

    false
}
