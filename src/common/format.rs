use colored::*;

use crate::planner::plan::ChangeType;

/// Format a change count with the right plural
pub fn format_count(count: usize, noun: &str) -> String {
    format_count_plural(count, noun, &format!("{}s", noun))
}

/// Format a count for nouns whose plural is not a trailing `s`
pub fn format_count_plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Format a path for display, replacing home directory with ~
pub fn format_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Format a path relative to the scan root when possible
pub fn format_relative(path: &std::path::Path, root: &std::path::Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => format_path(path),
    }
}

/// Format duration in human-readable form
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    }
}

/// Fixed-width tag for a change type
pub fn change_tag(change_type: ChangeType) -> ColoredString {
    match change_type {
        ChangeType::DeleteFile => "[DELETE]    ".red(),
        ChangeType::RenameFile => "[RENAME]    ".yellow(),
        ChangeType::RemoveDir => "[REMOVE DIR]".magenta(),
    }
}

/// Print a section header
pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
    println!();
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Truncate a string to max length with ellipsis, keeping the tail
pub fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0, "change"), "0 changes");
        assert_eq!(format_count(1, "change"), "1 change");
        assert_eq!(format_count(42, "error"), "42 errors");
    }

    #[test]
    fn test_format_count_plural() {
        assert_eq!(format_count_plural(1, "entry", "entries"), "1 entry");
        assert_eq!(format_count_plural(0, "entry", "entries"), "0 entries");
        assert_eq!(
            format_count_plural(3, "empty directory", "empty directories"),
            "3 empty directories"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(3.7), "3.7s");
        assert_eq!(format_duration(125.0), "2m 5s");
    }

    #[test]
    fn test_format_relative() {
        let root = Path::new("/data/photos");
        assert_eq!(format_relative(Path::new("/data/photos/a/b.jpg"), root), "a/b.jpg");
        assert_eq!(format_relative(Path::new("/elsewhere/x"), root), "/elsewhere/x");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("/very/long/path.txt", 11), "...path.txt");
        assert_eq!(truncate("abcd", 3), "...");
    }
}
