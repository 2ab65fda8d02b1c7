use std::path::Path;
use tempfile::TempDir;

use housekeeper::cleaner::{apply, ApplyOptions};
use housekeeper::common::{CancelToken, CollisionReason, ScanErrorKind};
use housekeeper::planner::{build_plan, simulate, Change, ChangeType, Plan};
use housekeeper::rules::RuleSet;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "content").unwrap();
}

fn rules(deny: &[&str], rename: &[(&str, &str)]) -> RuleSet {
    RuleSet::normalize(deny.iter().copied(), rename.iter().copied()).unwrap()
}

fn plan_for(root: &Path, rules: &RuleSet) -> Plan {
    let outcome = build_plan(root, rules, &CancelToken::new()).unwrap();
    assert!(!outcome.cancelled);
    outcome.plan
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_mixed_root_plan() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("a.tmp"));
    touch(&root.join("b.log"));
    touch(&root.join("c.txt"));
    std::fs::create_dir(root.join("sub")).unwrap();

    let plan = plan_for(root, &rules(&[".tmp"], &[(".log", ".bak")]));

    let expected = vec![
        Change::delete_file(root.join("a.tmp")),
        Change::rename_file(root.join("b.log"), "b.bak"),
        Change::remove_dir(root.join("sub")),
    ];
    assert_eq!(plan.changes(), expected.as_slice());
}

#[test]
fn test_directory_emptied_by_deletes_is_removed_after_them() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("d/x.tmp"));

    let plan = plan_for(root, &rules(&[".tmp"], &[]));

    let expected = vec![
        Change::delete_file(root.join("d/x.tmp")),
        Change::remove_dir(root.join("d")),
    ];
    assert_eq!(plan.changes(), expected.as_slice());
}

#[test]
fn test_rename_onto_existing_file_is_dropped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("p.log"));
    touch(&root.join("p.txt"));

    let rules = rules(&[], &[(".log", ".txt")]);
    let outcome = build_plan(root, &rules, &CancelToken::new()).unwrap();

    assert!(outcome.plan.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path, root.join("p.log"));
    assert_eq!(
        outcome.errors[0].kind,
        ScanErrorKind::RenameCollision {
            new_name: root.join("p.txt"),
            reason: CollisionReason::ExistingEntry,
        }
    );

    let report = apply(&outcome.plan, &ApplyOptions::default(), &CancelToken::new());
    assert!(report.results.is_empty());
    assert!(root.join("p.log").exists());
    assert_eq!(std::fs::read_to_string(root.join("p.txt")).unwrap(), "content");
}

#[test]
fn test_second_rename_to_same_name_is_dropped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("p.jpe"));
    touch(&root.join("p.jpeg"));

    let rules = rules(&[], &[(".jpe", ".jpg"), (".jpeg", ".jpg")]);
    let outcome = build_plan(root, &rules, &CancelToken::new()).unwrap();

    assert_eq!(
        outcome.plan.changes(),
        &[Change::rename_file(root.join("p.jpe"), "p.jpg")]
    );
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].is_rename_collision());
    assert_eq!(outcome.errors[0].path, root.join("p.jpeg"));
}

#[test]
fn test_nested_empty_directories_removed_in_one_pass() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::create_dir_all(root.join("outer/inner/deepest")).unwrap();
    touch(&root.join("outer/junk.tmp"));

    let plan = plan_for(root, &rules(&[".tmp"], &[]));

    let expected = vec![
        Change::remove_dir(root.join("outer/inner/deepest")),
        Change::remove_dir(root.join("outer/inner")),
        Change::delete_file(root.join("outer/junk.tmp")),
        Change::remove_dir(root.join("outer")),
    ];
    assert_eq!(plan.changes(), expected.as_slice());
}

#[test]
fn test_directory_with_kept_or_renamed_file_survives() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("keep/notes.txt"));
    touch(&root.join("moved/song.log"));

    let plan = plan_for(root, &rules(&[".tmp"], &[(".log", ".bak")]));

    assert_eq!(plan.counts().remove_dir, 0);
    assert_eq!(
        plan.changes(),
        &[Change::rename_file(root.join("moved/song.log"), "song.bak")]
    );
}

#[test]
fn test_root_is_never_removed() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("only.tmp"));

    let plan = plan_for(tmp.path(), &rules(&[".tmp"], &[]));

    assert_eq!(plan.changes(), &[Change::delete_file(tmp.path().join("only.tmp"))]);
}

// ─── Properties ──────────────────────────────────────────────────────────────

fn sample_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("a.TMP"));
    touch(&root.join("photos/IMG_1.JPEG"));
    touch(&root.join("photos/IMG_2.jpeg"));
    touch(&root.join("photos/trash/old.tmp"));
    touch(&root.join("docs/readme.md"));
    touch(&root.join("docs/cache/x.tmp"));
    touch(&root.join("logs/server.log"));
    std::fs::create_dir_all(root.join("empty/nested")).unwrap();
    tmp
}

#[test]
fn test_build_is_idempotent() {
    let tmp = sample_tree();
    let rules = rules(&[".tmp"], &[(".jpeg", ".jpg"), (".log", ".txt")]);

    let first = plan_for(tmp.path(), &rules);
    let second = plan_for(tmp.path(), &rules);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_removals_follow_descendant_changes() {
    let tmp = sample_tree();
    let plan = plan_for(tmp.path(), &rules(&[".tmp"], &[(".jpeg", ".jpg")]));

    assert!(plan.check_order().is_ok());
    for (i, change) in plan.iter().enumerate() {
        if change.change_type() != ChangeType::RemoveDir {
            continue;
        }
        for later in &plan.changes()[i + 1..] {
            assert!(
                !later.target().starts_with(change.target()) || later.target() == change.target(),
                "{} comes after removal of {}",
                later,
                change
            );
        }
    }
}

#[test]
fn test_deny_beats_rename() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("server.LOG"));

    let plan = plan_for(tmp.path(), &rules(&[".log"], &[(".log", ".bak")]));

    assert_eq!(plan.changes(), &[Change::delete_file(tmp.path().join("server.LOG"))]);
}

#[test]
fn test_simulate_agrees_with_build() {
    let tmp = sample_tree();
    let rules = rules(&[".tmp"], &[(".jpeg", ".jpg"), (".log", ".txt")]);

    let plan = plan_for(tmp.path(), &rules);
    let simulation = simulate(tmp.path(), &rules, &CancelToken::new(), 3).unwrap();

    assert_eq!(simulation.counts, plan.counts());
    for change_type in ChangeType::ALL {
        assert!(simulation.samples.get(&change_type).map_or(0, Vec::len) <= 3);
    }
    // Nothing was touched
    assert!(tmp.path().join("a.TMP").exists());
    assert!(tmp.path().join("empty/nested").is_dir());
}

#[test]
fn test_prefix_and_lowercase_supplements() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("._photo.jpg"));
    touch(&root.join("Scan.PDF"));

    let rules = rules(&[], &[])
        .with_delete_prefixes(["._"])
        .unwrap()
        .with_lowercase_fallback(true);
    let plan = plan_for(root, &rules);

    let expected = vec![
        Change::delete_file(root.join("._photo.jpg")),
        Change::rename_file(root.join("Scan.PDF"), "Scan.pdf"),
    ];
    assert_eq!(plan.changes(), expected.as_slice());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_extension_keeps_its_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let odd = root.join(OsStr::from_bytes(b"photo.JP\xffG"));
    if std::fs::write(&odd, "content").is_err() {
        // Filesystem refuses non-UTF-8 names
        return;
    }
    touch(&root.join("Scan.PDF"));

    let rules = rules(&[], &[]).with_lowercase_fallback(true);
    let plan = plan_for(root, &rules);

    assert_eq!(
        plan.changes(),
        &[Change::rename_file(root.join("Scan.PDF"), "Scan.pdf")]
    );
    assert!(odd.exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_reported_and_kept() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("locked/inside.tmp"));
    touch(&root.join("loose.tmp"));
    let locked = root.join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    if std::fs::read_dir(&locked).is_ok() {
        // Running with privileges that ignore permissions
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let outcome = build_plan(root, &rules(&[".tmp"], &[]), &CancelToken::new()).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(outcome.plan.changes(), &[Change::delete_file(root.join("loose.tmp"))]);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path, locked);
    assert!(matches!(outcome.errors[0].kind, ScanErrorKind::Unreadable { .. }));
}

#[test]
fn test_plan_json_uses_wire_shape() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("b.log"));

    let plan = plan_for(tmp.path(), &rules(&[], &[(".log", ".bak")]));
    let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();

    assert_eq!(json[0]["type"], "rename_file");
    assert_eq!(json[0]["selected"], true);
    assert!(json[0]["newName"].as_str().unwrap().ends_with("b.bak"));

    let decoded = Plan::from_json(&plan.to_json().unwrap()).unwrap();
    assert_eq!(decoded, plan);
}
