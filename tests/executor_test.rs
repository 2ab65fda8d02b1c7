use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use housekeeper::cleaner::{apply, ApplyOptions, Outcome};
use housekeeper::common::{ApplyFailure, CancelToken};
use housekeeper::planner::{build_plan, Change, Plan, Selection};
use housekeeper::rules::RuleSet;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, path.file_name().unwrap().to_string_lossy().as_bytes()).unwrap();
}

/// Every path under `root` with file contents (directories map to None)
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let contents = e.file_type().is_file().then(|| std::fs::read(e.path()).unwrap());
            (e.path().to_path_buf(), contents)
        })
        .collect()
}

fn mixed_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("a.tmp"));
    touch(&root.join("b.log"));
    touch(&root.join("c.txt"));
    std::fs::create_dir(root.join("sub")).unwrap();
    touch(&root.join("d/x.tmp"));
    tmp
}

fn mixed_rules() -> RuleSet {
    RuleSet::normalize([".tmp"], [(".log", ".bak")]).unwrap()
}

fn plan_for(root: &Path) -> Plan {
    build_plan(root, &mixed_rules(), &CancelToken::new())
        .unwrap()
        .plan
}

fn run(plan: &Plan) -> housekeeper::cleaner::ApplyReport {
    apply(plan, &ApplyOptions::default(), &CancelToken::new())
}

#[test]
fn test_apply_full_plan() {
    let tmp = mixed_tree();
    let root = tmp.path();
    let plan = plan_for(root);
    assert_eq!(plan.len(), 5);

    let report = run(&plan);

    assert_eq!(report.succeeded(), 5);
    assert_eq!(report.failed(), 0);
    assert!(!report.cancelled);
    assert!(!root.join("a.tmp").exists());
    assert!(!root.join("b.log").exists());
    assert!(root.join("b.bak").exists());
    assert!(root.join("c.txt").exists());
    assert!(!root.join("sub").exists());
    assert!(!root.join("d").exists());

    // A second pass has nothing left to do
    assert!(plan_for(root).is_empty());
}

#[test]
fn test_all_unselected_changes_nothing() {
    let tmp = mixed_tree();
    let before = snapshot(tmp.path());
    let plan = plan_for(tmp.path());
    let plan = plan.with_selection(&Selection::none(&plan));

    let report = run(&plan);

    assert_eq!(report.results.len(), plan.len());
    assert!(report.results.iter().all(|r| r.outcome == Outcome::Skipped));
    assert_eq!(snapshot(tmp.path()), before);
}

#[test]
fn test_file_appearing_in_planned_directory_blocks_removal() {
    let tmp = TempDir::new().unwrap();
    let sub = tmp.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    let plan = plan_for(tmp.path());
    assert_eq!(plan.changes(), &[Change::remove_dir(&sub)]);

    touch(&sub.join("new.txt"));
    let report = run(&plan);

    assert_eq!(report.results[0].outcome, Outcome::Failed);
    assert_eq!(report.results[0].failure, Some(ApplyFailure::DirectoryNotEmpty));
    assert!(sub.join("new.txt").exists());
}

#[test]
fn test_skipped_child_delete_keeps_parent() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("d/x.tmp"));
    let plan = plan_for(root);

    let mut selection = Selection::new();
    selection.deselect(0);
    let report = run(&plan.with_selection(&selection));

    assert_eq!(report.results[0].outcome, Outcome::Skipped);
    assert_eq!(report.results[1].failure, Some(ApplyFailure::DirectoryNotEmpty));
    assert!(root.join("d/x.tmp").exists());
}

#[test]
fn test_rename_destination_created_after_planning() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("b.log"));
    touch(&root.join("z.tmp"));
    let plan = plan_for(root);

    std::fs::write(root.join("b.bak"), "keep me").unwrap();
    let report = run(&plan);

    let rename = &report.results[0];
    assert_eq!(rename.outcome, Outcome::Failed);
    assert_eq!(rename.failure, Some(ApplyFailure::RenameCollision));
    assert!(root.join("b.log").exists());
    assert_eq!(std::fs::read_to_string(root.join("b.bak")).unwrap(), "keep me");

    // The batch went on after the failure
    assert_eq!(report.results[1].outcome, Outcome::Succeeded);
    assert!(!root.join("z.tmp").exists());
}

#[test]
fn test_files_removed_since_planning() {
    let tmp = mixed_tree();
    let root = tmp.path();
    let plan = plan_for(root);

    std::fs::remove_file(root.join("a.tmp")).unwrap();
    std::fs::remove_file(root.join("b.log")).unwrap();
    std::fs::remove_dir(root.join("sub")).unwrap();
    let report = run(&plan);

    let by_target = |p: PathBuf| {
        report
            .results
            .iter()
            .find(|r| r.change.target() == p)
            .unwrap()
            .clone()
    };
    assert_eq!(by_target(root.join("a.tmp")).outcome, Outcome::Succeeded);
    assert_eq!(
        by_target(root.join("b.log")).failure,
        Some(ApplyFailure::NotFound)
    );
    assert_eq!(by_target(root.join("sub")).outcome, Outcome::Succeeded);
}

#[test]
fn test_cancel_stops_before_next_change() {
    let tmp = mixed_tree();
    let before = snapshot(tmp.path());
    let plan = plan_for(tmp.path());
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = apply(&plan, &ApplyOptions::default(), &cancel);

    assert!(report.cancelled);
    assert!(report.results.is_empty());
    assert_eq!(snapshot(tmp.path()), before);
}

#[cfg(unix)]
#[test]
fn test_unlock_makes_renamed_file_writable() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    for name in ["locked.log", "plain.log"] {
        let path = root.join(name);
        touch(&path);
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    let plan = plan_for(root);
    let mut selection = Selection::new();
    selection.deselect(1);
    let options = ApplyOptions {
        show_progress: false,
        unlock_read_only: true,
    };
    let report = apply(&plan.with_selection(&selection), &options, &CancelToken::new());
    assert_eq!(report.succeeded(), 1);

    let unlocked = std::fs::metadata(root.join("locked.bak")).unwrap();
    assert!(!unlocked.permissions().readonly());

    let report = run(&plan_for(root));
    assert_eq!(report.succeeded(), 1);
    let untouched = std::fs::metadata(root.join("plain.bak")).unwrap();
    assert!(untouched.permissions().readonly());
}

#[cfg(unix)]
#[test]
fn test_permission_denied_does_not_abort_batch() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    touch(&root.join("frozen/a.tmp"));
    touch(&root.join("open/b.tmp"));
    let plan = plan_for(root);
    assert_eq!(plan.len(), 4);

    let frozen = root.join("frozen");
    std::fs::set_permissions(&frozen, std::fs::Permissions::from_mode(0o555)).unwrap();
    if std::fs::write(frozen.join("probe"), "").is_ok() {
        // Running with privileges that ignore permissions
        std::fs::set_permissions(&frozen, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = run(&plan);
    std::fs::set_permissions(&frozen, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.results[0].failure, Some(ApplyFailure::PermissionDenied));
    assert_eq!(report.results[1].failure, Some(ApplyFailure::DirectoryNotEmpty));
    assert_eq!(report.results[2].outcome, Outcome::Succeeded);
    assert_eq!(report.results[3].outcome, Outcome::Succeeded);
    assert!(frozen.join("a.tmp").exists());
    assert!(!root.join("open").exists());
}
