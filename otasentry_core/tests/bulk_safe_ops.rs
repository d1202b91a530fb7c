//! Bulk cloud operations: candidacy comes from the cached scan only, and an
//! empty cache makes both operations a no-op.

use otasentry_core::cache::SnapshotCache;
use otasentry_core::catalog::CloudCategory;
use otasentry_core::enforce::{disable_all_safe, uninstall_all_safe};
use otasentry_core::events::MemorySink;
use otasentry_core::executor::ScriptedRunner;
use otasentry_core::types::{CloudPackageStatus, CloudSnapshot};

fn cloud_pkg(id: &str, safe: bool, compliant: bool) -> CloudPackageStatus {
    CloudPackageStatus {
        id: id.to_string(),
        label: format!("{} label", id),
        description: String::new(),
        category: CloudCategory::Telemetry,
        safe_to_disable: safe,
        compliant,
        raw_state: if compliant { "disabled" } else { "enabled" }.to_string(),
    }
}

fn cached_scan() -> CloudSnapshot {
    CloudSnapshot {
        has_root: true,
        captured_at: 1_720_000_000_000,
        packages: vec![
            cloud_pkg("c.safe.enabled", true, false),
            cloud_pkg("c.safe.disabled", true, true),
            cloud_pkg("c.unsafe.enabled", false, false),
        ],
    }
}

#[test]
fn test_disable_all_safe_with_empty_cache_is_noop() {
    let cache = SnapshotCache::open_in_memory().unwrap();
    let runner = ScriptedRunner::new();

    let outcomes = disable_all_safe(&cache, &runner, &MemorySink::new(16));

    assert!(outcomes.is_empty());
    assert_eq!(runner.privileged_count(), 0, "no privileged commands issued");
}

#[test]
fn test_uninstall_all_safe_with_empty_cache_is_noop() {
    let cache = SnapshotCache::open_in_memory().unwrap();
    let runner = ScriptedRunner::new();

    let outcomes = uninstall_all_safe(&cache, &runner, &MemorySink::new(16));

    assert!(outcomes.is_empty());
    assert_eq!(runner.privileged_count(), 0);
}

#[test]
fn test_disable_all_safe_targets_safe_noncompliant_only() {
    let cache = SnapshotCache::open_in_memory().unwrap();
    cache.save_cloud(&cached_scan()).unwrap();

    let mut runner = ScriptedRunner::new();
    runner.script(
        "pm disable-user --user 0 c.safe.enabled",
        "Package c.safe.enabled new state: disabled-user",
    );

    let outcomes = disable_all_safe(&cache, &runner, &MemorySink::new(16));

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].target, "c.safe.enabled label");
    assert!(outcomes[0].success);

    let issued = runner.issued_privileged.borrow();
    assert_eq!(issued.as_slice(), ["pm disable-user --user 0 c.safe.enabled"]);
}

#[test]
fn test_uninstall_all_safe_targets_all_safe_entries() {
    let cache = SnapshotCache::open_in_memory().unwrap();
    cache.save_cloud(&cached_scan()).unwrap();

    let mut runner = ScriptedRunner::new();
    runner.script("pm uninstall -k --user 0 c.safe.enabled", "Success");
    // c.safe.disabled left unscripted: its removal fails but the other
    // outcome is unaffected.

    let outcomes = uninstall_all_safe(&cache, &runner, &MemorySink::new(16));

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
    assert!(runner
        .issued_privileged
        .borrow()
        .iter()
        .all(|c| !c.contains("c.unsafe.enabled")));
}
