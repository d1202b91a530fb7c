//! Privileged mutations that bring mismatched targets into compliance.
//!
//! Enforcement is at-least-one-attempt, no-retry: every target is attempted
//! exactly once per call and outcomes are aggregated with no short-circuit.
//! Callers needing convergence re-run evaluate then enforce.

use crate::cache::SnapshotCache;
use crate::catalog::Catalog;
use crate::events::{EventLevel, EventSink};
use crate::executor::CommandRunner;
use crate::probe::read_global_setting;
use crate::types::EnforcementOutcome;

/// Disables every monitored package and writes every monitored setting to
/// its expected value. One outcome per catalog target, in catalog order.
pub fn enforce(
    catalog: &Catalog,
    runner: &dyn CommandRunner,
    events: &dyn EventSink,
) -> Vec<EnforcementOutcome> {
    events.emit(EventLevel::Info, "[ENFORCE] applying lockdown policy");
    let mut outcomes = Vec::with_capacity(catalog.packages.len() + catalog.settings.len());

    for pkg in &catalog.packages {
        // Disable commands emit varying success phrasing across platform
        // versions; presence of output is the success signal.
        let outcome = match runner.run_privileged(&format!("pm disable {}", pkg.id)) {
            Some(output) => EnforcementOutcome {
                target: pkg.label.clone(),
                success: true,
                detail: if output.is_empty() {
                    "disabled".to_string()
                } else {
                    output
                },
            },
            None => EnforcementOutcome {
                target: pkg.label.clone(),
                success: false,
                detail: "disable command failed".to_string(),
            },
        };
        events.emit(
            if outcome.success {
                EventLevel::Info
            } else {
                EventLevel::Error
            },
            &format!("[ENFORCE] freeze {}", outcome),
        );
        outcomes.push(outcome);
    }

    for setting in &catalog.settings {
        let wrote = runner
            .run_privileged(&format!(
                "settings put global {} {}",
                setting.key, setting.expected
            ))
            .is_some();
        // Some write paths report no output on success; read back before
        // declaring failure.
        let success = wrote || read_global_setting(runner, &setting.key) == setting.expected;
        let outcome = EnforcementOutcome {
            target: setting.label.clone(),
            success,
            detail: if success {
                format!("set to {}", setting.expected)
            } else {
                "settings write failed".to_string()
            },
        };
        events.emit(
            if success {
                EventLevel::Info
            } else {
                EventLevel::Error
            },
            &format!("[ENFORCE] {}", outcome),
        );
        outcomes.push(outcome);
    }

    events.emit(EventLevel::Info, "[ENFORCE] lockdown pass complete");
    outcomes
}

/// Disables one cloud component for the current user (reversible).
pub fn disable_package(runner: &dyn CommandRunner, events: &dyn EventSink, pkg_id: &str) -> bool {
    let output = runner.run_privileged(&format!("pm disable-user --user 0 {}", pkg_id));
    let success = matches!(&output, Some(o) if o.contains("disabled") || o.contains("new state"));
    events.emit(
        if success { EventLevel::Info } else { EventLevel::Error },
        &format!(
            "[CLOUD] disable {}: {}",
            pkg_id,
            if success { "ok" } else { "failed" }
        ),
    );
    success
}

/// Re-enables a previously disabled cloud component.
pub fn enable_package(runner: &dyn CommandRunner, events: &dyn EventSink, pkg_id: &str) -> bool {
    let output = runner.run_privileged(&format!("pm enable {}", pkg_id));
    let success = matches!(&output, Some(o) if o.contains("enabled") || o.contains("new state"));
    events.emit(
        if success { EventLevel::Info } else { EventLevel::Error },
        &format!(
            "[CLOUD] enable {}: {}",
            pkg_id,
            if success { "ok" } else { "failed" }
        ),
    );
    success
}

/// Removes a cloud component for the current user only; restorable with
/// `pm install-existing`.
pub fn uninstall_package(runner: &dyn CommandRunner, events: &dyn EventSink, pkg_id: &str) -> bool {
    let output = runner.run_privileged(&format!("pm uninstall -k --user 0 {}", pkg_id));
    let success = matches!(&output, Some(o) if o.contains("Success"));
    events.emit(
        if success { EventLevel::Info } else { EventLevel::Error },
        &format!(
            "[CLOUD] uninstall {}: {}",
            pkg_id,
            if success { "ok" } else { "failed" }
        ),
    );
    success
}

/// Disables every cached cloud component marked safe to disable and not
/// already disabled. Candidacy comes from the last cached scan, never a
/// fresh probe: bulk action must not run against a catalog the operator has
/// not seen. With no cached scan this is a no-op.
pub fn disable_all_safe(
    cache: &SnapshotCache,
    runner: &dyn CommandRunner,
    events: &dyn EventSink,
) -> Vec<EnforcementOutcome> {
    let snapshot = match cache.load_cloud() {
        Some(snapshot) => snapshot,
        None => {
            events.emit(
                EventLevel::Warn,
                "[CLOUD] no cached scan, bulk disable skipped",
            );
            return Vec::new();
        }
    };

    snapshot
        .packages
        .iter()
        .filter(|pkg| pkg.safe_to_disable && !pkg.compliant)
        .map(|pkg| {
            let success = disable_package(runner, events, &pkg.id);
            EnforcementOutcome {
                target: pkg.label.clone(),
                success,
                detail: if success { "disabled" } else { "disable failed" }.to_string(),
            }
        })
        .collect()
}

/// Uninstalls every cached cloud component marked safe to disable,
/// regardless of current state. Same cached-scan precondition as
/// `disable_all_safe`.
pub fn uninstall_all_safe(
    cache: &SnapshotCache,
    runner: &dyn CommandRunner,
    events: &dyn EventSink,
) -> Vec<EnforcementOutcome> {
    let snapshot = match cache.load_cloud() {
        Some(snapshot) => snapshot,
        None => {
            events.emit(
                EventLevel::Warn,
                "[CLOUD] no cached scan, bulk uninstall skipped",
            );
            return Vec::new();
        }
    };

    snapshot
        .packages
        .iter()
        .filter(|pkg| pkg.safe_to_disable)
        .map(|pkg| {
            let success = uninstall_package(runner, events, &pkg.id);
            EnforcementOutcome {
                target: pkg.label.clone(),
                success,
                detail: if success {
                    "uninstalled"
                } else {
                    "uninstall failed"
                }
                .to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MonitoredPackage, MonitoredSetting};
    use crate::events::MemorySink;
    use crate::executor::ScriptedRunner;

    fn catalog_with_setting(key: &str, expected: &str) -> Catalog {
        Catalog {
            packages: Vec::new(),
            settings: vec![MonitoredSetting {
                key: key.to_string(),
                label: format!("{} label", key),
                expected: expected.to_string(),
            }],
            disabled_state_codes: vec![2, 3, 4],
        }
    }

    #[test]
    fn test_package_disable_success_on_any_output() {
        let mut runner = ScriptedRunner::new();
        runner.script("pm disable com.x", "Package com.x new state: disabled");
        let catalog = Catalog {
            packages: vec![MonitoredPackage {
                id: "com.x".to_string(),
                label: "X".to_string(),
                description: String::new(),
            }],
            settings: Vec::new(),
            disabled_state_codes: vec![2, 3, 4],
        };

        let outcomes = enforce(&catalog, &runner, &MemorySink::new(16));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].success);
        assert!(outcomes[0].detail.contains("disabled"));
    }

    #[test]
    fn test_setting_write_with_output_skips_read_back() {
        let mut runner = ScriptedRunner::new();
        runner.script("settings put global k1 1", "");
        let outcomes = enforce(
            &catalog_with_setting("k1", "1"),
            &runner,
            &MemorySink::new(16),
        );
        assert!(outcomes[0].success);
        // No read-back issued when the write itself reported back.
        assert_eq!(
            runner.issued_privileged.borrow().as_slice(),
            ["settings put global k1 1"]
        );
    }

    #[test]
    fn test_setting_read_back_rescues_silent_write() {
        // Write path returns nothing, but the read-back shows the value took.
        let mut runner = ScriptedRunner::new();
        runner.script("settings get global k1", "1");
        let outcomes = enforce(
            &catalog_with_setting("k1", "1"),
            &runner,
            &MemorySink::new(16),
        );
        assert!(outcomes[0].success);
    }

    #[test]
    fn test_setting_write_failure() {
        let runner = ScriptedRunner::without_root();
        let outcomes = enforce(
            &catalog_with_setting("k1", "1"),
            &runner,
            &MemorySink::new(16),
        );
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[0].detail, "settings write failed");
    }

    #[test]
    fn test_cloud_single_ops_success_phrases() {
        let mut runner = ScriptedRunner::new();
        let events = MemorySink::new(16);
        runner.script(
            "pm disable-user --user 0 c.x",
            "Package c.x new state: disabled-user",
        );
        runner.script("pm enable c.x", "Package c.x new state: enabled");
        runner.script("pm uninstall -k --user 0 c.x", "Success");

        assert!(disable_package(&runner, &events, "c.x"));
        assert!(enable_package(&runner, &events, "c.x"));
        assert!(uninstall_package(&runner, &events, "c.x"));
    }

    #[test]
    fn test_cloud_uninstall_requires_success_token() {
        let mut runner = ScriptedRunner::new();
        runner.script("pm uninstall -k --user 0 c.x", "Failure [DELETE_FAILED]");
        assert!(!uninstall_package(&runner, &MemorySink::new(4), "c.x"));
    }
}
