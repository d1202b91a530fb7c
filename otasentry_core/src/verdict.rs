//! Aggregate evaluation of the catalogs into status snapshots.
//!
//! Probe order within one call is deterministic: root check, interception
//! check, then catalog order. Sequential root-command invocations dominate
//! latency; callers push whole cycles onto their own threads.

use crate::catalog::{Catalog, CloudCatalog};
use crate::events::{EventLevel, EventSink};
use crate::executor::CommandRunner;
use crate::interception::InterceptionLayer;
use crate::probe::{probe_package, probe_setting};
use crate::types::{CloudPackageStatus, CloudSnapshot, StatusSnapshot};
use chrono::Utc;
use std::collections::HashSet;

/// One root-availability probe: elevated `id` reporting the superuser UID.
pub fn check_root(runner: &dyn CommandRunner) -> bool {
    runner
        .run_privileged("id")
        .map(|output| output.contains("uid=0"))
        .unwrap_or(false)
}

/// Probes every catalog target and produces the status snapshot. Exactly one
/// result per catalog entry, in catalog order.
pub fn evaluate(
    catalog: &Catalog,
    runner: &dyn CommandRunner,
    interception: &dyn InterceptionLayer,
    events: &dyn EventSink,
) -> StatusSnapshot {
    events.emit(EventLevel::Info, "[CHECK] starting protection check");

    let has_root = check_root(runner);
    events.emit(
        EventLevel::Info,
        &format!(
            "[CHECK] root access: {}",
            if has_root { "available" } else { "unavailable" }
        ),
    );

    let interception_active = interception.is_active();
    events.emit(
        EventLevel::Info,
        &format!(
            "[CHECK] interception layer: {}",
            if interception_active { "active" } else { "inactive" }
        ),
    );

    let packages: Vec<_> = catalog
        .packages
        .iter()
        .map(|pkg| {
            let status = probe_package(runner, pkg, &catalog.disabled_state_codes);
            let level = if status.compliant {
                EventLevel::Info
            } else {
                EventLevel::Warn
            };
            events.emit(
                level,
                &format!("[CHECK] {} ({}): {}", status.label, status.id, status.raw_state),
            );
            status
        })
        .collect();

    let settings: Vec<_> = catalog
        .settings
        .iter()
        .map(|setting| {
            let status = probe_setting(runner, setting);
            if status.compliant {
                events.emit(
                    EventLevel::Info,
                    &format!("[CHECK] {}: current={}", status.label, status.current_value),
                );
            } else {
                events.emit(
                    EventLevel::Warn,
                    &format!(
                        "[CHECK] {}: current={}, expected={}",
                        status.label, status.current_value, status.expected_value
                    ),
                );
            }
            status
        })
        .collect();

    let overall_compliant =
        packages.iter().all(|p| p.compliant) && settings.iter().all(|s| s.compliant);
    events.emit(
        if overall_compliant {
            EventLevel::Info
        } else {
            EventLevel::Warn
        },
        if overall_compliant {
            "[CHECK] complete: all protections in place"
        } else {
            "[CHECK] complete: unblocked update channels remain"
        },
    );

    StatusSnapshot {
        has_root,
        interception_active,
        overall_compliant,
        captured_at: Utc::now().timestamp_millis(),
        packages,
        settings,
    }
}

/// Scans the classified cloud-component catalog.
///
/// One privileged disabled-package listing plus one unprivileged installed
/// listing cover the whole catalog; entries not installed on the device are
/// omitted. Without root the scan degrades to an empty package list so bulk
/// candidacy is never computed from a lower-fidelity source.
pub fn scan_cloud(
    catalog: &CloudCatalog,
    runner: &dyn CommandRunner,
    events: &dyn EventSink,
) -> CloudSnapshot {
    events.emit(EventLevel::Info, "[CLOUD] scanning cloud components");

    let has_root = check_root(runner);
    if !has_root {
        events.emit(EventLevel::Error, "[CLOUD] no root access, scan skipped");
        return CloudSnapshot {
            has_root: false,
            captured_at: Utc::now().timestamp_millis(),
            packages: Vec::new(),
        };
    }

    let disabled: HashSet<String> = runner
        .run_privileged("pm list packages -d")
        .map(|output| parse_package_listing(&output))
        .unwrap_or_default();

    let installed: HashSet<String> = runner
        .run_unprivileged("pm list packages")
        .map(|output| parse_package_listing(&output))
        .unwrap_or_default();

    let packages: Vec<_> = catalog
        .packages
        .iter()
        .filter(|known| installed.contains(&known.id))
        .map(|known| {
            let compliant = disabled.contains(&known.id);
            CloudPackageStatus {
                id: known.id.clone(),
                label: known.label.clone(),
                description: known.description.clone(),
                category: known.category,
                safe_to_disable: known.safe_to_disable,
                compliant,
                raw_state: if compliant { "disabled" } else { "enabled" }.to_string(),
            }
        })
        .collect();

    let snapshot = CloudSnapshot {
        has_root: true,
        captured_at: Utc::now().timestamp_millis(),
        packages,
    };
    events.emit(
        EventLevel::Info,
        &format!(
            "[CLOUD] scan complete: {} components, {} disabled, {} safe to disable",
            snapshot.packages.len(),
            snapshot.disabled_count(),
            snapshot.safe_count()
        ),
    );
    snapshot
}

fn parse_package_listing(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(|id| id.trim().to_string())
        .collect()
}
