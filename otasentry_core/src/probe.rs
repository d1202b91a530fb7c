//! Probing strategies for monitored packages and settings.
//!
//! Package state is resolved through an ordered chain: a privileged
//! structured query first, the privileged disabled-package listing second,
//! and an unprivileged package-manager lookup last. Each strategy is tried
//! only when the previous one produced no conclusive answer, so the probe
//! stays partially useful even with zero elevated privilege.

use crate::catalog::{MonitoredPackage, MonitoredSetting};
use crate::executor::CommandRunner;
use crate::types::{PackageStatus, SettingStatus};

pub fn probe_package(
    runner: &dyn CommandRunner,
    pkg: &MonitoredPackage,
    disabled_codes: &[u32],
) -> PackageStatus {
    let (compliant, raw_state) = package_state(runner, &pkg.id, disabled_codes);
    PackageStatus {
        id: pkg.id.clone(),
        label: pkg.label.clone(),
        description: pkg.description.clone(),
        compliant,
        raw_state,
    }
}

fn package_state(runner: &dyn CommandRunner, id: &str, disabled_codes: &[u32]) -> (bool, String) {
    // Strategy 1: structured query of the package's runtime flags. Most
    // precise, but occasionally returns no matching line.
    let dump_cmd = format!("pm dump {} | grep -m1 'pkgFlags\\|enabled='", id);
    if let Some(output) = runner.run_privileged(&dump_cmd) {
        if let Some(code) = parse_enabled_code(&output) {
            return if disabled_codes.contains(&code) {
                (true, format!("disabled (state={})", code))
            } else {
                (false, format!("enabled (state={})", code))
            };
        }
    }

    // Strategy 2: membership in the disabled-package listing. Coarser, but
    // conclusive either way whenever the listing is available.
    if let Some(output) = runner.run_privileged("pm list packages -d") {
        return if lists_package(&output, id) {
            (true, "disabled-user (listing)".to_string())
        } else {
            (false, "enabled (listing)".to_string())
        };
    }

    // Strategy 3: unprivileged package-manager lookup. A package absent from
    // the system is compliant — there is nothing to exploit.
    match runner.run_unprivileged(&format!("pm list packages {}", id)) {
        Some(all) if !lists_package(&all, id) => (true, "not-found".to_string()),
        Some(_) => match runner.run_unprivileged(&format!("pm list packages -e {}", id)) {
            Some(enabled) if lists_package(&enabled, id) => (false, "enabled (pm)".to_string()),
            Some(_) => (true, "disabled (pm)".to_string()),
            None => (false, "unknown".to_string()),
        },
        None => (false, "unknown".to_string()),
    }
}

fn parse_enabled_code(output: &str) -> Option<u32> {
    let re = regex::Regex::new(r"enabled=(\d+)").ok()?;
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Exact line match against `pm list packages` output; substring matching
/// would confuse `com.foo` with `com.foo.bar`.
fn lists_package(output: &str, id: &str) -> bool {
    let needle = format!("package:{}", id);
    output.lines().any(|line| line.trim() == needle)
}

pub fn probe_setting(runner: &dyn CommandRunner, setting: &MonitoredSetting) -> SettingStatus {
    let current = read_global_setting(runner, &setting.key);
    SettingStatus {
        key: setting.key.clone(),
        label: setting.label.clone(),
        description: format!("settings get global {}", setting.key),
        compliant: current == setting.expected,
        current_value: current,
        expected_value: setting.expected.clone(),
    }
}

/// Privileged settings-store read with an unprivileged fallback on an
/// empty or literal "null" reply. Also used by enforcement read-backs.
pub(crate) fn read_global_setting(runner: &dyn CommandRunner, key: &str) -> String {
    let cmd = format!("settings get global {}", key);
    if let Some(value) = runner.run_privileged(&cmd) {
        if !value.is_empty() && value != "null" {
            return value;
        }
    }
    match runner.run_unprivileged(&cmd) {
        Some(value) if !value.is_empty() => value,
        Some(_) => "null".to_string(),
        None => "error".to_string(),
    }
}
