use crate::catalog::CloudCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probe result for one monitored package.
///
/// `raw_state` is a diagnostic string recording which probing strategy
/// produced the answer and what value it saw; it is never interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStatus {
    pub id: String,
    pub label: String,
    pub description: String,
    pub compliant: bool,
    pub raw_state: String,
}

/// Probe result for one monitored global setting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingStatus {
    pub key: String,
    pub label: String,
    pub description: String,
    pub current_value: String,
    pub expected_value: String,
    pub compliant: bool,
}

/// One immutable, timestamped evaluation covering the whole OTA catalog.
///
/// Invariant: `overall_compliant` is the conjunction of every package and
/// setting `compliant` flag. The verdict engine is the only constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub has_root: bool,
    pub interception_active: bool,
    pub overall_compliant: bool,
    /// Capture time, epoch milliseconds.
    pub captured_at: i64,
    pub packages: Vec<PackageStatus>,
    pub settings: Vec<SettingStatus>,
}

/// Probe result for one classified third-party cloud component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudPackageStatus {
    pub id: String,
    pub label: String,
    pub description: String,
    pub category: CloudCategory,
    pub safe_to_disable: bool,
    pub compliant: bool,
    pub raw_state: String,
}

/// Scan result over the classified cloud-component catalog.
///
/// Without root the scan cannot run; `packages` is then empty and
/// `has_root` is false.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSnapshot {
    pub has_root: bool,
    pub captured_at: i64,
    pub packages: Vec<CloudPackageStatus>,
}

impl CloudSnapshot {
    pub fn disabled_count(&self) -> usize {
        self.packages.iter().filter(|p| p.compliant).count()
    }

    pub fn safe_count(&self) -> usize {
        self.packages.iter().filter(|p| p.safe_to_disable).count()
    }
}

/// Per-target result of one enforcement attempt. Transient; surfaced to the
/// operator and discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnforcementOutcome {
    pub target: String,
    pub success: bool,
    pub detail: String,
}

impl fmt::Display for EnforcementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.detail)
    }
}
