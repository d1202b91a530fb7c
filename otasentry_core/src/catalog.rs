//! Static catalogs of monitored targets.
//!
//! Catalogs are external configuration: loaded once from YAML (or taken from
//! the built-in defaults) and consumed read-only for the rest of the run.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A package whose enabled state is governed by policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredPackage {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// A global setting key with its policy-expected value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredSetting {
    pub key: String,
    pub label: String,
    pub expected: String,
}

fn default_disabled_codes() -> Vec<u32> {
    // Observed pm enabled-state codes: 2=disabled, 3=disabled-user,
    // 4=disabled-until-used. Platform-version specific; override per build.
    vec![2, 3, 4]
}

/// The OTA-blocking policy catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub packages: Vec<MonitoredPackage>,
    #[serde(default)]
    pub settings: Vec<MonitoredSetting>,
    #[serde(default = "default_disabled_codes")]
    pub disabled_state_codes: Vec<u32>,
}

impl Catalog {
    /// Default catalog covering the stock OTA channels.
    pub fn builtin_ota() -> Self {
        let packages = [
            (
                "com.oplus.ota",
                "System OTA updater",
                "Primary update service: detects, downloads and installs system updates",
            ),
            (
                "com.oplus.cota",
                "Component silent updater",
                "Pushes small component updates silently in the background",
            ),
            (
                "com.oplus.romupdate",
                "ROM update service",
                "Background service for ROM firmware updates",
            ),
            (
                "com.oplus.upgradeguide",
                "Upgrade guide",
                "System upgrade onboarding and prompt UI",
            ),
            (
                "com.google.android.configupdater",
                "Google config updater",
                "Automatic configuration updates for the Google services framework",
            ),
        ]
        .into_iter()
        .map(|(id, label, description)| MonitoredPackage {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
        })
        .collect();

        let settings = [
            ("ota_disable_automatic_update", "Block automatic OTA updates", "1"),
            ("auto_download_network_type", "Auto-download network type", "0"),
            ("can_update_at_night", "Nightly automatic updates", "0"),
        ]
        .into_iter()
        .map(|(key, label, expected)| MonitoredSetting {
            key: key.to_string(),
            label: label.to_string(),
            expected: expected.to_string(),
        })
        .collect();

        Self {
            packages,
            settings,
            disabled_state_codes: default_disabled_codes(),
        }
    }
}

/// Classification of a cloud component by what it does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloudCategory {
    Telemetry,
    CloudService,
    BehaviorAnalytics,
    DataReport,
    RemoteControl,
}

impl CloudCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CloudCategory::Telemetry => "Telemetry",
            CloudCategory::CloudService => "Cloud service",
            CloudCategory::BehaviorAnalytics => "Behavior analytics",
            CloudCategory::DataReport => "Data reporting",
            CloudCategory::RemoteControl => "Remote control",
        }
    }
}

/// A catalog entry for a classified third-party cloud component.
///
/// `safe_to_disable` is a static fact about the entry, never derived from
/// runtime state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPackage {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub category: CloudCategory,
    pub safe_to_disable: bool,
}

/// The cloud-control policy catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudCatalog {
    pub packages: Vec<ClassifiedPackage>,
}

impl CloudCatalog {
    /// Default catalog of known cloud components. Deployments extend this
    /// through a YAML catalog; the built-in set covers the common ones.
    pub fn builtin() -> Self {
        use CloudCategory::*;
        let packages = [
            ("com.oplus.statistics", "Usage statistics service", Telemetry, "Collects and uploads usage data", true),
            ("com.oplus.statistics.rom", "ROM statistics service", Telemetry, "ROM-level usage statistics upload", true),
            ("com.oplus.crashbox", "Crash collection service", Telemetry, "Uploads crash logs", true),
            ("com.oplus.onetrace", "OneTrace tracing", Telemetry, "System runtime tracing upload", true),
            ("com.coloros.bootreg", "Boot registration service", Telemetry, "Reports device information at boot", true),
            ("com.heytap.cloud", "Cloud backup service", CloudService, "Cloud backup and sync; disabling breaks cloud backup", false),
            ("com.oplus.ocloud", "Cloud sync service", CloudService, "Data cloud sync; disabling breaks sync", false),
            ("com.heytap.market", "Vendor app store", CloudService, "Built-in app store, replaceable by another store", true),
            ("com.heytap.browser", "Vendor browser", CloudService, "Built-in browser that reports browsing data", true),
            ("com.heytap.pictorial", "Magazine lockscreen", CloudService, "Downloads lockscreen wallpapers from the cloud", true),
            ("com.oplus.deepthinker", "Behavior prediction engine", BehaviorAnalytics, "AI behavior prediction; disabling may affect smart features", false),
            ("com.oplus.appdetail", "App usage analytics", BehaviorAnalytics, "Analyzes application usage habits", true),
            ("com.oplus.uxdesign", "UX behavior collection", BehaviorAnalytics, "Collects user-experience data", true),
            ("com.oplus.atlas", "Behavior profile graph", BehaviorAnalytics, "User behavior profiling graph", true),
            ("com.oplus.logkit", "Log collection suite", DataReport, "Uploads system logs", true),
            ("com.coloros.athena", "Athena data engine", DataReport, "Vendor data-analysis platform", true),
            ("com.oplus.dmp", "Data management platform", DataReport, "DMP user-profile data", true),
            ("com.oplus.networksense", "Network sensing service", DataReport, "Collects and reports network state", true),
            ("com.oplus.epona", "Remote management channel", RemoteControl, "Remote configuration push; disabling blocks remote control", true),
            ("com.oplus.customize", "Remote customization service", RemoteControl, "Remote customization push", true),
            ("com.oplus.remotecontrol", "Remote control service", RemoteControl, "Remote device control entry point", true),
            ("com.heytap.mcs", "Vendor push service", RemoteControl, "Vendor push channel; disabling breaks vendor notifications", false),
        ]
        .into_iter()
        .map(|(id, label, category, description, safe)| ClassifiedPackage {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            category,
            safe_to_disable: safe,
        })
        .collect();

        Self { packages }
    }
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let catalog: Catalog = serde_yaml::from_reader(reader)?;
    Ok(catalog)
}

pub fn load_cloud_catalog<P: AsRef<Path>>(path: P) -> Result<CloudCatalog, CatalogError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let catalog: CloudCatalog = serde_yaml::from_reader(reader)?;
    Ok(catalog)
}
