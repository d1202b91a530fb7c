//! Latest-snapshot persistence and the cache-trust decision.
//!
//! One single-slot row per policy variant; `save` is a wholesale atomic
//! replace and `load` treats any corrupt or missing entry as a cache miss.
//! The trust heuristic is a pure function of the cached snapshot and the
//! live interception flag, modeled as an explicit enum so it stays testable.

use crate::types::{CloudSnapshot, StatusSnapshot};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const STATUS_SLOT: &str = "ota_status_v1";
const CLOUD_SLOT: &str = "cloud_status_v1";

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("snapshot database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a cached snapshot may or may not be trusted as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheValidity {
    /// Nothing cached; a fresh evaluation is required.
    NoCache,
    /// Cached snapshot can stand in for a fresh evaluation.
    Trusted,
    /// The interception layer's activation state changed since capture.
    StaleInterceptionChanged,
    /// The capture itself was non-compliant or taken without root.
    StalePriorNoncompliance,
}

/// Trust decision per the consumer contract: a cached snapshot is current
/// only when it was fully compliant with root at capture time AND the
/// interception activation state has not changed since. An interception
/// flip invalidates regardless of the prior verdict, so it is checked first.
pub fn assess_cache(
    cached: Option<&StatusSnapshot>,
    interception_active_now: bool,
) -> CacheValidity {
    match cached {
        None => CacheValidity::NoCache,
        Some(s) if s.interception_active != interception_active_now => {
            CacheValidity::StaleInterceptionChanged
        }
        Some(s) if !(s.overall_compliant && s.has_root) => {
            CacheValidity::StalePriorNoncompliance
        }
        Some(_) => CacheValidity::Trusted,
    }
}

fn cache_db_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join("otasentry");
        let _ = std::fs::create_dir_all(&app_dir);
        return app_dir.join("snapshot_cache.db");
    }
    PathBuf::from("snapshot_cache.db")
}

pub struct SnapshotCache {
    conn: Connection,
}

impl SnapshotCache {
    /// Opens the per-user cache database, creating it if needed.
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open(cache_db_path())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CacheError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshot_slots (
                slot TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn save_status(&self, snapshot: &StatusSnapshot) -> Result<(), CacheError> {
        self.save_slot(STATUS_SLOT, serde_json::to_string(snapshot)?)
    }

    /// Reads back the latest OTA status snapshot. Corrupt or missing rows
    /// are a cache miss, never a partial reconstruction.
    pub fn load_status(&self) -> Option<StatusSnapshot> {
        let payload = self.load_slot(STATUS_SLOT)?;
        serde_json::from_str(&payload).ok()
    }

    pub fn save_cloud(&self, snapshot: &CloudSnapshot) -> Result<(), CacheError> {
        self.save_slot(CLOUD_SLOT, serde_json::to_string(snapshot)?)
    }

    pub fn load_cloud(&self) -> Option<CloudSnapshot> {
        let payload = self.load_slot(CLOUD_SLOT)?;
        serde_json::from_str(&payload).ok()
    }

    fn save_slot(&self, slot: &str, payload: String) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot_slots (slot, payload, saved_at)
             VALUES (?1, ?2, ?3)",
            params![slot, payload, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn load_slot(&self, slot: &str) -> Option<String> {
        self.conn
            .query_row(
                "SELECT payload FROM snapshot_slots WHERE slot = ?1",
                params![slot],
                |row| row.get(0),
            )
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CloudPackageStatus, PackageStatus};
    use crate::catalog::CloudCategory;

    fn snapshot(compliant: bool, root: bool, interception: bool) -> StatusSnapshot {
        StatusSnapshot {
            has_root: root,
            interception_active: interception,
            overall_compliant: compliant,
            captured_at: 1_720_000_000_000,
            packages: vec![PackageStatus {
                id: "com.x".to_string(),
                label: "X".to_string(),
                description: String::new(),
                compliant,
                raw_state: "disabled (state=2)".to_string(),
            }],
            settings: Vec::new(),
        }
    }

    #[test]
    fn test_assess_no_cache() {
        assert_eq!(assess_cache(None, false), CacheValidity::NoCache);
    }

    #[test]
    fn test_assess_trusted() {
        let cached = snapshot(true, true, false);
        assert_eq!(assess_cache(Some(&cached), false), CacheValidity::Trusted);
    }

    #[test]
    fn test_assess_interception_flip_invalidates() {
        let cached = snapshot(true, true, false);
        assert_eq!(
            assess_cache(Some(&cached), true),
            CacheValidity::StaleInterceptionChanged
        );
        // The flip wins even when the capture was also non-compliant.
        let cached = snapshot(false, true, true);
        assert_eq!(
            assess_cache(Some(&cached), false),
            CacheValidity::StaleInterceptionChanged
        );
    }

    #[test]
    fn test_assess_prior_noncompliance() {
        let cached = snapshot(false, true, false);
        assert_eq!(
            assess_cache(Some(&cached), false),
            CacheValidity::StalePriorNoncompliance
        );
        // Compliant but captured without root is equally untrusted.
        let cached = snapshot(true, false, false);
        assert_eq!(
            assess_cache(Some(&cached), false),
            CacheValidity::StalePriorNoncompliance
        );
    }

    #[test]
    fn test_status_round_trip() {
        let cache = SnapshotCache::open_in_memory().unwrap();
        let original = snapshot(true, true, true);
        cache.save_status(&original).unwrap();
        assert_eq!(cache.load_status(), Some(original));
    }

    #[test]
    fn test_save_is_wholesale_replace() {
        let cache = SnapshotCache::open_in_memory().unwrap();
        cache.save_status(&snapshot(false, true, false)).unwrap();
        let replacement = snapshot(true, true, false);
        cache.save_status(&replacement).unwrap();
        assert_eq!(cache.load_status(), Some(replacement));
    }

    #[test]
    fn test_slots_are_independent() {
        let cache = SnapshotCache::open_in_memory().unwrap();
        cache.save_status(&snapshot(true, true, false)).unwrap();
        assert!(cache.load_cloud().is_none());

        let cloud = CloudSnapshot {
            has_root: true,
            captured_at: 1,
            packages: vec![CloudPackageStatus {
                id: "c.x".to_string(),
                label: "C".to_string(),
                description: String::new(),
                category: CloudCategory::Telemetry,
                safe_to_disable: true,
                compliant: false,
                raw_state: "enabled".to_string(),
            }],
        };
        cache.save_cloud(&cloud).unwrap();
        assert_eq!(cache.load_cloud(), Some(cloud));
        assert!(cache.load_status().is_some());
    }

    #[test]
    fn test_empty_cache_misses() {
        let cache = SnapshotCache::open_in_memory().unwrap();
        assert!(cache.load_status().is_none());
        assert!(cache.load_cloud().is_none());
    }

    #[test]
    fn test_corrupt_payload_is_cache_miss() {
        let cache = SnapshotCache::open_in_memory().unwrap();
        cache
            .save_slot(STATUS_SLOT, "{not json at all".to_string())
            .unwrap();
        assert!(cache.load_status().is_none());
    }
}
