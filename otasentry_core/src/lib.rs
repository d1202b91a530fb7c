// Core engine for OTA Sentry: probes device protection state, computes an
// aggregate verdict, enforces the lockdown policy and caches the latest snapshot.

pub mod cache;
pub mod catalog;
pub mod enforce;
pub mod events;
pub mod executor;
pub mod interception;
pub mod probe;
pub mod types;
pub mod verdict;

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        assert_eq!(get_version(), "0.1.0");
    }
}
