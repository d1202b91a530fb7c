//! Live write-interception collaborator contract.
//!
//! The engine does not implement interception itself. A host integration
//! that provides it must live inside the privileged system process and:
//!
//! - rewrite any attempted write to a monitored setting key back to the
//!   policy-expected value before it takes effect, and
//! - veto any attempted re-enablement of a monitored package.
//!
//! The engine's only view of that mechanism is `is_active()`. The flag is
//! untrusted external input: it can flip between calls, and `false` never
//! means policy is violated — only that the probe/enforce cycle is the sole
//! protection. A cached snapshot whose recorded flag disagrees with the
//! current one must be invalidated (see `cache::assess_cache`).

pub trait InterceptionLayer {
    /// True only when the interception mechanism has successfully attached
    /// inside the host process.
    fn is_active(&self) -> bool;
}

/// No interception host present; the engine runs enforce-on-schedule only.
pub struct Detached;

impl InterceptionLayer for Detached {
    fn is_active(&self) -> bool {
        false
    }
}

/// Fixed activation flag, for tests and for hosts that resolve activation
/// out of band.
pub struct FixedFlag(pub bool);

impl InterceptionLayer for FixedFlag {
    fn is_active(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_is_inactive() {
        assert!(!Detached.is_active());
    }

    #[test]
    fn test_fixed_flag() {
        assert!(FixedFlag(true).is_active());
        assert!(!FixedFlag(false).is_active());
    }
}
