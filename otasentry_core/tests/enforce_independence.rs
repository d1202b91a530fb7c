//! Enforcement never short-circuits: one failing target must not affect the
//! attempts or outcomes of the others.

use otasentry_core::catalog::{Catalog, MonitoredPackage};
use otasentry_core::enforce::enforce;
use otasentry_core::events::MemorySink;
use otasentry_core::executor::ScriptedRunner;

fn five_package_catalog() -> Catalog {
    Catalog {
        packages: (1..=5)
            .map(|n| MonitoredPackage {
                id: format!("pkg.{}", n),
                label: format!("Package {}", n),
                description: String::new(),
            })
            .collect(),
        settings: Vec::new(),
        disabled_state_codes: vec![2, 3, 4],
    }
}

#[test]
fn test_middle_failure_does_not_abort_remaining_targets() {
    let mut runner = ScriptedRunner::new();
    // pkg.3 left unscripted, so its mutation fails.
    for n in [1, 2, 4, 5] {
        runner.script(
            &format!("pm disable pkg.{}", n),
            &format!("Package pkg.{} new state: disabled", n),
        );
    }

    let outcomes = enforce(&five_package_catalog(), &runner, &MemorySink::new(64));

    assert_eq!(outcomes.len(), 5);
    assert!(outcomes[0].success);
    assert!(outcomes[1].success);
    assert!(!outcomes[2].success);
    assert!(outcomes[3].success);
    assert!(outcomes[4].success);

    // Exactly one mutation attempt per target, in catalog order.
    let issued = runner.issued_privileged.borrow();
    let expected: Vec<String> = (1..=5).map(|n| format!("pm disable pkg.{}", n)).collect();
    assert_eq!(issued.as_slice(), expected.as_slice());
}

#[test]
fn test_total_failure_still_reports_every_target() {
    let runner = ScriptedRunner::without_root();
    let outcomes = enforce(&five_package_catalog(), &runner, &MemorySink::new(64));

    assert_eq!(outcomes.len(), 5);
    assert!(outcomes.iter().all(|o| !o.success));
}
