//! Real-process timeout behavior of the command executor, run against plain
//! `sh` in place of the elevation shell.

use otasentry_core::executor::{CommandRunner, SuRunner};
use std::time::{Duration, Instant};

#[test]
fn test_timeout_returns_none_within_bound() {
    let runner = SuRunner::with_elevation("sh", Duration::from_secs(1));

    let started = Instant::now();
    let result = runner.run_privileged("sleep 10");
    let elapsed = started.elapsed();

    assert_eq!(result, None);
    assert!(
        elapsed < Duration::from_secs(4),
        "caller must not hang past the timeout bound (took {:?})",
        elapsed
    );
}

#[test]
fn test_timed_out_child_is_terminated() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("survived");
    let command = format!("sleep 2 && touch {}", marker.display());

    let runner = SuRunner::with_elevation("sh", Duration::from_secs(1));
    assert_eq!(runner.run_privileged(&command), None);

    // Were the child still alive it would create the marker at ~2s.
    std::thread::sleep(Duration::from_millis(2500));
    assert!(
        !marker.exists(),
        "child kept running after forced termination"
    );
}

#[test]
fn test_fast_command_completes_under_generous_timeout() {
    let runner = SuRunner::with_elevation("sh", Duration::from_secs(10));
    assert_eq!(runner.run_privileged("echo uid=0(root)").as_deref(), Some("uid=0(root)"));
}
