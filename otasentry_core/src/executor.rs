//! Privileged command execution under a hard timeout.
//!
//! The public boundary is deliberately narrow: one command line in, trimmed
//! text or `None` out. Every failure mode collapses to `None`; the internal
//! `ExecFailure` taxonomy exists for logging only and never crosses the
//! component boundary.

use crossbeam_channel::bounded;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(thiserror::Error, Debug)]
enum ExecFailure {
    #[error("elevated identity unavailable or process spawn failed: {0}")]
    Spawn(std::io::Error),

    #[error("command timed out after {0:?}, child killed")]
    Timeout(Duration),

    #[error("i/o fault while waiting on child: {0}")]
    Io(std::io::Error),
}

/// Command boundary used by the probe, verdict and enforcement engines.
pub trait CommandRunner {
    /// Runs one command line under the elevated identity. `Some` on success,
    /// including empty-but-present output (trimmed); `None` on any failure.
    /// Callers must not assume absence of side effects on `None` — a timed-out
    /// command may have partially executed.
    fn run_privileged(&self, command: &str) -> Option<String>;

    /// Runs one command line as the current (unprivileged) identity.
    fn run_unprivileged(&self, command: &str) -> Option<String>;
}

/// Real runner that forks `<elevation> -c <command>` for privileged calls
/// and `sh -c <command>` for unprivileged ones.
pub struct SuRunner {
    elevation: String,
    timeout: Duration,
}

impl Default for SuRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SuRunner {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            elevation: "su".to_string(),
            timeout,
        }
    }

    /// Substitutes the elevation program. Tests run against plain `sh`.
    pub fn with_elevation(program: &str, timeout: Duration) -> Self {
        Self {
            elevation: program.to_string(),
            timeout,
        }
    }

    fn exec(&self, program: &str, command: &str) -> Result<String, ExecFailure> {
        let mut child = Command::new(program)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ExecFailure::Spawn)?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecFailure::Io(std::io::Error::other(
                    "child stdout was not captured",
                )));
            }
        };

        // Reader thread drains stdout so the child never blocks on a full
        // pipe; the bounded channel hands the captured text back once the
        // child exits.
        let (sender, receiver) = bounded(1);
        thread::spawn(move || {
            let mut stdout = stdout;
            let mut output = String::new();
            let _ = stdout.read_to_string(&mut output);
            let _ = sender.send(output);
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_status)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        // Forced termination is the only cancellation
                        // mechanism; reap the child so no handle leaks.
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ExecFailure::Timeout(self.timeout));
                    }
                    thread::sleep(Duration::from_millis(25));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExecFailure::Io(e));
                }
            }
        }

        // The child has exited, so its stdout is closed and the reader
        // thread finishes promptly.
        match receiver.recv_timeout(Duration::from_secs(2)) {
            Ok(output) => Ok(output.trim().to_string()),
            Err(_) => Ok(String::new()),
        }
    }

    fn run(&self, program: &str, command: &str) -> Option<String> {
        match self.exec(program, command) {
            Ok(output) => Some(output),
            Err(e) => {
                log::warn!("[EXEC] '{}' via {}: {}", command, program, e);
                None
            }
        }
    }
}

impl CommandRunner for SuRunner {
    fn run_privileged(&self, command: &str) -> Option<String> {
        self.run(&self.elevation, command)
    }

    fn run_unprivileged(&self, command: &str) -> Option<String> {
        self.run("sh", command)
    }
}

/// Mock runner mapping exact command lines to canned replies. Unscripted
/// commands fail (`None`), which doubles as the privilege-unavailable case.
/// Every issued command is recorded for assertions.
#[derive(Default)]
pub struct ScriptedRunner {
    privileged: HashMap<String, String>,
    unprivileged: HashMap<String, String>,
    root_available: bool,
    pub issued_privileged: RefCell<Vec<String>>,
    pub issued_unprivileged: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            root_available: true,
            ..Self::default()
        }
    }

    /// Runner for a device with no elevated privilege at all: every
    /// privileged command fails regardless of scripting.
    pub fn without_root() -> Self {
        Self::default()
    }

    pub fn script(&mut self, command: &str, reply: &str) {
        self.privileged
            .insert(command.to_string(), reply.to_string());
    }

    pub fn script_unprivileged(&mut self, command: &str, reply: &str) {
        self.unprivileged
            .insert(command.to_string(), reply.to_string());
    }

    pub fn privileged_count(&self) -> usize {
        self.issued_privileged.borrow().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run_privileged(&self, command: &str) -> Option<String> {
        self.issued_privileged.borrow_mut().push(command.to_string());
        if !self.root_available {
            return None;
        }
        self.privileged.get(command).cloned()
    }

    fn run_unprivileged(&self, command: &str) -> Option<String> {
        self.issued_unprivileged
            .borrow_mut()
            .push(command.to_string());
        self.unprivileged.get(command).cloned()
    }
}
