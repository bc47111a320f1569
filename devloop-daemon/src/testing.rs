//! Recording fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use devloop_core::CommandSpec;

use crate::error::DaemonError;
use crate::supervisor::ProcessFacility;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build(String),
    Launch(String),
    Kill(u32),
}

/// Blocks launches until opened.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock().expect("gate lock") = true;
        self.changed.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().expect("gate lock");
        while !*open {
            open = self.changed.wait(open).expect("gate wait");
        }
    }
}

pub struct FakeFacility {
    calls: Mutex<Vec<Call>>,
    next_pid: AtomicU32,
    failing_launches: AtomicUsize,
    fail_builds: AtomicBool,
    fail_kills: AtomicBool,
    launches_entered: AtomicUsize,
    gate_from: AtomicUsize,
    pub gate: Gate,
}

impl FakeFacility {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_pid: AtomicU32::new(4000),
            failing_launches: AtomicUsize::new(0),
            fail_builds: AtomicBool::new(false),
            fail_kills: AtomicBool::new(false),
            launches_entered: AtomicUsize::new(0),
            gate_from: AtomicUsize::new(usize::MAX),
            gate: Gate::default(),
        }
    }

    /// Launch number `n` (0-based) and every later one blocks on [`Self::gate`].
    pub fn gated_from(self, n: usize) -> Self {
        self.gate_from.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_next_launches(&self, n: usize) {
        self.failing_launches.store(n, Ordering::SeqCst);
    }

    pub fn fail_builds(&self, fail: bool) {
        self.fail_builds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_kills(&self, fail: bool) {
        self.fail_kills.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn launch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Launch(_)))
            .count()
    }

    pub fn launches_entered(&self) -> usize {
        self.launches_entered.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` launches have begun, or panic after a while.
    pub async fn wait_for_launches(&self, n: usize) {
        for _ in 0..500 {
            if self.launches_entered() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {n} launches to begin, saw {}",
            self.launches_entered()
        );
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl ProcessFacility for FakeFacility {
    fn run_to_completion(&self, command: &str) -> Result<(), DaemonError> {
        self.record(Call::Build(command.to_string()));
        if self.fail_builds.load(Ordering::SeqCst) {
            return Err(DaemonError::Runtime(format!("build `{command}` failed")));
        }
        Ok(())
    }

    fn launch(
        &self,
        target: &CommandSpec,
        tracked: &Arc<AtomicU32>,
    ) -> Result<u32, DaemonError> {
        let index = self.launches_entered.fetch_add(1, Ordering::SeqCst);
        if index >= self.gate_from.load(Ordering::SeqCst) {
            self.gate.wait();
        }
        self.record(Call::Launch(target.to_string()));

        let failing = self.failing_launches.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_launches.store(failing - 1, Ordering::SeqCst);
            return Err(DaemonError::Spawn {
                command: target.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        tracked.store(pid, Ordering::SeqCst);
        Ok(pid)
    }

    fn kill(&self, pid: u32) -> Result<(), DaemonError> {
        self.record(Call::Kill(pid));
        if self.fail_kills.load(Ordering::SeqCst) {
            return Err(DaemonError::Kill {
                pid,
                source: nix::errno::Errno::ESRCH,
            });
        }
        Ok(())
    }
}
