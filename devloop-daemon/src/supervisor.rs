//! Ownership of the single tracked child process.

use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use devloop_core::{BuildStep, CommandSpec, DevLoopConfig};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::error::DaemonError;
use crate::paths::BUILD_SHELL;

/// The external process facility: run a build, launch a target, kill a pid.
pub trait ProcessFacility: Send + Sync {
    /// Run a shell command line to completion; `Ok` only on a zero exit.
    fn run_to_completion(&self, command: &str) -> Result<(), DaemonError>;

    /// Launch `target` without waiting for it and return its pid.
    ///
    /// The pid is stored into `tracked` before the child can be reaped. If
    /// the child later exits on its own, `tracked` is reset to `0` provided
    /// it still holds that pid.
    fn launch(
        &self,
        target: &CommandSpec,
        tracked: &Arc<AtomicU32>,
    ) -> Result<u32, DaemonError>;

    /// Forcefully terminate `pid`.
    fn kill(&self, pid: u32) -> Result<(), DaemonError>;
}

/// [`ProcessFacility`] over `std::process` and SIGKILL.
///
/// Children inherit stdout/stderr. Each launched child gets a reaper thread
/// that waits on it, logs its exit status and releases the tracked pid.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessFacility for SystemProcesses {
    fn run_to_completion(&self, command: &str) -> Result<(), DaemonError> {
        let status = Command::new(BUILD_SHELL)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| DaemonError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(DaemonError::BuildFailed {
                command: command.to_string(),
                status,
            })
        }
    }

    fn launch(
        &self,
        target: &CommandSpec,
        tracked: &Arc<AtomicU32>,
    ) -> Result<u32, DaemonError> {
        let mut child = Command::new(&target.program)
            .args(&target.args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DaemonError::Spawn {
                command: target.to_string(),
                source,
            })?;
        let pid = child.id();
        tracked.store(pid, Ordering::SeqCst);

        let released = tracked.clone();
        let reaper = std::thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || {
                match child.wait() {
                    Ok(status) => tracing::info!(pid, %status, "target exited"),
                    Err(err) => tracing::warn!(pid, error = %err, "unable to wait on target"),
                }
                // Once reaped the pid may be reused; never leave it tracked.
                let _ = released.compare_exchange(pid, 0, Ordering::SeqCst, Ordering::SeqCst);
            });
        if let Err(err) = reaper {
            // The unreaped child keeps its pid reserved, so it stays tracked.
            tracing::warn!(pid, error = %err, "unable to spawn reaper thread");
        }

        Ok(pid)
    }

    fn kill(&self, pid: u32) -> Result<(), DaemonError> {
        kill(Pid::from_raw(pid as i32), Signal::SIGKILL)
            .map_err(|source| DaemonError::Kill { pid, source })
    }
}

/// Tracks the current child and performs stop/start around it.
///
/// The tracked pid is `0` when nothing is running, including after the
/// child has exited by itself. Overlapping restart sequences must be
/// prevented by the caller.
pub struct ProcessSupervisor {
    facility: Arc<dyn ProcessFacility>,
    build: BuildStep,
    target: CommandSpec,
    pid: Arc<AtomicU32>,
}

impl ProcessSupervisor {
    pub fn new(facility: Arc<dyn ProcessFacility>, build: BuildStep, target: CommandSpec) -> Self {
        Self {
            facility,
            build,
            target,
            pid: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn from_config(config: &DevLoopConfig) -> Self {
        Self::new(
            Arc::new(SystemProcesses),
            config.build.clone(),
            config.target.clone(),
        )
    }

    /// The tracked pid, or `0` if none.
    pub fn pid(&self) -> u32 {
        self.pid.load(Ordering::SeqCst)
    }

    /// Build (if configured) and launch the target.
    ///
    /// Returns the new pid. On any failure the tracked pid is reset to `0`
    /// and `None` is returned; nothing is raised.
    pub fn start(&self) -> Option<u32> {
        if let BuildStep::Shell(command) = &self.build {
            tracing::info!(build = %command, "building target");
            if let Err(err) = self.facility.run_to_completion(command) {
                tracing::error!(error = %err, "build failed; not starting target");
                self.pid.store(0, Ordering::SeqCst);
                return None;
            }
        }

        tracing::info!(command = %self.target, "starting target");
        match self.facility.launch(&self.target, &self.pid) {
            Ok(pid) => {
                tracing::info!(pid, "target started");
                Some(pid)
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to start target");
                self.pid.store(0, Ordering::SeqCst);
                None
            }
        }
    }

    /// SIGKILL the tracked process, if any, and clear the tracked pid.
    pub fn stop(&self) {
        let pid = self.pid.swap(0, Ordering::SeqCst);
        if pid == 0 {
            return;
        }
        tracing::info!(pid, "killing previous target");
        if let Err(err) = self.facility.kill(pid) {
            tracing::warn!(pid, error = %err, "unable to kill previous target");
        }
    }

    /// The restart sequence: stop, then start regardless of how stop went.
    pub fn restart(&self) -> Option<u32> {
        self.stop();
        self.start()
    }
}
