//! Change coordinator: turns qualifying events into serialized restarts.
//!
//! A single-permit semaphore is the restart slot. A qualifying event that
//! finds the slot free takes the permit and dispatches a restart sequence
//! on its own task without waiting for it; the permit goes back when that
//! sequence finishes. Events that find the slot taken are dropped, not
//! queued, so a burst of saves produces one restart.

use std::sync::Arc;

use devloop_core::TriggerPolicy;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::EventKind;
use tokio::sync::{broadcast, mpsc, OwnedSemaphorePermit, Semaphore};

use crate::source::WatchEvent;
use crate::supervisor::ProcessSupervisor;

/// Counters collected over one coordinator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorReport {
    /// Restart sequences dispatched.
    pub dispatched: usize,
    /// Qualifying events dropped because a restart was in flight.
    pub dropped: usize,
    /// Events that did not qualify under the trigger policy.
    pub ignored: usize,
    /// Error notifications from the event source.
    pub errors: usize,
}

/// Whether `kind` should trigger a restart under `policy`.
///
/// Under `ModifyOnly`, a new file and a rename landing on a name count as
/// content changes: editors that save through a temp file and a rename
/// produce only those.
pub fn is_qualifying(kind: &EventKind, policy: TriggerPolicy) -> bool {
    match policy {
        TriggerPolicy::AnyEvent => true,
        TriggerPolicy::ModifyOnly => matches!(
            kind,
            EventKind::Modify(ModifyKind::Data(_))
                | EventKind::Modify(ModifyKind::Any)
                | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both))
                | EventKind::Create(CreateKind::File)
        ),
    }
}

pub struct ChangeCoordinator {
    supervisor: Arc<ProcessSupervisor>,
    slot: Arc<Semaphore>,
    policy: TriggerPolicy,
}

impl ChangeCoordinator {
    pub fn new(supervisor: Arc<ProcessSupervisor>, policy: TriggerPolicy) -> Self {
        Self {
            supervisor,
            slot: Arc::new(Semaphore::new(1)),
            policy,
        }
    }

    /// Shared handle to the restart slot.
    pub fn restart_slot(&self) -> Arc<Semaphore> {
        self.slot.clone()
    }

    /// Consume events until shutdown is signalled or the stream ends.
    ///
    /// A restart already dispatched keeps running after this returns.
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<WatchEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> CoordinatorReport {
        let mut report = CoordinatorReport::default();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle(event, &mut report);
                }
            }
        }

        tracing::info!(
            dispatched = report.dispatched,
            dropped = report.dropped,
            ignored = report.ignored,
            errors = report.errors,
            "change coordinator stopped",
        );
        report
    }

    fn handle(&self, event: WatchEvent, report: &mut CoordinatorReport) {
        let (kind, paths) = match event {
            WatchEvent::Changed { kind, paths } => (kind, paths),
            WatchEvent::Failed(message) => {
                tracing::warn!(error = %message, "watcher event error");
                report.errors += 1;
                return;
            }
        };

        if !is_qualifying(&kind, self.policy) {
            tracing::trace!(kind = ?kind, "ignoring non-qualifying event");
            report.ignored += 1;
            return;
        }

        let path = paths.first().map(|p| p.display().to_string()).unwrap_or_default();
        match self.slot.clone().try_acquire_owned() {
            Ok(permit) => {
                tracing::info!(path = %path, "change detected, restarting target");
                report.dispatched += 1;
                self.dispatch(permit);
            }
            Err(_) => {
                tracing::debug!(path = %path, "restart in flight, dropping change");
                report.dropped += 1;
            }
        }
    }

    fn dispatch(&self, permit: OwnedSemaphorePermit) {
        let supervisor = self.supervisor.clone();
        // Fire-and-forget; the handle is never joined.
        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || supervisor.restart()).await;
            if let Err(err) = outcome {
                tracing::error!(error = %err, "restart sequence failed");
            }
            drop(permit);
        });
    }
}
