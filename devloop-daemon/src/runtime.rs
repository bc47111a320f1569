use std::future::Future;
use std::sync::Arc;

use devloop_core::DevLoopConfig;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::coordinator::{ChangeCoordinator, CoordinatorReport};
use crate::error::{io_err, DaemonError};
use crate::registrar::register_tree;
use crate::source::{EventSource, NotifySource, WatchEvent};
use crate::supervisor::ProcessSupervisor;

/// What a finished session leaves behind.
pub struct Session {
    /// Directories registered at startup, root included.
    pub registered: usize,
    /// The coordinator task. Shutdown does not wait on it.
    pub coordinator: JoinHandle<CoordinatorReport>,
}

/// Start a devloop session and block the current thread until it exits.
pub fn start_blocking(config: DevLoopConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let result = runtime.block_on(run(config));
    // A restart may still be building; do not wait for it.
    runtime.shutdown_background();
    result.map(|_| ())
}

/// Run a session against the OS watcher and real processes until Ctrl-C.
pub async fn run(config: DevLoopConfig) -> Result<Session, DaemonError> {
    run_with(config, NotifySource::open).await
}

/// [`run`] with the event source opener injected.
///
/// An `Err` from `open` is the one fatal startup failure: nothing has been
/// launched and no handler installed when it is returned.
pub async fn run_with<S, O>(config: DevLoopConfig, open: O) -> Result<Session, DaemonError>
where
    S: EventSource,
    O: FnOnce() -> Result<(S, mpsc::UnboundedReceiver<WatchEvent>), DaemonError>,
{
    tracing::info!("starting watcher");
    let (source, events) = open()?;
    let supervisor = Arc::new(ProcessSupervisor::from_config(&config));
    let interrupt = interrupt_handler();

    run_until(&config, source, events, supervisor, interrupt).await
}

/// Install the SIGINT handler immediately and resolve on the next interrupt.
///
/// An interrupt that lands during the initial build is kept and resolves
/// the future as soon as it is awaited.
fn interrupt_handler() -> impl Future<Output = Result<(), DaemonError>> {
    let installed = signal(SignalKind::interrupt());
    async move {
        let mut interrupt = installed.map_err(|e| io_err("ctrl-c handler", e))?;
        interrupt.recv().await;
        Ok(())
    }
}

/// The lifecycle with every collaborator injected.
///
/// Starts the target once, spawns the coordinator, registers the tree and
/// then waits for `shutdown`. Once it resolves the source is closed and the
/// coordinator told to stop; neither it nor any in-flight restart is
/// awaited. An `Err` from `shutdown` is returned after the same teardown.
pub async fn run_until<S, F>(
    config: &DevLoopConfig,
    mut source: S,
    events: mpsc::UnboundedReceiver<WatchEvent>,
    supervisor: Arc<ProcessSupervisor>,
    shutdown: F,
) -> Result<Session, DaemonError>
where
    S: EventSource,
    F: Future<Output = Result<(), DaemonError>>,
{
    tracing::info!(
        root = %config.root,
        build = %config.build,
        command = %config.target,
        policy = %config.policy,
        "devloop session starting",
    );

    let initial = supervisor.clone();
    tokio::task::spawn_blocking(move || initial.start())
        .await
        .map_err(|err| DaemonError::Runtime(format!("initial start join error: {err}")))?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let coordinator = ChangeCoordinator::new(supervisor, config.policy);
    let coordinator = tokio::spawn(coordinator.run(events, shutdown_rx));

    let registered = register_tree(&mut source, config.root.as_path());
    tracing::info!(root = %config.root, registered, "watching directory");

    let outcome = shutdown.await;
    tracing::info!("shutting down watcher");

    source.close();
    let _ = shutdown_tx.send(());
    tracing::info!("quit watcher");

    outcome.map(|()| Session {
        registered,
        coordinator,
    })
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
