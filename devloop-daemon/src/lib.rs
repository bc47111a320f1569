//! devloop watch loop: event source, registrar, supervisor and coordinator.

pub mod coordinator;
mod error;
pub mod paths;
pub mod registrar;
mod runtime;
pub mod source;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use coordinator::{is_qualifying, ChangeCoordinator, CoordinatorReport};
pub use error::DaemonError;
pub use registrar::register_tree;
pub use runtime::{run, run_until, run_with, start_blocking, Session};
pub use source::{EventSource, NotifySource, WatchEvent};
pub use supervisor::{ProcessFacility, ProcessSupervisor, SystemProcesses};
