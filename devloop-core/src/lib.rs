//! devloop core library — session types and configuration errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, build/trigger enums and [`DevLoopConfig`]
//! - [`error`] — [`ConfigError`]

pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{BuildStep, CommandSpec, DevLoopConfig, TriggerPolicy, WatchRoot};
