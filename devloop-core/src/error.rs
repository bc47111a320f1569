//! Error types for devloop-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving a session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The watch root could not be canonicalised (missing, permission denied).
    #[error("cannot resolve watch root {path}: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The watch root exists but is a file.
    #[error("watch root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// No target program was given.
    #[error("no target program given; pass the program to run after the flags")]
    MissingProgram,

    /// A build step was given an empty command line.
    #[error("build command is empty")]
    EmptyBuildCommand,
}
