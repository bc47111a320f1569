//! Domain types for a devloop session.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Everything here is resolved once at startup and immutable afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Absolute path of the directory tree under observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchRoot(PathBuf);

impl WatchRoot {
    /// Canonicalise `path` and check that it names an existing directory.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|source| ConfigError::RootNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(ConfigError::NotADirectory { path: canonical });
        }
        Ok(Self(canonical))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for WatchRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for WatchRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A program plus its arguments, launched without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split an argv vector into program and arguments.
    pub fn from_argv(argv: Vec<String>) -> Result<Self, ConfigError> {
        let mut argv = argv.into_iter();
        match argv.next() {
            Some(program) if !program.trim().is_empty() => Ok(Self {
                program,
                args: argv.collect(),
            }),
            _ => Err(ConfigError::MissingProgram),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What runs to completion before each launch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildStep {
    /// The target is already built; launch it directly.
    #[default]
    None,
    /// A shell command line, run through `sh -c`.
    Shell(String),
}

impl BuildStep {
    pub fn from_option(command: Option<String>) -> Result<Self, ConfigError> {
        match command {
            None => Ok(BuildStep::None),
            Some(cmd) if cmd.trim().is_empty() => Err(ConfigError::EmptyBuildCommand),
            Some(cmd) => Ok(BuildStep::Shell(cmd)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, BuildStep::None)
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::None => write!(f, "none"),
            BuildStep::Shell(cmd) => write!(f, "sh -c {cmd:?}"),
        }
    }
}

/// Which filesystem notifications count as a reason to restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerPolicy {
    /// Every delivered change event restarts the target.
    AnyEvent,
    /// Only content changes: writes, new files and renames onto a name.
    /// Metadata churn and deletions are ignored.
    #[default]
    ModifyOnly,
}

impl fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPolicy::AnyEvent => write!(f, "any-event"),
            TriggerPolicy::ModifyOnly => write!(f, "modify-only"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session configuration
// ---------------------------------------------------------------------------

/// Everything a devloop session needs, validated up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevLoopConfig {
    pub root: WatchRoot,
    pub build: BuildStep,
    pub target: CommandSpec,
    pub policy: TriggerPolicy,
}

impl DevLoopConfig {
    pub fn new(
        root: impl AsRef<Path>,
        build: Option<String>,
        argv: Vec<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            root: WatchRoot::resolve(root)?,
            build: BuildStep::from_option(build)?,
            target: CommandSpec::from_argv(argv)?,
            policy: TriggerPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: TriggerPolicy) -> Self {
        self.policy = policy;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
