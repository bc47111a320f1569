//! devloop — rebuild and restart a program whenever files under a directory change.
//!
//! # Usage
//!
//! ```text
//! devloop [--dir <DIR>] <PROGRAM> [ARGS]...
//! ```
//!
//! The program is assumed to be runnable as-is and is relaunched on every
//! change. Press Ctrl-C to stop watching.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use devloop_core::DevLoopConfig;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "devloop",
    version,
    about = "Rebuild and restart a program whenever files under a directory change",
    long_about = None,
)]
struct Cli {
    /// Directory to watch recursively (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Program to run, followed by its arguments.
    #[arg(
        value_name = "PROGRAM",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    target: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<DevLoopConfig> {
        let dir = match self.dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        DevLoopConfig::new(&dir, None, self.target)
            .with_context(|| format!("invalid watch configuration for {}", dir.display()))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    devloop_daemon::start_blocking(config).context("devloop exited with error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use devloop_core::BuildStep;

    #[test]
    fn target_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["devloop", "--dir", "/tmp", "./app", "--port", "-v"])
            .expect("parse");
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp")));
        assert_eq!(cli.target, vec!["./app", "--port", "-v"]);
    }

    #[test]
    fn program_is_required() {
        assert!(Cli::try_parse_from(["devloop", "--dir", "/tmp"]).is_err());
    }

    #[test]
    fn dir_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["devloop", "./app"]).expect("parse");
        let config = cli.into_config().expect("config");
        let cwd = std::env::current_dir()
            .expect("cwd")
            .canonicalize()
            .expect("canonical");
        assert_eq!(config.root.as_path(), cwd);
        assert_eq!(config.build, BuildStep::None);
    }
}
