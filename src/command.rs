//! # Command Execution
//!
//! Every external process the bootstrap starts (curl, tar, git, go, bash)
//! goes through the [`CommandRunner`] trait. A command is described by a
//! [`CommandLine`] value and handed to a runner, which is the only place a
//! process is actually spawned.
//!
//! The trait exists so the orchestration can be exercised without network
//! access or real tools: tests substitute a runner that records the command
//! lines it is given instead of executing them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// A program invocation with an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory. `None` means the runner's default directory.
    pub dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Shorthand for `git <args...>`.
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git").args(args)
    }

    /// Shorthand for `/bin/bash -c <script>`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("/bin/bash").arg("-c").arg(script)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Trait for running external commands - allows recording in tests
pub trait CommandRunner {
    /// Runs the command to completion. A launch failure or a non-zero exit
    /// status is an error carrying the full command line.
    fn run(&self, command: &CommandLine) -> Result<()>;
}

/// Runs commands as real child processes.
///
/// Standard output and error are inherited so tool output streams straight
/// to the terminal. Commands without an explicit working directory run in
/// `default_dir`. When a GOPATH is set, every child sees it as `GOPATH`
/// regardless of the caller's environment.
pub struct SystemRunner {
    default_dir: PathBuf,
    gopath: Option<PathBuf>,
}

impl SystemRunner {
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
            gopath: None,
        }
    }

    /// Exports `gopath` as `GOPATH` to every command.
    pub fn with_gopath(mut self, gopath: impl Into<PathBuf>) -> Self {
        self.gopath = Some(gopath.into());
        self
    }

    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    fn working_dir<'a>(&'a self, command: &'a CommandLine) -> &'a Path {
        command.dir.as_deref().unwrap_or(self.default_dir.as_path())
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> Result<()> {
        let dir = self.working_dir(command);
        debug!("Running \"{}\" in {}", command, dir.display());

        let mut child = Command::new(&command.program);
        child.args(&command.args).current_dir(dir);
        if let Some(gopath) = &self.gopath {
            child.env("GOPATH", gopath);
        }

        let status = child
            .status()
            .map_err(|e| Error::CommandLaunch {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}
