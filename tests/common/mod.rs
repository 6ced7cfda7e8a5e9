//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_rules(rules::SINGLE_FORK);
//! fixture.command().arg("--help").assert().success();
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use init_repo::command::{CommandLine, CommandRunner};
use init_repo::error::Result;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::rules;
    #[allow(unused_imports)]
    pub use super::RecordingRunner;
    pub use super::TestFixture;
}

/// Rules documents used across tests.
#[allow(dead_code)]
pub mod rules {
    /// One destination whose branch needs Go 1.12.0.
    pub const SINGLE_FORK: &str = r#"
rules:
- destination: widgets-fork
  branches:
  - name: master
    go: 1.12.0
    source:
      branch: master
      dir: staging/src/widgets-fork
"#;

    /// No destinations at all.
    pub const EMPTY: &str = "rules: []\n";
}

/// A `CommandRunner` that records command lines instead of running them.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingRunner {
    commands: RefCell<Vec<CommandLine>>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn commands(&self) -> Vec<CommandLine> {
        self.commands.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.commands.borrow().iter().map(|c| c.to_string()).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &CommandLine) -> Result<()> {
        self.commands.borrow_mut().push(command.clone());
        Ok(())
    }
}

/// A temporary GOPATH with a rules file next to it.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty `gopath/` directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("gopath")
            .create_dir_all()
            .expect("Failed to create gopath");
        Self { temp_dir }
    }

    /// Write `rules.yaml` with the given content.
    pub fn with_rules(self, content: &str) -> Self {
        self.temp_dir
            .child("rules.yaml")
            .write_str(content)
            .expect("Failed to write rules file");
        self
    }

    /// Write `config.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("config.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Create a directory relative to the GOPATH.
    pub fn with_gopath_dir(self, path: &str) -> Self {
        self.temp_dir
            .child("gopath")
            .child(path)
            .create_dir_all()
            .expect("Failed to create directory");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn gopath(&self) -> PathBuf {
        self.temp_dir.path().join("gopath")
    }

    pub fn rules_path(&self) -> PathBuf {
        self.temp_dir.path().join("rules.yaml")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    /// Create an `init-repo` command isolated from the caller's environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("init-repo");
        cmd.current_dir(self.path())
            .env_remove("RULE_FILE_PATH")
            .env_remove("RUST_LOG")
            .env_remove("GIT_COMMITTER_NAME")
            .env_remove("GIT_COMMITTER_EMAIL")
            .env("GOPATH", self.gopath());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_gopath() {
        let fixture = TestFixture::new();
        assert!(fixture.gopath().is_dir());
    }

    #[test]
    fn test_rules_constants_parse() {
        for doc in [rules::SINGLE_FORK, rules::EMPTY] {
            init_repo::rules::parse(doc).expect("rules should parse");
        }
    }
}
