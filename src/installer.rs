//! # Legacy Dependency Managers
//!
//! Older release branches of the source repository still vendor their
//! dependencies with `godep` or `dep`. Both tools are built from source at a
//! pinned revision when they are not already on the search path.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::info;

use crate::command::{CommandLine, CommandRunner};
use crate::error::Result;
use crate::layout::Layout;

/// A Go tool fetched with `go get` and rebuilt at a pinned revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyTool {
    /// Executable name looked up on the search path.
    pub name: &'static str,
    /// `go get` import path; also the checkout location under `{gopath}/src`.
    pub import_path: &'static str,
    /// Commit or tag checked out before building.
    pub revision: &'static str,
    /// Package pattern passed to `go install`.
    pub install_target: &'static str,
}

pub const GODEP: LegacyTool = LegacyTool {
    name: "godep",
    import_path: "github.com/tools/godep",
    revision: "tags/v80",
    install_target: "./...",
};

pub const DEP: LegacyTool = LegacyTool {
    name: "dep",
    import_path: "github.com/golang/dep",
    revision: "7c44971bbb9f0ed87db40b601f2d9fe4dffb750d",
    install_target: "./cmd/dep",
};

impl LegacyTool {
    /// The commands that fetch, pin and build this tool.
    pub fn build_commands(&self, layout: &Layout) -> Vec<CommandLine> {
        let source_dir = layout.import_dir(self.import_path);
        vec![
            CommandLine::new("go").args(["get", self.import_path]),
            CommandLine::git(["checkout", self.revision]).current_dir(&source_dir),
            CommandLine::new("go")
                .args(["install", self.install_target])
                .current_dir(&source_dir),
        ]
    }

    /// Builds the tool unless `name` is already on `search_path`.
    pub fn ensure_installed<R: CommandRunner>(
        &self,
        runner: &R,
        layout: &Layout,
        search_path: Option<&OsStr>,
    ) -> Result<()> {
        if let Some(found) = find_executable(self.name, search_path) {
            info!("Already installed: {} ({})", self.name, found.display());
            return Ok(());
        }

        info!("Installing {}#{} ...", self.import_path, self.revision);
        for command in self.build_commands(layout) {
            runner.run(&command)?;
        }
        Ok(())
    }
}

/// Finds `name` in the directories of a `PATH`-style list.
pub fn find_executable(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
