//! # Repository Cloning
//!
//! Clones the source repository and the destination repositories into the
//! base repository path. Both operations are idempotent: an existing checkout
//! is never cloned again.
//!
//! An existing source checkout is left untouched. An existing destination
//! checkout has its `origin` URL pointed at the current host and target org
//! and a stale `index.lock` from an interrupted run removed. Commit identity
//! is configured on a destination only when it is first cloned.

use std::fs;

use log::info;

use crate::command::{CommandLine, CommandRunner};
use crate::config::Settings;
use crate::error::Result;
use crate::layout::Layout;

/// Script inside the source repository that restores vendored dependencies.
pub const GODEP_RESTORE_SCRIPT: &str = "hack/godep-restore.sh";

/// Commit author configured on freshly cloned destination repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

pub struct RepositoryCloner<'a, R: CommandRunner> {
    runner: &'a R,
    settings: &'a Settings,
    layout: &'a Layout,
}

impl<'a, R: CommandRunner> RepositoryCloner<'a, R> {
    pub fn new(runner: &'a R, settings: &'a Settings, layout: &'a Layout) -> Self {
        Self {
            runner,
            settings,
            layout,
        }
    }

    /// Clones the source repository unless it is already present.
    ///
    /// With `restore_dependencies`, a fresh clone also runs
    /// [`GODEP_RESTORE_SCRIPT`] inside the new checkout.
    pub fn clone_source(&self, restore_dependencies: bool) -> Result<()> {
        let repo_dir = self.layout.repo_dir(&self.settings.source_repo);
        if repo_dir.exists() {
            info!(
                "Source repository {:?} already cloned, skipping",
                self.settings.source_repo
            );
            return Ok(());
        }

        let url = self.settings.source_url();
        info!("Cloning source repository {} ...", url);
        self.runner.run(&CommandLine::git(["clone", url.as_str()]))?;

        if restore_dependencies {
            info!("Running {} ...", GODEP_RESTORE_SCRIPT);
            self.runner.run(
                &CommandLine::new("bash")
                    .args(["-x", GODEP_RESTORE_SCRIPT])
                    .current_dir(&repo_dir),
            )?;
        }
        Ok(())
    }

    /// Clones a destination repository, or repoints an existing checkout.
    pub fn clone_destination(&self, repo: &str, identity: &CommitIdentity) -> Result<()> {
        let url = self.settings.destination_url(repo);
        let repo_dir = self.layout.repo_dir(repo);

        if repo_dir.exists() {
            info!(
                "Fork repository {:?} already cloned to {}, resetting remote URL ...",
                repo,
                repo_dir.display()
            );
            self.runner.run(
                &CommandLine::git(["remote", "set-url", "origin", url.as_str()])
                    .current_dir(&repo_dir),
            )?;
            let _ = fs::remove_file(repo_dir.join(".git").join("index.lock"));
            return Ok(());
        }

        info!("Cloning fork repository {} ...", url);
        self.runner.run(&CommandLine::git(["clone", url.as_str()]))?;

        self.runner.run(
            &CommandLine::git(["config", "user.name", identity.name.as_str()])
                .current_dir(&repo_dir),
        )?;
        self.runner.run(
            &CommandLine::git(["config", "user.email", identity.email.as_str()])
                .current_dir(&repo_dir),
        )?;
        Ok(())
    }
}
