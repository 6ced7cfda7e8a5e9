//! Orchestrator for the complete bootstrap
//!
//! Runs the setup steps in order. Every step is idempotent, so a failed run
//! is fixed by addressing the cause and running the whole bootstrap again.

use std::fs;

use log::info;

use crate::clone::{CommitIdentity, RepositoryCloner};
use crate::command::CommandRunner;
use crate::config::{Environment, Settings};
use crate::error::{Error, Result};
use crate::installer::{DEP, GODEP};
use crate::layout::Layout;
use crate::rules::RepositoryRules;
use crate::toolchain::{Platform, ToolchainInstaller};

/// Switches that change which steps run.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Skip building godep and restoring the source's vendored dependencies.
    pub skip_godep: bool,
    /// Skip building dep.
    pub skip_dep: bool,
    /// Platform whose Go archives are downloaded.
    pub platform: Platform,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            skip_godep: false,
            skip_dep: false,
            platform: Platform::host(),
        }
    }
}

/// What a completed bootstrap set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Go versions present after the run, default first.
    pub toolchains: Vec<String>,
    /// Destination repositories present after the run, in rule order.
    pub destinations: Vec<String>,
}

/// Execute the complete bootstrap
///
/// 1. Install every Go version the rules need and link the default
/// 2. Create the base repository path
/// 3. Install godep and dep (unless skipped)
/// 4. Clone the source repository, restoring vendored dependencies unless
///    godep is skipped
/// 5. Clone or repoint every destination repository
pub fn execute<R: CommandRunner>(
    runner: &R,
    layout: &Layout,
    settings: &Settings,
    env: &Environment,
    rules: &RepositoryRules,
    options: &Options,
) -> Result<Summary> {
    let toolchains = ToolchainInstaller::new(runner, layout, options.platform).install_all(rules)?;

    fs::create_dir_all(layout.base_repo_path()).map_err(|e| Error::Filesystem {
        message: format!(
            "failed to create source repo directory {}: {}",
            layout.base_repo_path().display(),
            e
        ),
    })?;

    let search_path = env.search_path.as_deref();
    if !options.skip_godep {
        GODEP.ensure_installed(runner, layout, search_path)?;
    }
    if !options.skip_dep {
        DEP.ensure_installed(runner, layout, search_path)?;
    }

    let cloner = RepositoryCloner::new(runner, settings, layout);
    cloner.clone_source(!options.skip_godep)?;

    let identity = CommitIdentity {
        name: env.committer_name.clone(),
        email: env.committer_email.clone(),
    };
    let mut destinations = Vec::with_capacity(rules.rules.len());
    for repo in rules.destinations() {
        cloner.clone_destination(repo, &identity)?;
        destinations.push(repo.to_string());
    }

    info!(
        "Bootstrap complete: {} toolchain(s), {} destination repositories",
        toolchains.len(),
        destinations.len()
    );
    Ok(Summary {
        toolchains,
        destinations,
    })
}
