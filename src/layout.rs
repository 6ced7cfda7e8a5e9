//! Filesystem layout of a bootstrapped GOPATH.
//!
//! ```text
//! {gopath}/go                      -> go-{default}
//! {gopath}/go-{version}/           one per installed toolchain
//! {gopath}/src/{base_package}/     base repository path
//!     {source_repo}/
//!     {destination_repo}/ ...
//! {gopath}/src/{import_path}/      legacy tool sources
//! ```

use std::path::{Path, PathBuf};

use crate::config::{self, Settings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    gopath: PathBuf,
    base_repo_path: PathBuf,
}

impl Layout {
    pub fn new(gopath: impl Into<PathBuf>, settings: &Settings) -> Self {
        let gopath = gopath.into();
        let base_repo_path = config::base_repo_path(&gopath, &settings.base_package);
        Self {
            gopath,
            base_repo_path,
        }
    }

    pub fn gopath(&self) -> &Path {
        &self.gopath
    }

    /// Directory the source and destination repositories are cloned into.
    pub fn base_repo_path(&self) -> &Path {
        &self.base_repo_path
    }

    pub fn repo_dir(&self, name: &str) -> PathBuf {
        config::join_relative(&self.base_repo_path, name)
    }

    pub fn toolchain_dir(&self, version: &str) -> PathBuf {
        self.gopath.join(format!("go-{}", version))
    }

    /// Symlink pointing at the default toolchain.
    pub fn toolchain_link(&self) -> PathBuf {
        self.gopath.join("go")
    }

    /// Checkout location of a `go get` import path.
    pub fn import_dir(&self, import_path: &str) -> PathBuf {
        import_path
            .split('/')
            .fold(self.gopath.join("src"), |dir, part| dir.join(part))
    }
}
