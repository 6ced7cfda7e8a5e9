//! # Configuration Resolution
//!
//! This module turns the three sources of configuration into one resolved
//! [`Settings`] value:
//!
//! - **`Config`**: the optional YAML document passed with `--config`. Keys are
//!   kebab-case (`source-org`, `target-org`, ...). Keys this tool does not use
//!   are ignored, so the same document can be shared with the publishing
//!   engine.
//! - **`Overrides`**: values given on the command line. A non-empty override
//!   always wins over the document.
//! - **`Environment`**: values read from the process environment once at
//!   startup (GOPATH, rules-file override, committer identity, search path).
//!
//! Resolution applies the defaults (github host, base package) and rejects
//! configurations that are missing a required field before any command is
//! run.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Host used when neither the document nor the flags name one.
pub const DEFAULT_GITHUB_HOST: &str = "github.com";

/// Source repository name that maps to the platform's vanity namespace.
pub const CANONICAL_SOURCE_REPO: &str = "kubernetes";

/// Base package used when the source repository is [`CANONICAL_SOURCE_REPO`].
pub const CANONICAL_BASE_PACKAGE: &str = "k8s.io";

/// The configuration document as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub github_host: String,
    pub base_package: String,
    pub source_org: String,
    pub source_repo: String,
    pub target_org: String,
    pub rules_file: String,
}

/// Parse a configuration document from a YAML string.
pub fn parse(yaml: &str) -> Result<Config> {
    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: None,
    })
}

/// Read and parse a configuration document from a file.
pub fn from_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("failed to load config file from {}: {}", path.display(), e),
        hint: None,
    })?;
    serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
        message: format!("failed to parse config file at {}: {}", path.display(), e),
        hint: Some("keys are kebab-case, e.g. 'source-org: kubernetes'".to_string()),
    })
}

/// Command-line values that take precedence over the document.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub github_host: Option<String>,
    pub base_package: Option<String>,
    pub source_org: Option<String>,
    pub source_repo: Option<String>,
    pub target_org: Option<String>,
    pub rules_file: Option<String>,
}

impl Overrides {
    /// Merge these overrides over `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        fn set(field: &mut String, value: &Option<String>) {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                *field = v.to_string();
            }
        }

        set(&mut config.github_host, &self.github_host);
        set(&mut config.base_package, &self.base_package);
        set(&mut config.source_org, &self.source_org);
        set(&mut config.source_repo, &self.source_repo);
        set(&mut config.target_org, &self.target_org);
        set(&mut config.rules_file, &self.rules_file);
        config
    }
}

/// Values taken from the process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Root for toolchains and the `src/` tree (`GOPATH`).
    pub gopath: PathBuf,
    /// Rules file relative to the source repository (`RULE_FILE_PATH`).
    pub rule_file_path: Option<String>,
    /// Commit author name for fresh destination clones (`GIT_COMMITTER_NAME`).
    pub committer_name: String,
    /// Commit author email for fresh destination clones (`GIT_COMMITTER_EMAIL`).
    pub committer_email: String,
    /// Executable search path (`PATH`).
    pub search_path: Option<OsString>,
}

impl Environment {
    /// Returns the GOPATH to use when none is set: `$HOME/go`.
    pub fn default_gopath() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("go")
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub github_host: String,
    pub base_package: String,
    pub source_org: String,
    pub source_repo: String,
    pub target_org: String,
    pub rules_file: PathBuf,
}

impl Settings {
    /// Resolve the merged document against defaults and the environment.
    ///
    /// Fails with [`Error::MissingConfig`] if source org, source repo, target
    /// org or the rules file is empty after resolution.
    pub fn resolve(config: Config, env: &Environment) -> Result<Self> {
        let Config {
            mut github_host,
            mut base_package,
            source_org,
            source_repo,
            target_org,
            rules_file,
        } = config;

        if github_host.is_empty() {
            github_host = DEFAULT_GITHUB_HOST.to_string();
        }
        if base_package.is_empty() {
            base_package = derive_base_package(&github_host, &source_repo, &target_org);
        }

        if source_repo.is_empty() || source_org.is_empty() {
            return Err(Error::MissingConfig {
                message: "source-org and source-repo cannot be empty".to_string(),
            });
        }
        if target_org.is_empty() {
            return Err(Error::MissingConfig {
                message: "target organization cannot be empty".to_string(),
            });
        }

        let rules_file = match env.rule_file_path.as_deref().filter(|p| !p.is_empty()) {
            Some(relative) => join_relative(
                &join_relative(&base_repo_path(&env.gopath, &base_package), &source_repo),
                relative,
            ),
            None => PathBuf::from(rules_file),
        };
        if rules_file.as_os_str().is_empty() {
            return Err(Error::MissingConfig {
                message: "no rules file provided".to_string(),
            });
        }

        Ok(Self {
            github_host,
            base_package,
            source_org,
            source_repo,
            target_org,
            rules_file,
        })
    }

    /// Clone URL of the source repository.
    pub fn source_url(&self) -> String {
        repo_url(&self.github_host, &self.source_org, &self.source_repo)
    }

    /// Clone URL of a destination repository in the target org.
    pub fn destination_url(&self, repo: &str) -> String {
        repo_url(&self.github_host, &self.target_org, repo)
    }
}

/// Base package for a source repository when none is configured.
pub fn derive_base_package(github_host: &str, source_repo: &str, target_org: &str) -> String {
    if source_repo == CANONICAL_SOURCE_REPO {
        CANONICAL_BASE_PACKAGE.to_string()
    } else {
        format!("{}/{}", github_host, target_org)
    }
}

/// `{gopath}/src/{base_package}`
pub fn base_repo_path(gopath: &Path, base_package: &str) -> PathBuf {
    join_relative(&gopath.join("src"), base_package)
}

/// Joins `path` under `base` even when `path` is absolute.
///
/// Root and `.` components of `path` are dropped, so the result always stays
/// below `base` for paths without `..`.
pub fn join_relative(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    path.as_ref()
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .fold(base.to_path_buf(), |dir, c| dir.join(c))
}

fn repo_url(host: &str, org: &str, repo: &str) -> String {
    format!("https://{}/{}/{}", host, org, repo)
}
