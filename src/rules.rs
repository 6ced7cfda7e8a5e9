//! # Publishing Rules
//!
//! The rules document lists the destination repositories the source is
//! published into and, per destination, the branches to publish. This tool
//! only needs two things from it: the destination names to clone and the Go
//! version each branch requires. Everything else in the document belongs to
//! the publishing engine and is accepted without interpretation.
//!
//! ```yaml
//! rules:
//! - destination: apimachinery
//!   branches:
//!   - name: master
//!     source:
//!       branch: master
//!       dir: staging/src/k8s.io/apimachinery
//!   - name: release-1.14
//!     go: 1.12.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The whole rules document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRules {
    #[serde(default)]
    pub rules: Vec<RepositoryRule>,
}

/// Publishing rule for one destination repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRule {
    /// Name of the destination repository in the target org.
    #[serde(rename = "destination")]
    pub destination_repository: String,
    #[serde(default)]
    pub branches: Vec<BranchRule>,
}

/// One published branch of a destination repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: Option<BranchSource>,
    /// Go version needed to build this branch. Empty means the default.
    #[serde(rename = "go", default)]
    pub go_version: String,
}

/// Where a published branch comes from in the source repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSource {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub dir: String,
}

impl RepositoryRules {
    /// Destination repository names, in rule order.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|rule| rule.destination_repository.as_str())
    }

    /// Every non-empty Go version named by a branch, in document order,
    /// duplicates included.
    pub fn go_versions(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .flat_map(|rule| rule.branches.iter())
            .map(|branch| branch.go_version.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Parse a rules document from a YAML string.
pub fn parse(yaml: &str) -> Result<RepositoryRules> {
    let rules: RepositoryRules = serde_yaml::from_str(yaml)?;
    validate(&rules)?;
    Ok(rules)
}

/// Load a rules document from a file.
pub fn load(path: &Path) -> Result<RepositoryRules> {
    let load_error = |message: String| Error::RulesLoad {
        path: path.display().to_string(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    parse(&content).map_err(|e| match e {
        Error::Yaml(e) => load_error(e.to_string()),
        Error::RulesLoad { message, .. } => load_error(message),
        other => other,
    })
}

fn validate(rules: &RepositoryRules) -> Result<()> {
    for (i, rule) in rules.rules.iter().enumerate() {
        if rule.destination_repository.is_empty() {
            return Err(Error::RulesLoad {
                path: String::new(),
                message: format!("rule {} has an empty destination", i),
            });
        }
        for branch in &rule.branches {
            if !is_valid_go_version(&branch.go_version) {
                return Err(Error::RulesLoad {
                    path: String::new(),
                    message: format!(
                        "rule {} branch {} has invalid go version {:?}",
                        i, branch.name, branch.go_version
                    ),
                });
            }
        }
    }
    Ok(())
}

// Versions end up in archive URLs and directory names.
fn is_valid_go_version(version: &str) -> bool {
    version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.')
}
