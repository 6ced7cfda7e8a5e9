//! # init-repo Library
//!
//! This library prepares the working environment of a repository-publishing
//! bot. It is used by the `init-repo` command-line tool, which runs once
//! before the publishing engine starts.
//!
//! ## Quick Example
//!
//! ```
//! use init_repo::config::{self, Environment, Settings};
//! use init_repo::toolchain;
//!
//! let document = config::parse(
//!     "source-org: acme\nsource-repo: widgets\ntarget-org: acme-pub\nrules-file: rules.yaml\n",
//! )
//! .unwrap();
//! let env = Environment {
//!     gopath: "/go".into(),
//!     ..Environment::default()
//! };
//! let settings = Settings::resolve(document, &env).unwrap();
//! assert_eq!(settings.base_package, "github.com/acme-pub");
//!
//! let rules = init_repo::rules::parse(
//!     "rules:\n- destination: widgets-fork\n  branches:\n  - name: master\n    go: 1.12.0\n",
//! )
//! .unwrap();
//! assert_eq!(
//!     toolchain::required_versions(&rules),
//!     vec![toolchain::DEFAULT_GO_VERSION, "1.12.0"]
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: merges the YAML config document with
//!   command-line overrides and environment values into `Settings`.
//! - **Rules (`rules`)**: the destination repositories and the Go version
//!   each published branch needs.
//! - **Layout (`layout`)**: every path under the GOPATH root.
//! - **Commands (`command`)**: the `CommandRunner` seam all subprocesses go
//!   through.
//! - **Toolchains (`toolchain`)**, **legacy tools (`installer`)** and
//!   **clones (`clone`)**: the idempotent setup steps.
//! - **Bootstrap (`bootstrap`)**: runs the steps in order.

pub mod bootstrap;
pub mod clone;
pub mod command;
pub mod config;
pub mod error;
pub mod installer;
pub mod layout;
pub mod rules;
pub mod toolchain;
