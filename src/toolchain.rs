//! # Go Toolchain Installation
//!
//! Every branch in the rules may pin the Go release it builds with. Before
//! publishing can start, each of those releases has to be unpacked under the
//! GOPATH root as `go-{version}`, and `{gopath}/go` has to point at the
//! default release.
//!
//! Installation is idempotent: a version whose directory already exists is
//! left alone. New versions are downloaded and extracted into a scratch
//! directory next to the final location and renamed into place once the
//! archive has been fully unpacked, so an interrupted download never leaves a
//! half-populated `go-{version}` behind.

use std::fs;
use std::io;

use log::info;

use crate::command::{CommandLine, CommandRunner};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::rules::RepositoryRules;

/// Go release linked as `{gopath}/go` and always installed.
pub const DEFAULT_GO_VERSION: &str = "1.10.2";

/// Where Go release archives are downloaded from.
pub const DOWNLOAD_BASE_URL: &str = "https://storage.googleapis.com/golang";

/// The distinct Go versions needed by `rules`.
///
/// The default version comes first, followed by every non-empty branch
/// version in first-seen order. Each version appears once.
pub fn required_versions(rules: &RepositoryRules) -> Vec<String> {
    let mut versions = vec![DEFAULT_GO_VERSION.to_string()];
    for version in rules.go_versions() {
        if !versions.iter().any(|v| v == version) {
            versions.push(version.to_string());
        }
    }
    versions
}

/// Operating system and architecture in Go's archive naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    pub const LINUX_AMD64: Platform = Platform {
        os: "linux",
        arch: "amd64",
    };

    /// The platform this binary runs on, or linux-amd64 if Go publishes no
    /// archive under a matching name.
    pub fn host() -> Self {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn from_target(os: &str, arch: &str) -> Self {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "freebsd" => "freebsd",
            _ => return Self::LINUX_AMD64,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "arm" => "armv6l",
            _ => return Self::LINUX_AMD64,
        };
        Self { os, arch }
    }

    /// Download URL of the release archive for `version`.
    pub fn archive_url(&self, version: &str) -> String {
        format!(
            "{}/go{}.{}-{}.tar.gz",
            DOWNLOAD_BASE_URL, version, self.os, self.arch
        )
    }
}

/// Installs Go releases into a [`Layout`].
pub struct ToolchainInstaller<'a, R: CommandRunner> {
    runner: &'a R,
    layout: &'a Layout,
    platform: Platform,
}

impl<'a, R: CommandRunner> ToolchainInstaller<'a, R> {
    pub fn new(runner: &'a R, layout: &'a Layout, platform: Platform) -> Self {
        Self {
            runner,
            layout,
            platform,
        }
    }

    /// Installs every version required by `rules`, then links the default.
    pub fn install_all(&self, rules: &RepositoryRules) -> Result<Vec<String>> {
        let versions = required_versions(rules);
        for version in &versions {
            self.install(version)?;
        }
        self.link_default()?;
        Ok(versions)
    }

    /// Makes sure `go-{version}` exists as a directory.
    pub fn install(&self, version: &str) -> Result<()> {
        let target = self.layout.toolchain_dir(version);

        match fs::metadata(&target) {
            Ok(meta) if meta.is_dir() => {
                info!("Found existing go {} at {}", version, target.display());
                return Ok(());
            }
            Ok(_) => {
                return Err(Error::Toolchain {
                    version: version.to_string(),
                    message: format!("expected {} to be a directory", target.display()),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!("Installing go {} to {}", version, target.display());
        fs::create_dir_all(self.layout.gopath())?;

        // Removed on drop until kept for the rename below.
        let staging = tempfile::Builder::new()
            .prefix("go-tmp-")
            .tempdir_in(self.layout.gopath())?;

        let script = format!(
            "curl -SLf {} | tar -xz --strip 1 -C {}",
            shell_quote(&self.platform.archive_url(version)),
            shell_quote(&staging.path().display().to_string())
        );
        self.runner
            .run(&CommandLine::shell(script).current_dir(staging.path()))?;

        let staging = staging.keep();
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_dir_all(&staging);
            return Err(Error::Toolchain {
                version: version.to_string(),
                message: format!(
                    "failed to move {} to {}: {}",
                    staging.display(),
                    target.display(),
                    e
                ),
            });
        }

        Ok(())
    }

    /// Points `{gopath}/go` at the default release.
    pub fn link_default(&self) -> Result<()> {
        let link = self.layout.toolchain_link();
        let target = self.layout.toolchain_dir(DEFAULT_GO_VERSION);

        let _ = fs::remove_file(&link);
        symlink(&target, &link).map_err(|e| Error::Filesystem {
            message: format!(
                "failed to link {} to {}: {}",
                link.display(),
                target.display(),
                e
            ),
        })
    }
}

/// Quotes `value` as a single bash word.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(unix)]
fn symlink(target: &std::path::Path, link: &std::path::Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &std::path::Path, _link: &std::path::Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are only supported on unix hosts",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingRunner;
    use crate::config::Settings;
    use crate::rules::{BranchRule, RepositoryRule};
    use proptest::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn layout(root: &std::path::Path) -> Layout {
        let settings = Settings {
            github_host: "github.com".to_string(),
            base_package: "github.com/acme-pub".to_string(),
            source_org: "acme".to_string(),
            source_repo: "widgets".to_string(),
            target_org: "acme-pub".to_string(),
            rules_file: PathBuf::from("/rules"),
        };
        Layout::new(root, &settings)
    }

    fn rules_with(versions: &[&[&str]]) -> RepositoryRules {
        RepositoryRules {
            rules: versions
                .iter()
                .enumerate()
                .map(|(i, branches)| RepositoryRule {
                    destination_repository: format!("repo-{}", i),
                    branches: branches
                        .iter()
                        .map(|v| BranchRule {
                            go_version: v.to_string(),
                            ..BranchRule::default()
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn staging_leftovers(root: &std::path::Path) -> usize {
        fs::read_dir(root)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with("go-tmp-")
            })
            .count()
    }

    #[test]
    fn test_required_versions_dedup_in_order() {
        let rules = rules_with(&[&["1.12.0", "", "1.11.0"], &["1.12.0", DEFAULT_GO_VERSION]]);
        assert_eq!(
            required_versions(&rules),
            vec![DEFAULT_GO_VERSION, "1.12.0", "1.11.0"]
        );
    }

    #[test]
    fn test_required_versions_empty_rules() {
        assert_eq!(
            required_versions(&RepositoryRules::default()),
            vec![DEFAULT_GO_VERSION]
        );
    }

    proptest! {
        #[test]
        fn prop_required_versions_each_once(
            branches in prop::collection::vec(
                prop::collection::vec(
                    prop_oneof![
                        Just(String::new()),
                        Just(DEFAULT_GO_VERSION.to_string()),
                        "1\\.1[0-3]\\.[0-9]",
                    ],
                    0..5,
                ),
                0..5,
            )
        ) {
            let borrowed: Vec<Vec<&str>> = branches
                .iter()
                .map(|b| b.iter().map(String::as_str).collect())
                .collect();
            let slices: Vec<&[&str]> = borrowed.iter().map(Vec::as_slice).collect();
            let versions = required_versions(&rules_with(&slices));

            prop_assert_eq!(versions[0].as_str(), DEFAULT_GO_VERSION);
            for (i, v) in versions.iter().enumerate() {
                prop_assert!(!v.is_empty());
                prop_assert!(!versions[i + 1..].contains(v));
            }
            for v in branches.iter().flatten().filter(|v| !v.is_empty()) {
                prop_assert!(versions.contains(v));
            }
        }
    }

    #[test]
    fn test_platform_mapping() {
        assert_eq!(
            Platform::from_target("linux", "x86_64"),
            Platform::LINUX_AMD64
        );
        assert_eq!(
            Platform::from_target("macos", "aarch64"),
            Platform {
                os: "darwin",
                arch: "arm64"
            }
        );
        assert_eq!(
            Platform::from_target("windows", "x86_64"),
            Platform::LINUX_AMD64
        );
    }

    #[test]
    fn test_archive_url() {
        assert_eq!(
            Platform::LINUX_AMD64.archive_url("1.12.0"),
            "https://storage.googleapis.com/golang/go1.12.0.linux-amd64.tar.gz"
        );
    }

    #[test]
    fn test_install_existing_directory_is_noop() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        fs::create_dir_all(layout.toolchain_dir("1.12.0")).unwrap();

        let runner = RecordingRunner::default();
        ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0")
            .unwrap();

        assert!(runner.lines().is_empty());
    }

    #[test]
    fn test_install_existing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        fs::write(layout.toolchain_dir("1.12.0"), b"not a dir").unwrap();

        let runner = RecordingRunner::default();
        let err = ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0")
            .unwrap_err();

        assert!(matches!(err, Error::Toolchain { .. }));
        assert!(runner.lines().is_empty());
    }

    #[test]
    fn test_install_downloads_into_staging_then_renames() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());

        let runner = RecordingRunner::default();
        ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0")
            .unwrap();

        let commands = runner.commands.borrow();
        assert_eq!(commands.len(), 1);
        let cmd = &commands[0];
        assert_eq!(cmd.program, "/bin/bash");
        let script = &cmd.args[1];
        assert!(script.starts_with(
            "curl -SLf 'https://storage.googleapis.com/golang/go1.12.0.linux-amd64.tar.gz' | tar -xz --strip 1 -C '"
        ));
        let staging = cmd.dir.as_ref().unwrap();
        assert!(script.ends_with(&format!("'{}'", staging.display())));
        assert!(staging.starts_with(temp.path()));

        assert!(layout.toolchain_dir("1.12.0").is_dir());
        assert!(!staging.exists());
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[test]
    fn test_install_failure_cleans_staging() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());

        let runner = RecordingRunner::failing("/bin/bash");
        let result = ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0");

        assert!(matches!(result, Err(Error::CommandFailed { .. })));
        assert!(!layout.toolchain_dir("1.12.0").exists());
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/go/go-tmp-x"), "'/go/go-tmp-x'");
        assert_eq!(shell_quote("/a b;c"), "'/a b;c'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[cfg(unix)]
    #[test]
    fn test_install_script_quotes_gopath_with_spaces() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("my go; echo");
        let layout = layout(&root);

        let runner = RecordingRunner::default();
        ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0")
            .unwrap();

        let commands = runner.commands.borrow();
        let staging = commands[0].dir.as_ref().unwrap();
        assert!(commands[0].args[1].ends_with(&format!(" -C '{}'", staging.display())));
        assert!(layout.toolchain_dir("1.12.0").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_rename_failure_removes_staging() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());

        // Creates the target after the download, so the rename finds a
        // non-empty directory in its way.
        struct Occupying<'a>(&'a Layout, RecordingRunner);
        impl CommandRunner for Occupying<'_> {
            fn run(&self, command: &CommandLine) -> Result<()> {
                let target = self.0.toolchain_dir("1.12.0");
                fs::create_dir_all(&target).unwrap();
                fs::write(target.join("VERSION"), b"go1.12").unwrap();
                let staging = command.dir.as_ref().unwrap();
                fs::write(staging.join("VERSION"), b"go1.12").unwrap();
                self.1.run(command)
            }
        }

        let runner = Occupying(&layout, RecordingRunner::default());
        let err = ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0")
            .unwrap_err();

        assert!(matches!(err, Error::Toolchain { .. }));
        assert!(err.to_string().contains("failed to move"));
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_install_stat_error_is_fatal() {
        let temp = TempDir::new().unwrap();
        // A regular file where the GOPATH directory should be makes the
        // target lookup fail with something other than NotFound.
        let root = temp.path().join("gopath");
        fs::write(&root, b"not a dir").unwrap();
        let layout = layout(&root);

        let runner = RecordingRunner::default();
        let err = ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install("1.12.0")
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(runner.lines().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_link_default_failure_is_filesystem_error() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        // A populated directory at the link path cannot be removed by
        // remove_file, so symlink creation fails.
        fs::create_dir_all(layout.toolchain_link().join("bin")).unwrap();

        let runner = RecordingRunner::default();
        let err = ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .link_default()
            .unwrap_err();

        match err {
            Error::Filesystem { message } => assert!(message.contains("failed to link")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_install_all_links_default() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        let rules = rules_with(&[&["1.12.0"]]);

        let runner = RecordingRunner::default();
        let versions = ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .install_all(&rules)
            .unwrap();

        assert_eq!(versions, vec![DEFAULT_GO_VERSION, "1.12.0"]);
        assert_eq!(runner.lines().len(), 2);
        assert_eq!(
            fs::read_link(layout.toolchain_link()).unwrap(),
            layout.toolchain_dir(DEFAULT_GO_VERSION)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_link_default_replaces_existing_link() {
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        std::os::unix::fs::symlink(layout.toolchain_dir("1.9.0"), layout.toolchain_link())
            .unwrap();

        let runner = RecordingRunner::default();
        ToolchainInstaller::new(&runner, &layout, Platform::LINUX_AMD64)
            .link_default()
            .unwrap();

        assert_eq!(
            fs::read_link(layout.toolchain_link()).unwrap(),
            layout.toolchain_dir(DEFAULT_GO_VERSION)
        );
    }
}
