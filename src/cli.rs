//! CLI argument parsing and bootstrap dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use init_repo::bootstrap::{self, Options};
use init_repo::command::SystemRunner;
use init_repo::config::{self, Config, Environment, Overrides, Settings};
use init_repo::layout::Layout;
use init_repo::rules;
use init_repo::toolchain::Platform;

/// Prepare toolchains and repository clones for the publishing bot
#[derive(Parser, Debug)]
#[command(name = "init-repo")]
#[command(version, about, long_about = None)]
#[command(after_help = "Command line flags override config values.")]
pub struct Cli {
    /// The config file in yaml format
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The address of github (defaults to github.com)
    #[arg(long, value_name = "HOST")]
    pub github_host: Option<String>,

    /// The name of the package base (defaults to k8s.io when source repo is
    /// kubernetes, otherwise github-host/target-org)
    #[arg(long, value_name = "PACKAGE")]
    pub base_package: Option<String>,

    /// The name of the source repository (eg. kubernetes)
    #[arg(long, value_name = "REPO")]
    pub source_repo: Option<String>,

    /// The name of the source repository organization (eg. kubernetes)
    #[arg(long, value_name = "ORG")]
    pub source_org: Option<String>,

    /// The file with repository rules
    #[arg(long, value_name = "FILE")]
    pub rules_file: Option<String>,

    /// The target organization to publish into (e.g. "k8s-publishing-bot")
    #[arg(long, value_name = "ORG")]
    pub target_org: Option<String>,

    /// Skip godep installation and godep-restore
    #[arg(long)]
    pub skip_godep: bool,

    /// Skip dep installation
    #[arg(long)]
    pub skip_dep: bool,

    /// Root for toolchains and repository checkouts (defaults to $HOME/go)
    #[arg(long, value_name = "DIR", env = "GOPATH")]
    pub gopath: Option<PathBuf>,

    /// Rules file inside the source repository; overrides --rules-file
    #[arg(long, value_name = "PATH", env = "RULE_FILE_PATH")]
    pub rule_file_path: Option<String>,

    /// Commit author name for newly cloned destination repositories
    #[arg(long, value_name = "NAME", env = "GIT_COMMITTER_NAME")]
    pub committer_name: Option<String>,

    /// Commit author email for newly cloned destination repositories
    #[arg(long, value_name = "EMAIL", env = "GIT_COMMITTER_EMAIL")]
    pub committer_email: Option<String>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Run the bootstrap
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let document = match &self.config {
            Some(path) => config::from_file(path)?,
            None => Config::default(),
        };
        let env = self.environment();
        let settings = Settings::resolve(self.overrides().apply(document), &env)?;
        let layout = Layout::new(env.gopath.clone(), &settings);

        let rules = rules::load(&settings.rules_file)?;
        info!(
            "Loaded {} rule(s) from {}",
            rules.rules.len(),
            settings.rules_file.display()
        );

        let runner = SystemRunner::new(layout.base_repo_path()).with_gopath(layout.gopath());
        let options = Options {
            skip_godep: self.skip_godep,
            skip_dep: self.skip_dep,
            platform: Platform::host(),
        };
        bootstrap::execute(&runner, &layout, &settings, &env, &rules, &options).with_context(
            || {
                format!(
                    "failed to bootstrap {}/{}",
                    settings.source_org, settings.source_repo
                )
            },
        )?;

        Ok(())
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            github_host: self.github_host.clone(),
            base_package: self.base_package.clone(),
            source_org: self.source_org.clone(),
            source_repo: self.source_repo.clone(),
            target_org: self.target_org.clone(),
            rules_file: self.rules_file.clone(),
        }
    }

    fn environment(&self) -> Environment {
        Environment {
            gopath: self
                .gopath
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(Environment::default_gopath),
            rule_file_path: self.rule_file_path.clone(),
            committer_name: self.committer_name.clone().unwrap_or_default(),
            committer_email: self.committer_email.clone().unwrap_or_default(),
            search_path: std::env::var_os("PATH"),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
