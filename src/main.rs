//! # init-repo CLI
//!
//! Binary entry point for the `init-repo` command-line tool.
//!
//! It parses flags with `clap`, runs the bootstrap, and turns any failure into
//! a diagnostic on stderr and a non-zero exit status. The bootstrap itself
//! lives in the `init_repo` library crate.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
