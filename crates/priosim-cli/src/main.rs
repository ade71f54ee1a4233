//! # priosim-cli
//!
//! The main entry point for the priosim binary. Parses command-line
//! arguments and dispatches to the appropriate subcommand handler.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;

use crate::args::{Cli, Command};

mod args;
mod commands;
mod wiring;

fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(args.log))
        .init();

    match args.command {
        Command::Run(opts) => commands::run::exec(opts),
        Command::Validate { scenario } => commands::validate::exec(scenario),
    }
}
