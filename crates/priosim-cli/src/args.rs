//! # priosim-cli::args
//!
//! Defines the command-line argument structure using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Tracing filter directive (e.g. "info", "priosim_core=debug").
    #[arg(long, global = true, default_value = "info")]
    pub log: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation from a scenario file.
    Run(RunOpts),
    /// Validate a scenario file for correctness without running it.
    Validate {
        #[arg(value_name = "SCENARIO_PATH")]
        scenario: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// Path to the scenario file (YAML or TOML).
    #[arg(value_name = "SCENARIO_PATH")]
    pub scenario: PathBuf,

    /// Path to write the per-message results CSV.
    #[arg(long, value_name = "OUT_PATH")]
    pub csv: Option<PathBuf>,
}
