//! # priosim-cli::commands::validate
//!
//! Implements the `validate` subcommand.

use std::path::PathBuf;

use anyhow::Result;

use crate::wiring::{build_network, load_scenario};

pub fn exec(path: PathBuf) -> Result<()> {
    println!("Validating scenario: {}", path.display());
    let scenario = load_scenario(&path)?;
    build_network(&scenario)?;

    println!(
        "Scenario '{}' is valid: {} node(s), {} switch(es), {} link(s), {} stream(s).",
        path.display(),
        scenario.nodes.len(),
        scenario.switches.len(),
        scenario.links.len(),
        scenario.streams.len()
    );
    Ok(())
}
