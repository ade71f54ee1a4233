//! # priosim-cli::wiring
//!
//! Turns a declarative `ScenarioConfig` (parsed from a TOML/YAML file) into
//! a live `priosim_core::network::Network`: nodes, switches (basic or
//! preemptive, depending on whether `SwitchConfig.preemptive` is set),
//! links, forwarding entries, and streams. Grounded on the source repo's
//! scenario-wiring layer (`build_world`/`finalize_world_setup`), trimmed to
//! this domain's flatter, protocol-free topology.

use std::path::Path;

use priosim_core::prelude::*;
use priosim_types::config::{LinkConfig, ScenarioConfig};
use priosim_types::errors::{ConfigError, ScenarioError};
use priosim_types::stream::Stream;

/// Reads and parses a scenario file, dispatching on its extension.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, ScenarioError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => ScenarioConfig::from_yaml_str(&content),
        Some("toml") => ScenarioConfig::from_toml_str(&content),
        _ => Err(ScenarioError::UnknownFormat(path.display().to_string())),
    }
}

/// Builds a `Network` from `scenario`, validating every node/switch/link/
/// stream as it is added. Fails fast on the first `ConfigError` encountered,
/// matching the "configuration errors fail fast at construction" policy.
///
/// Wiring happens in three passes: entities (nodes, switches) first, then
/// links (which need both endpoints to already exist), then forwarding
/// entries and streams (which reference entities by name).
pub fn build_network(scenario: &ScenarioConfig) -> Result<Network, ScenarioError> {
    let mut net = Network::new(scenario.sim_duration);

    for node in &scenario.nodes {
        net.add_node(node.name.as_str());
    }

    for sw in &scenario.switches {
        match &sw.preemptive {
            Some(p) => {
                let config = PreemptiveSwitchConfig {
                    preemption_enabled: p.preemption_enabled,
                    min_preemption_interval: p.min_preemption_interval,
                    priority_threshold: p.priority_threshold,
                };
                net.add_preemptive_switch(sw.name.as_str(), sw.max_queue_size, config);
            }
            None => net.add_switch(sw.name.as_str(), sw.max_queue_size),
        }
    }

    for link in &scenario.links {
        wire_link(&mut net, link)?;
    }

    for sw in &scenario.switches {
        if let Some(entity) = net.switch_mut(&sw.name.as_str().into()) {
            for entry in &sw.forwarding {
                entity.set_forwarding_entry(entry.dst.as_str(), entry.port.as_str());
            }
        }
    }

    for stream_cfg in &scenario.streams {
        let stream = Stream::new(
            stream_cfg.stream_id,
            stream_cfg.priority,
            stream_cfg.src.as_str(),
            stream_cfg.dst.as_str(),
            stream_cfg.interval_sec,
            stream_cfg.size_bytes,
            stream_cfg.description.as_str(),
        )?;
        net.add_stream(stream, stream_cfg.start_time)?;
    }

    Ok(net)
}

/// Wires one `LinkConfig` onto its `from` endpoint: a node's single output
/// link plus its `next_hop`, or a switch's named output port. `to` is the
/// neighbor name in both cases, matching the source simulator's convention
/// that a switch's port is named after the neighbor it leads to.
fn wire_link(net: &mut Network, link_cfg: &LinkConfig) -> Result<(), ScenarioError> {
    let link = Link::new(link_cfg.name.as_str(), link_cfg.bandwidth_mbps, link_cfg.delay_ms)?;

    if let Some(node) = net.node_mut(&link_cfg.from.as_str().into()) {
        node.set_output_link(link);
        node.set_next_hop(link_cfg.to.as_str());
        return Ok(());
    }
    if let Some(sw) = net.switch_mut(&link_cfg.from.as_str().into()) {
        sw.add_link(link_cfg.to.as_str(), link);
        return Ok(());
    }
    Err(ConfigError::UnknownEndpoint(link_cfg.from.clone()).into())
}
