//! # priosim-types::config
//!
//! Declarative, `serde`-driven configuration structs for describing a
//! network scenario (nodes, switches, links, streams) in TOML or YAML.
//! Mirrors the source repo's scenario-file layer, but flattened to the
//! knobs this simulator actually exposes — there is no fault-injection
//! directive schedule here, and no topology-generation logic: this is
//! wiring data, consumed by `priosim-cli` to call the same public
//! `Network`/`Node`/`Switch` API an external topology builder would.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_min_preemption_interval() -> f64 {
    0.001
}

fn default_priority_threshold() -> u8 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub name: String,
    pub max_queue_size: Option<usize>,
    /// When absent, a basic (non-preemptive) switch is built.
    #[serde(default)]
    pub preemptive: Option<PreemptiveSwitchConfig>,
    /// `dst_node -> output_port` entries; the output port must name a
    /// neighbor reachable via one of this scenario's `links`.
    #[serde(default)]
    pub forwarding: Vec<ForwardingEntryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingEntryConfig {
    pub dst: String,
    pub port: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreemptiveSwitchConfig {
    #[serde(default = "default_true")]
    pub preemption_enabled: bool,
    #[serde(default = "default_min_preemption_interval")]
    pub min_preemption_interval: f64,
    #[serde(default = "default_priority_threshold")]
    pub priority_threshold: u8,
}

impl Default for PreemptiveSwitchConfig {
    fn default() -> Self {
        Self {
            preemption_enabled: true,
            min_preemption_interval: default_min_preemption_interval(),
            priority_threshold: default_priority_threshold(),
        }
    }
}

/// A directed wire between two named entities (nodes or switches). `from`'s
/// output toward `to` uses this link; for a `Node`, this also becomes its
/// `next_hop`. For a `Switch`, `to` is the port name used by
/// `forwarding` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    pub from: String,
    pub to: String,
    pub bandwidth_mbps: f64,
    pub delay_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub stream_id: u32,
    pub priority: u8,
    pub src: String,
    pub dst: String,
    pub interval_sec: f64,
    pub size_bytes: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_time: f64,
}

/// The full description of a scenario: a flat topology plus the stream set
/// riding on it, and the duration to simulate. Building this from a richer
/// collective-communication pattern (all-to-all, all-reduce, a tree
/// topology generator, ...) is the external collaborator's job; this struct
/// is the wire format that collaborator would ultimately emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub sim_duration: f64,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub switches: Vec<SwitchConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

impl ScenarioConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, crate::errors::ScenarioError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, crate::errors::ScenarioError> {
        Ok(serde_yaml::from_str(s)?)
    }
}
