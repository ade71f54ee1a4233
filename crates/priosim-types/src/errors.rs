//! # priosim-types::errors
//!
//! Defines the common error types used throughout the priosim workspace.
//! Using `thiserror` provides clean, descriptive error handling. Scheduler
//! invariant violations (popping an event from the past) are programmer
//! errors and are asserted/panicked on directly rather than modeled here —
//! see `priosim-core::scheduler`.

use thiserror::Error;

/// Configuration errors: things that should fail fast at construction time,
/// not surface as in-simulation drops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("stream priority {0} out of range (must be 0..=7)")]
    PriorityOutOfRange(u8),
    #[error("interval_sec must be > 0, got {0}")]
    NonPositiveInterval(f64),
    #[error("size_bytes must be > 0, got {0}")]
    NonPositiveSize(u64),
    #[error("stream {stream_id} source '{declared}' does not match node '{node}'")]
    StreamSourceMismatch {
        stream_id: u32,
        declared: String,
        node: String,
    },
    #[error("bandwidth_bps must be > 0, got {0}")]
    NonPositiveBandwidth(f64),
    #[error("no node or switch named '{0}' in this scenario")]
    UnknownEndpoint(String),
}

/// An error encountered parsing or validating a scenario configuration file.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("I/O error reading scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown file extension for scenario path '{0}' (expected .toml or .yaml/.yml)")]
    UnknownFormat(String),
}
