//! # priosim-core::prelude
//!
//! A convenience module re-exporting the engine's most commonly used types
//! alongside `priosim-types`', so callers (the CLI, tests, an external
//! topology builder) only need one `use` line.

pub use crate::{
    link::Link,
    network::{Network, SwitchEntity},
    node::Node,
    preemptive_switch::{PreemptiveSwitch, PreemptiveSwitchConfig},
    priority_queue::PriorityQueue,
    scheduler::{Event, EventHandle, Scheduler},
    stats::{GlobalStats, StreamStats},
    switch::{Switch, SwitchStats},
};

pub use priosim_types::prelude::*;
