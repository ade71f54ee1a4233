//! # priosim-types::metrics
//!
//! Defines constants for metric names and labels. Centralizing these
//! constants prevents typos and keeps the engine (where metrics are
//! emitted) consistent with whatever dashboards or test assertions consume
//! them.

// --- Metric Names ---
pub const MET_MSG_DELIVERED: &str = "priosim_messages_delivered_total";
pub const MET_MSG_DROPPED: &str = "priosim_messages_dropped_total";
pub const MET_MSG_FORWARDED: &str = "priosim_messages_forwarded_total";
pub const MET_PREEMPTIONS: &str = "priosim_preemptions_total";
pub const MET_PREEMPTION_OVERHEAD_HISTO: &str = "priosim_preemption_overhead_ms";
pub const MET_DELAY_HISTO: &str = "priosim_end_to_end_delay_ms";

// --- Label Keys ---
pub const LBL_SWITCH: &str = "switch";
pub const LBL_STREAM: &str = "stream";
pub const LBL_PRIORITY: &str = "priority";
pub const LBL_REASON: &str = "reason";
