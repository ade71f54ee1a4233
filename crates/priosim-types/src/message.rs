//! # priosim-types::message
//!
//! Defines `Message`, the unit instance of a `Stream`'s periodic traffic,
//! and `DropReason`, the enumerated set of reasons a message can fail to
//! arrive. Grounded on the source simulator's `Message` dataclass.

use crate::id::{MsgId, NodeName, StreamId};
use crate::time::SimTime;

/// Why a message never reached its destination. The `Display` text matches
/// the exact strings the results CSV expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NoForwardingEntry,
    BufferOverflowTailDrop,
    PreemptedByHigherPriority,
    BufferOverflow,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NoForwardingEntry => "No forwarding entry",
            DropReason::BufferOverflowTailDrop => "Buffer overflow (tail drop)",
            DropReason::PreemptedByHigherPriority => "Preempted by higher priority",
            DropReason::BufferOverflow => "Buffer overflow",
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single instance of a stream's traffic, created by a `Node`'s
/// generator and terminated either by delivery or by a drop somewhere
/// along the path.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub msg_id: MsgId,
    pub stream_id: StreamId,
    pub seq_num: u64,
    pub priority: u8,
    pub src: NodeName,
    pub dst: NodeName,
    pub size_bytes: u64,
    pub creation_time: SimTime,
    pub arrival_time: Option<SimTime>,
    pub dropped: bool,
    pub drop_reason: Option<DropReason>,
}

impl Message {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msg_id: MsgId,
        stream_id: StreamId,
        seq_num: u64,
        priority: u8,
        src: NodeName,
        dst: NodeName,
        size_bytes: u64,
        creation_time: SimTime,
    ) -> Self {
        Self {
            msg_id,
            stream_id,
            seq_num,
            priority,
            src,
            dst,
            size_bytes,
            creation_time,
            arrival_time: None,
            dropped: false,
            drop_reason: None,
        }
    }

    /// Marks the message as terminally dropped. Idempotent in the sense
    /// that calling it again just overwrites the reason; callers are
    /// expected to drop a message exactly once.
    pub fn mark_dropped(&mut self, reason: DropReason) {
        self.dropped = true;
        self.drop_reason = Some(reason);
        self.arrival_time = None;
    }

    /// End-to-end delay in seconds, if the message was delivered.
    pub fn end_to_end_delay(&self) -> Option<SimTime> {
        self.arrival_time.map(|t| t - self.creation_time)
    }

    /// End-to-end delay in milliseconds, for CSV/reporting.
    pub fn end_to_end_delay_ms(&self) -> Option<f64> {
        self.end_to_end_delay().map(|d| d * 1_000.0)
    }
}
