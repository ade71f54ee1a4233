//! # priosim-types::id
//!
//! Defines the core identifier types used throughout the simulation.
//! Using distinct types for different kinds of IDs helps prevent bugs where,
//! for example, a `StreamId` might be accidentally used as a `MsgId`.

use std::fmt;
use std::sync::Arc;

/// The name of a node or switch. Also doubles as a `PortId`: a switch's
/// output port is addressed by the name of the neighbor it leads to, the
/// same convention the source simulator uses.
///
/// Backed by `Arc<str>` so that cloning a name (which happens on every
/// enqueue and every scheduled event) is cheap.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeName(Arc<str>);

impl NodeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for NodeName {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for NodeName {
    fn from(s: String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

impl From<&String> for NodeName {
    fn from(s: &String) -> Self {
        Self(Arc::from(s.as_str()))
    }
}

/// A switch's output port is named after the neighbor it leads to.
pub type PortId = NodeName;

/// A unique identifier for a `Stream`, assigned by whoever configures the
/// topology (not generated internally).
pub type StreamId = u32;

/// A unique identifier for a `Message`, allocated by the `Network`.
pub type MsgId = u64;

/// A unique identifier for a scheduled event in the simulation's master queue.
pub type EventId = u64;

/// A monotonic insertion sequence number used to break ties between events
/// scheduled for the same `SimTime`.
pub type EventSeq = u64;
