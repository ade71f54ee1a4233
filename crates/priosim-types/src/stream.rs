//! # priosim-types::stream
//!
//! Defines `Stream`: the immutable configuration of a periodic message
//! source. Grounded on the source simulator's `Stream` dataclass, which
//! validates its priority range in `__post_init__`.

use crate::errors::ConfigError;
use crate::id::{NodeName, StreamId};

/// A periodic source of messages from one node to another, at a fixed
/// priority, size, and interval. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub stream_id: StreamId,
    pub priority: u8,
    pub src: NodeName,
    pub dst: NodeName,
    pub interval_sec: f64,
    pub size_bytes: u64,
    pub description: String,
}

impl Stream {
    /// Constructs a `Stream`, validating its invariants. Priority must be in
    /// `0..=7`; `interval_sec` and `size_bytes` must be positive. Rejecting
    /// bad configuration here (rather than downstream, mid-run) is the
    /// "configuration errors fail fast at construction" policy.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stream_id: StreamId,
        priority: u8,
        src: impl Into<NodeName>,
        dst: impl Into<NodeName>,
        interval_sec: f64,
        size_bytes: u64,
        description: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if priority > 7 {
            return Err(ConfigError::PriorityOutOfRange(priority));
        }
        if !(interval_sec > 0.0) {
            return Err(ConfigError::NonPositiveInterval(interval_sec));
        }
        if size_bytes == 0 {
            return Err(ConfigError::NonPositiveSize(size_bytes));
        }
        Ok(Self {
            stream_id,
            priority,
            src: src.into(),
            dst: dst.into(),
            interval_sec,
            size_bytes,
            description: description.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_priority() {
        let err = Stream::new(1, 8, "A", "B", 0.1, 100, "").unwrap_err();
        assert_eq!(err, ConfigError::PriorityOutOfRange(8));
    }

    #[test]
    fn accepts_boundary_priorities() {
        assert!(Stream::new(1, 0, "A", "B", 0.1, 100, "").is_ok());
        assert!(Stream::new(2, 7, "A", "B", 0.1, 100, "").is_ok());
    }

    #[test]
    fn rejects_non_positive_interval() {
        assert!(Stream::new(1, 0, "A", "B", 0.0, 100, "").is_err());
        assert!(Stream::new(1, 0, "A", "B", -1.0, 100, "").is_err());
    }

    #[test]
    fn rejects_zero_size() {
        assert!(Stream::new(1, 0, "A", "B", 0.1, 0, "").is_err());
    }
}
