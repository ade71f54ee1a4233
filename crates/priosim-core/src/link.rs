//! # priosim-core::link
//!
//! The bandwidth/propagation/serialization model for a single directed
//! link. Grounded on the source simulator's `Link` class
//! (`get_transmission_time`, `start_transmission`) and the shape of the
//! teacher's `net/link.rs`, stripped of its fault-model fields: there is no
//! packet drop/duplicate/corrupt/jitter model here (Non-goal).

use priosim_types::errors::ConfigError;
use priosim_types::time::SimTime;

/// A point-to-point link: bandwidth plus a fixed propagation delay, with
/// `busy_until` bookkeeping for serialization. Owned by exactly one
/// `Network` (a `Node` or `Switch`'s output link).
#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    pub bandwidth_bps: f64,
    pub propagation_sec: SimTime,
    busy_until: SimTime,
}

impl Link {
    pub fn new(
        name: impl Into<String>,
        bandwidth_mbps: f64,
        delay_ms: f64,
    ) -> Result<Self, ConfigError> {
        let bandwidth_bps = bandwidth_mbps * 1_000_000.0;
        if !(bandwidth_bps > 0.0) {
            return Err(ConfigError::NonPositiveBandwidth(bandwidth_bps));
        }
        Ok(Self {
            name: name.into(),
            bandwidth_bps,
            propagation_sec: delay_ms / 1_000.0,
            busy_until: 0.0,
        })
    }

    /// Time to serialize `size_bytes` onto the wire at this link's rate.
    pub fn transmission_time(&self, size_bytes: u64) -> SimTime {
        (size_bytes as f64 * 8.0) / self.bandwidth_bps
    }

    pub fn busy_until(&self) -> SimTime {
        self.busy_until
    }

    /// Pure bookkeeping: reserves the link from `max(now, busy_until)` for
    /// `transmission_time(size_bytes)`, and returns the resulting arrival
    /// time (after propagation). Does not schedule anything.
    pub fn start_transmission(&mut self, now: SimTime, size_bytes: u64) -> SimTime {
        let start = now.max(self.busy_until);
        self.busy_until = start + self.transmission_time(size_bytes);
        self.busy_until + self.propagation_sec
    }

    /// Reserves the link for exactly `duration` starting no earlier than
    /// `now`, returning `(start, busy_until, completion)`. Used by
    /// preemptive resume, where the remaining transmission time is computed
    /// externally from partially-transmitted bytes.
    pub fn reserve_for(&mut self, now: SimTime, duration: SimTime) -> (SimTime, SimTime, SimTime) {
        let start = now.max(self.busy_until);
        self.busy_until = start + duration;
        (start, self.busy_until, self.busy_until + self.propagation_sec)
    }

    /// Frees the link immediately, discarding any in-progress reservation.
    /// Used only by preemption: the remaining bytes of the preempted frame
    /// are accounted for separately, on resume.
    pub fn reset_busy_until(&mut self, now: SimTime) {
        self.busy_until = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmission_time_matches_formula() {
        let link = Link::new("l", 100.0, 1.0).unwrap(); // 100 Mbps, 1 ms
        // 1500 bytes * 8 / 100e6 = 120 microseconds
        assert!((link.transmission_time(1500) - 0.000_120).abs() < 1e-12);
    }

    #[test]
    fn start_transmission_serializes_back_to_back_sends() {
        let mut link = Link::new("l", 100.0, 1.0).unwrap();
        let a1 = link.start_transmission(0.0, 1500);
        let busy_after_first = link.busy_until();
        let a2 = link.start_transmission(0.0, 1500); // arrives "at once" but link is busy
        assert!(a2 > a1);
        assert_eq!(link.busy_until(), busy_after_first + link.transmission_time(1500));
    }

    #[test]
    fn zero_size_message_has_zero_transmission_time_but_still_arrives() {
        let mut link = Link::new("l", 100.0, 1.0).unwrap();
        let arrival = link.start_transmission(0.0, 0);
        assert_eq!(arrival, link.propagation_sec);
    }

    #[test]
    fn rejects_non_positive_bandwidth() {
        assert!(Link::new("l", 0.0, 1.0).is_err());
    }
}
