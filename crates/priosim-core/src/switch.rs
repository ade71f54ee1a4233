//! # priosim-core::switch
//!
//! The basic store-and-forward switch: a single shared eight-level
//! priority queue and a single-slot transmission loop serializing across
//! all of its output ports. Grounded on the source simulator's `Switch`
//! class. `PreemptiveSwitch` wraps a `Switch` and shares its
//! capacity-check/enqueue logic via `try_enqueue` below.

use fxhash::FxHashMap;

use priosim_types::id::{NodeName, PortId};
use priosim_types::message::{DropReason, Message};
use priosim_types::metrics as metric_names;
use priosim_types::time::SimTime;
use tracing::{debug, warn};

use crate::link::Link;
use crate::priority_queue::PriorityQueue;
use crate::scheduler::{Event, Scheduler};

/// Counters mirrored both as plain fields (for programmatic inspection and
/// tests) and, at the call sites that update them, as `metrics` crate
/// counters (see `network.rs`).
#[derive(Debug, Clone, Default)]
pub struct SwitchStats {
    pub messages_received: u64,
    pub messages_forwarded: u64,
    pub messages_dropped: u64,
    pub drops_by_priority: [u64; 8],
}

impl SwitchStats {
    pub fn record_drop(&mut self, priority: u8) {
        self.messages_dropped += 1;
        self.drops_by_priority[priority as usize] += 1;
    }
}

/// Attempts to enqueue `msg` on `port`, applying the priority-aware
/// capacity policy: if the queue is full, a
/// strictly-higher-priority arrival evicts the current lowest-priority tail
/// entry (recorded as a drop), while an arrival that is not strictly higher
/// than the current lowest priority is itself tail-dropped. Shared between
/// `Switch` and `PreemptiveSwitch` so the capacity policy has one
/// implementation.
///
/// Returns `true` if `msg` ended up enqueued.
pub(crate) fn try_enqueue(
    queue: &mut PriorityQueue,
    max_queue_size: Option<usize>,
    mut msg: Message,
    port: PortId,
    dropped: &mut Vec<Message>,
    stats: &mut SwitchStats,
) -> bool {
    if let Some(max) = max_queue_size {
        if queue.len() >= max {
            match queue.peek_lowest() {
                Some((plow, _, _)) if msg.priority > plow => {
                    if let Some(mut evicted) = queue.drop_lowest() {
                        evicted.mark_dropped(DropReason::PreemptedByHigherPriority);
                        stats.record_drop(evicted.priority);
                        dropped.push(evicted);
                    }
                }
                Some(_) => {
                    msg.mark_dropped(DropReason::BufferOverflowTailDrop);
                    stats.record_drop(msg.priority);
                    dropped.push(msg);
                    return false;
                }
                None => {
                    // max_queue_size == 0 or similarly degenerate: nothing
                    // to evict, so the arrival is dropped outright.
                    msg.mark_dropped(DropReason::BufferOverflow);
                    stats.record_drop(msg.priority);
                    dropped.push(msg);
                    return false;
                }
            }
        }
    }
    queue.enqueue(msg, port);
    true
}

pub struct Switch {
    name: NodeName,
    forwarding_table: FxHashMap<NodeName, PortId>,
    output_links: FxHashMap<PortId, Link>,
    queue: PriorityQueue,
    max_queue_size: Option<usize>,
    is_transmitting: bool,
    stats: SwitchStats,
}

impl Switch {
    pub fn new(name: impl Into<NodeName>, max_queue_size: Option<usize>) -> Self {
        Self {
            name: name.into(),
            forwarding_table: FxHashMap::default(),
            output_links: FxHashMap::default(),
            queue: PriorityQueue::new(),
            max_queue_size,
            is_transmitting: false,
            stats: SwitchStats::default(),
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn stats(&self) -> &SwitchStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SwitchStats {
        &mut self.stats
    }

    pub(crate) fn queue_mut(&mut self) -> &mut PriorityQueue {
        &mut self.queue
    }

    pub(crate) fn max_queue_size(&self) -> Option<usize> {
        self.max_queue_size
    }

    pub(crate) fn is_transmitting(&self) -> bool {
        self.is_transmitting
    }

    pub(crate) fn set_is_transmitting(&mut self, v: bool) {
        self.is_transmitting = v;
    }

    pub(crate) fn forwarding_entry(&self, dst: &NodeName) -> Option<PortId> {
        self.forwarding_table.get(dst).cloned()
    }

    pub(crate) fn link_mut(&mut self, port: &PortId) -> Option<&mut Link> {
        self.output_links.get_mut(port)
    }

    pub fn add_link(&mut self, port: impl Into<PortId>, link: Link) {
        self.output_links.insert(port.into(), link);
    }

    pub fn set_forwarding_entry(&mut self, dst: impl Into<NodeName>, port: impl Into<PortId>) {
        self.forwarding_table.insert(dst.into(), port.into());
    }

    pub fn receive(
        &mut self,
        mut msg: Message,
        now: SimTime,
        scheduler: &mut Scheduler,
        dropped: &mut Vec<Message>,
    ) {
        self.stats.messages_received += 1;

        let Some(port) = self.forwarding_table.get(&msg.dst).cloned() else {
            warn!(switch = %self.name, dst = %msg.dst, msg_id = msg.msg_id, "no forwarding entry");
            msg.mark_dropped(DropReason::NoForwardingEntry);
            self.stats.record_drop(msg.priority);
            dropped.push(msg);
            return;
        };

        if !try_enqueue(
            &mut self.queue,
            self.max_queue_size,
            msg,
            port,
            dropped,
            &mut self.stats,
        ) {
            return;
        }

        if !self.is_transmitting {
            self.forward_next(now, scheduler);
        }
    }

    pub fn forward_next(&mut self, now: SimTime, scheduler: &mut Scheduler) {
        let Some((msg, port)) = self.queue.dequeue() else {
            self.is_transmitting = false;
            return;
        };

        let Some(link) = self.output_links.get_mut(&port) else {
            warn!(switch = %self.name, %port, "no link for output port; message lost");
            self.is_transmitting = false;
            return;
        };

        let arrival = link.start_transmission(now, msg.size_bytes);
        let busy_until = link.busy_until();
        self.stats.messages_forwarded += 1;
        self.is_transmitting = true;

        metrics::counter!(
            metric_names::MET_MSG_FORWARDED,
            metric_names::LBL_SWITCH => self.name.to_string()
        )
        .increment(1);
        debug!(switch = %self.name, %port, msg_id = msg.msg_id, arrival, "forwarding");
        scheduler.schedule(
            arrival,
            Event::Deliver {
                msg,
                dst: port.clone(),
            },
        );
        scheduler.schedule(
            busy_until,
            Event::SwitchForward {
                switch: self.name.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: u64, priority: u8, dst: &str) -> Message {
        Message::new(id, 0, 0, priority, "src".into(), dst.into(), 1000, 0.0)
    }

    #[test]
    fn unknown_destination_is_dropped_with_reason() {
        let mut sw = Switch::new("SW", None);
        let mut sched = Scheduler::new();
        let mut dropped = Vec::new();
        sw.receive(msg(1, 3, "nowhere"), 0.0, &mut sched, &mut dropped);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].drop_reason, Some(DropReason::NoForwardingEntry));
        assert_eq!(sw.stats().messages_dropped, 1);
    }

    #[test]
    fn priority_aware_drop_evicts_lowest_priority_tail() {
        let mut sw = Switch::new("SW", Some(2));
        sw.add_link("C", Link::new("l", 100.0, 1.0).unwrap());
        sw.set_forwarding_entry("C", "C");
        let mut sched = Scheduler::new();
        let mut dropped = Vec::new();

        // msg1 starts transmitting immediately (queue was empty); msg2 and
        // msg3 fill the queue to max_queue_size=2.
        sw.receive(msg(1, 0, "C"), 0.0, &mut sched, &mut dropped);
        sw.receive(msg(2, 0, "C"), 0.0, &mut sched, &mut dropped);
        sw.receive(msg(3, 0, "C"), 0.0, &mut sched, &mut dropped);
        assert!(dropped.is_empty());

        // Queue is now full (len=2) with two P0 messages; another P0
        // arrival is not strictly higher priority than the tail, so it is
        // tail-dropped outright.
        sw.receive(msg(4, 0, "C"), 0.0, &mut sched, &mut dropped);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].msg_id, 4);
        assert_eq!(dropped[0].drop_reason, Some(DropReason::BufferOverflowTailDrop));

        dropped.clear();
        // A P7 arrival is strictly higher priority: it evicts the queue's
        // current lowest-priority tail entry instead of being dropped itself.
        sw.receive(msg(5, 7, "C"), 0.0, &mut sched, &mut dropped);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].priority, 0);
        assert_eq!(dropped[0].drop_reason, Some(DropReason::PreemptedByHigherPriority));
    }
}
