//! # priosim-core::preemptive_switch
//!
//! Extends the basic switch with an interrupt/resume transmission state
//! machine. Grounded almost behaviorally line-for-line on the source
//! simulator's preemptive switch: explicit event cancellation, resetting
//! link state on preempt, and using an ordered queue (not a single slot)
//! for paused transmissions.

use std::collections::VecDeque;

use priosim_types::id::{MsgId, NodeName, PortId};
use priosim_types::message::Message;
use priosim_types::metrics as metric_names;
use priosim_types::time::SimTime;
use tracing::{debug, trace, warn};

use crate::link::Link;
use crate::scheduler::{Event, EventHandle, Scheduler};
use crate::switch::{try_enqueue, Switch, SwitchStats};

/// State retained for the transmission currently occupying the link,
/// between the moment it starts and the moment its slot/completion event
/// fires.
struct CurrentTransmission {
    message: Message,
    port: PortId,
    start_time: SimTime,
    bytes_transmitted: u64,
    bytes_remaining: u64,
    completion_handle: EventHandle,
    slot_handle: EventHandle,
    resumed: bool,
}

/// A transmission that was interrupted mid-flight, queued to resume once
/// the port is next free.
struct PausedTransmission {
    message: Message,
    port: PortId,
    bytes_transmitted: u64,
    bytes_remaining: u64,
    paused_at: SimTime,
}

/// Construction-time knobs for a `PreemptiveSwitch`: whether
/// preemption is active at all, the cooldown between preemptions, and the
/// priority-difference threshold that must be met to trigger one.
#[derive(Debug, Clone, Copy)]
pub struct PreemptiveSwitchConfig {
    pub preemption_enabled: bool,
    pub min_preemption_interval: SimTime,
    pub priority_threshold: u8,
}

impl Default for PreemptiveSwitchConfig {
    fn default() -> Self {
        Self {
            preemption_enabled: true,
            min_preemption_interval: 0.001,
            priority_threshold: 2,
        }
    }
}

pub struct PreemptiveSwitch {
    base: Switch,
    preemption_enabled: bool,
    min_preemption_interval: SimTime,
    priority_threshold: u8,
    last_preemption_time: SimTime,
    current: Option<CurrentTransmission>,
    paused: VecDeque<PausedTransmission>,
    preemptions_count: u64,
    preemptions_by_priority: [u64; 8],
    total_preemption_overhead_ms: f64,
}

impl PreemptiveSwitch {
    pub fn new(name: impl Into<NodeName>, max_queue_size: Option<usize>) -> Self {
        Self {
            base: Switch::new(name, max_queue_size),
            preemption_enabled: true,
            min_preemption_interval: 0.001,
            priority_threshold: 2,
            last_preemption_time: 0.0,
            current: None,
            paused: VecDeque::new(),
            preemptions_count: 0,
            preemptions_by_priority: [0; 8],
            total_preemption_overhead_ms: 0.0,
        }
    }

    pub fn set_preemption_enabled(&mut self, enabled: bool) {
        self.preemption_enabled = enabled;
    }

    pub fn set_min_preemption_interval(&mut self, v: SimTime) {
        self.min_preemption_interval = v;
    }

    pub fn set_priority_threshold(&mut self, v: u8) {
        self.priority_threshold = v;
    }

    pub fn name(&self) -> &NodeName {
        self.base.name()
    }

    pub fn stats(&self) -> &SwitchStats {
        self.base.stats()
    }

    pub fn preemptions_count(&self) -> u64 {
        self.preemptions_count
    }

    pub fn preemptions_by_priority(&self) -> &[u64; 8] {
        &self.preemptions_by_priority
    }

    pub fn total_preemption_overhead_ms(&self) -> f64 {
        self.total_preemption_overhead_ms
    }

    pub fn avg_overhead_per_preemption_ms(&self) -> f64 {
        if self.preemptions_count == 0 {
            0.0
        } else {
            self.total_preemption_overhead_ms / self.preemptions_count as f64
        }
    }

    pub fn add_link(&mut self, port: impl Into<PortId>, link: Link) {
        self.base.add_link(port, link);
    }

    pub fn set_forwarding_entry(&mut self, dst: impl Into<NodeName>, port: impl Into<PortId>) {
        self.base.set_forwarding_entry(dst, port);
    }

    pub fn receive(
        &mut self,
        mut msg: Message,
        now: SimTime,
        scheduler: &mut Scheduler,
        dropped: &mut Vec<Message>,
    ) {
        self.base.stats_mut().messages_received += 1;

        let Some(port) = self.base.forwarding_entry(&msg.dst) else {
            use priosim_types::message::DropReason;
            warn!(switch = %self.name(), dst = %msg.dst, msg_id = msg.msg_id, "no forwarding entry");
            msg.mark_dropped(DropReason::NoForwardingEntry);
            self.base.stats_mut().record_drop(msg.priority);
            dropped.push(msg);
            return;
        };

        if self.preemption_enabled {
            if let Some(cur) = &self.current {
                let diff = msg.priority as i16 - cur.message.priority as i16;
                let elapsed_since_last = now - self.last_preemption_time;
                if diff >= self.priority_threshold as i16
                    && elapsed_since_last >= self.min_preemption_interval
                {
                    self.preempt(now);
                    self.last_preemption_time = now;
                }
            }
        }

        if !try_enqueue(
            self.base.queue_mut(),
            self.base.max_queue_size(),
            msg,
            port,
            dropped,
            self.base.stats_mut(),
        ) {
            return;
        }

        if !self.base.is_transmitting() {
            self.forward_next(now, scheduler);
        }
    }

    /// `preempt(now)`: cancels the outstanding
    /// completion/slot events, computes bytes done/left from elapsed time,
    /// frees the link immediately, and files the interrupted frame onto
    /// the paused queue.
    fn preempt(&mut self, now: SimTime) {
        let Some(cur) = self.current.take() else {
            return;
        };
        cur.completion_handle.cancel();
        cur.slot_handle.cancel();

        let size = cur.message.size_bytes;
        let bytes_done = if let Some(link) = self.base.link_mut(&cur.port) {
            let elapsed = now - cur.start_time;
            let rate_bytes_per_sec = link.bandwidth_bps / 8.0;
            let done = (elapsed * rate_bytes_per_sec).floor().max(0.0) as u64;
            link.reset_busy_until(now);
            done.min(size)
        } else {
            cur.bytes_transmitted
        };
        let bytes_left = size - bytes_done;

        debug!(
            switch = %self.name(),
            msg_id = cur.message.msg_id,
            bytes_done,
            bytes_left,
            "preempting in-flight transmission"
        );

        self.preemptions_count += 1;
        self.preemptions_by_priority[cur.message.priority as usize] += 1;
        metrics::counter!(
            metric_names::MET_PREEMPTIONS,
            metric_names::LBL_SWITCH => self.name().to_string(),
            metric_names::LBL_PRIORITY => cur.message.priority.to_string()
        )
        .increment(1);

        self.paused.push_back(PausedTransmission {
            message: cur.message,
            port: cur.port,
            bytes_transmitted: bytes_done,
            bytes_remaining: bytes_left,
            paused_at: now,
        });

        self.base.set_is_transmitting(false);
    }

    /// `forward_next(now)` with preemption: paused
    /// transmissions are re-sorted by priority (stable) and strictly
    /// precede fresh dequeues.
    pub fn forward_next(&mut self, now: SimTime, scheduler: &mut Scheduler) {
        if !self.paused.is_empty() {
            let mut items: Vec<_> = self.paused.drain(..).collect();
            items.sort_by(|a, b| b.message.priority.cmp(&a.message.priority));
            self.paused = items.into();
            self.resume_next(now, scheduler);
            return;
        }

        let Some((msg, port)) = self.base.queue_mut().dequeue() else {
            self.base.set_is_transmitting(false);
            return;
        };
        self.start_fresh(msg, port, now, scheduler);
    }

    fn start_fresh(&mut self, msg: Message, port: PortId, now: SimTime, scheduler: &mut Scheduler) {
        let Some(link) = self.base.link_mut(&port) else {
            warn!(switch = %self.name(), %port, "no link for output port; message lost");
            self.base.set_is_transmitting(false);
            return;
        };

        let tx_time = link.transmission_time(msg.size_bytes);
        let (start, busy_until, completion) = link.reserve_for(now, tx_time);

        self.base.stats_mut().messages_forwarded += 1;
        self.base.set_is_transmitting(true);

        let completion_handle = scheduler.schedule(
            completion,
            Event::SwitchCompletion {
                switch: self.name().clone(),
                msg_id: msg.msg_id,
                msg: msg.clone(),
                dst: port.clone(),
            },
        );
        let slot_handle = scheduler.schedule(
            busy_until,
            Event::SwitchSlot {
                switch: self.name().clone(),
            },
        );

        trace!(switch = %self.name(), msg_id = msg.msg_id, start, completion, "starting fresh transmission");

        self.current = Some(CurrentTransmission {
            message: msg,
            port,
            start_time: start,
            bytes_transmitted: 0,
            bytes_remaining: 0,
            completion_handle,
            slot_handle,
            resumed: false,
        });
    }

    fn resume_next(&mut self, now: SimTime, scheduler: &mut Scheduler) {
        let Some(p) = self.paused.pop_front() else {
            return;
        };
        let Some(link) = self.base.link_mut(&p.port) else {
            warn!(switch = %self.name(), port = %p.port, "no link for paused transmission; message lost");
            self.base.set_is_transmitting(false);
            return;
        };

        let rate_bytes_per_sec = link.bandwidth_bps / 8.0;
        let remaining_time = p.bytes_remaining as f64 / rate_bytes_per_sec;
        let (start, busy_until, completion) = link.reserve_for(now, remaining_time);

        let overhead_ms = (now - p.paused_at) * 1_000.0;
        self.total_preemption_overhead_ms += overhead_ms;
        metrics::histogram!(metric_names::MET_PREEMPTION_OVERHEAD_HISTO).record(overhead_ms);
        self.base.set_is_transmitting(true);

        let completion_handle = scheduler.schedule(
            completion,
            Event::SwitchCompletion {
                switch: self.name().clone(),
                msg_id: p.message.msg_id,
                msg: p.message.clone(),
                dst: p.port.clone(),
            },
        );
        let slot_handle = scheduler.schedule(
            busy_until,
            Event::SwitchSlot {
                switch: self.name().clone(),
            },
        );

        debug!(switch = %self.name(), msg_id = p.message.msg_id, start, completion, resumed = true, "resuming paused transmission");

        self.current = Some(CurrentTransmission {
            message: p.message,
            port: p.port,
            start_time: start,
            bytes_transmitted: p.bytes_transmitted,
            bytes_remaining: p.bytes_remaining,
            completion_handle,
            slot_handle,
            resumed: true,
        });
    }

    /// Completion handler: clears `current_transmission` if
    /// it still names this message. Delivery itself is handled by the
    /// caller (`Network::dispatch`), which always delivers the event's
    /// payload regardless of whether `current` still matched.
    pub fn clear_if_current(&mut self, msg_id: MsgId) {
        if matches!(&self.current, Some(cur) if cur.message.msg_id == msg_id) {
            self.current = None;
        }
    }

    /// Slot handler: clears `is_transmitting` and re-enters
    /// the forwarding loop.
    pub fn handle_slot(&mut self, now: SimTime, scheduler: &mut Scheduler) {
        self.base.set_is_transmitting(false);
        self.forward_next(now, scheduler);
    }

    /// Whether a message is currently marked as a resumed transmission
    /// (for observability only).
    pub fn current_is_resumed(&self) -> bool {
        self.current.as_ref().map(|c| c.resumed).unwrap_or(false)
    }

    pub fn current_bytes_transmitted(&self) -> Option<u64> {
        self.current.as_ref().map(|c| c.bytes_transmitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: u64, priority: u8, dst: &str, size: u64) -> Message {
        Message::new(id, 0, 0, priority, "src".into(), dst.into(), size, 0.0)
    }

    fn wired_switch(max_queue: Option<usize>) -> PreemptiveSwitch {
        let mut sw = PreemptiveSwitch::new("SW", max_queue);
        sw.add_link("C", Link::new("l", 100.0, 1.0).unwrap()); // 100 Mbps, 1ms
        sw.set_forwarding_entry("C", "C");
        sw
    }

    #[test]
    fn low_priority_delta_never_preempts() {
        let mut sw = wired_switch(None);
        sw.set_min_preemption_interval(0.0);
        let mut sched = Scheduler::new();
        let mut dropped = Vec::new();

        sw.receive(msg(1, 3, "C", 1_000_000), 0.0, &mut sched, &mut dropped);
        // priority diff of 1 (3 -> 4) must never preempt.
        sw.receive(msg(2, 4, "C", 1_000), 0.001, &mut sched, &mut dropped);
        assert_eq!(sw.preemptions_count(), 0);
    }

    #[test]
    fn sufficient_priority_gap_preempts_and_conserves_bytes() {
        let mut sw = wired_switch(None);
        sw.set_min_preemption_interval(0.0);
        let mut sched = Scheduler::new();
        let mut dropped = Vec::new();

        sw.receive(msg(1, 1, "C", 1_000_000), 0.0, &mut sched, &mut dropped);
        sw.receive(msg(2, 7, "C", 1_000), 0.002, &mut sched, &mut dropped);

        assert_eq!(sw.preemptions_count(), 1);
        assert_eq!(sw.preemptions_by_priority()[1], 1);

        // bytes_done + bytes_left must equal the original message size
        // exactly. at 100Mbps = 12.5e6 bytes/sec, 2ms elapsed => 25000 bytes
        // done.
        let total: u64 = sw
            .paused
            .iter()
            .map(|p| p.bytes_transmitted + p.bytes_remaining)
            .sum();
        assert_eq!(total, 1_000_000);
        assert_eq!(sw.paused.front().unwrap().bytes_transmitted, 25_000);
    }

    #[test]
    fn cooldown_blocks_rapid_repreemption() {
        let mut sw = wired_switch(None);
        sw.set_min_preemption_interval(0.001); // 1 ms, the spec's default
        let mut sched = Scheduler::new();
        let mut dropped = Vec::new();

        // last_preemption_time starts at 0.0 (matching the source), so this
        // first arrival at t=0.002 is 2ms after epoch: the cooldown has
        // elapsed and the preemption succeeds.
        sw.receive(msg(1, 1, "C", 1_000_000), 0.0, &mut sched, &mut dropped);
        sw.receive(msg(2, 7, "C", 1_000), 0.002, &mut sched, &mut dropped);
        assert_eq!(sw.preemptions_count(), 1);

        // A second high-priority arrival right away (0.5ms later) should not
        // preempt again: cooldown has not elapsed since the first preemption.
        sw.receive(msg(3, 7, "C", 1_000), 0.0025, &mut sched, &mut dropped);
        assert_eq!(sw.preemptions_count(), 1);
    }

    #[test]
    fn disabling_preemption_behaves_like_basic_switch() {
        let mut sw = wired_switch(None);
        sw.set_preemption_enabled(false);
        let mut sched = Scheduler::new();
        let mut dropped = Vec::new();

        sw.receive(msg(1, 1, "C", 1_000_000), 0.0, &mut sched, &mut dropped);
        sw.receive(msg(2, 7, "C", 1_000), 0.002, &mut sched, &mut dropped);
        assert_eq!(sw.preemptions_count(), 0);
    }
}
