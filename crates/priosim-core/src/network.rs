//! # priosim-core::network
//!
//! `Network`: the top-level simulation facade. Owns the node/switch
//! registries, the `Scheduler`, the monotonic id generator, and the result
//! sinks (`completed_messages`/`dropped_messages`, indexed by stream).
//! Grounded on the source simulator's `Network` class
//! (`schedule_event`/`deliver_message`/`get_stream_statistics`/
//! `export_to_csv`) for behavior, and on a world/state-container plus a
//! `step()`/dispatch-by-event-variant loop for shape.
//!
//! A dispatch loop resolving its event payload against `self` can be tempted
//! to reach for a raw-pointer context object to dodge the borrow checker,
//! when a node's dyn-dispatched protocol handler might re-enter the
//! simulation. Nothing in this domain re-enters like that: `dispatch` below
//! borrows one registry (`nodes`/`switches`) plus the scheduler as plain
//! disjoint field accesses on `self`, which the borrow checker accepts
//! without any `unsafe`; the crate stays `#![forbid(unsafe_code)]`.

use fxhash::FxHashMap;

use priosim_types::id::{MsgId, NodeName, StreamId};
use priosim_types::message::Message;
use priosim_types::metrics as metric_names;
use priosim_types::stream::Stream;
use priosim_types::time::SimTime;
use tracing::{debug, info, warn};

use crate::ids::IdGen;
use crate::node::Node;
use crate::preemptive_switch::{PreemptiveSwitch, PreemptiveSwitchConfig};
use crate::scheduler::{Event, Scheduler};
use crate::stats::{GlobalStats, StreamStats};
use crate::switch::Switch;

/// A switch entity is either a basic strict-priority switch or a
/// preemptive one; both share the same `receive` contract (preemption
/// triggering wraps the same capacity check), so `Network` can hold either
/// behind one registry without matching on kind at every call site.
pub enum SwitchEntity {
    Basic(Switch),
    Preemptive(PreemptiveSwitch),
}

impl SwitchEntity {
    pub fn new_preemptive(
        name: impl Into<NodeName>,
        max_queue_size: Option<usize>,
        config: PreemptiveSwitchConfig,
    ) -> Self {
        let mut sw = PreemptiveSwitch::new(name, max_queue_size);
        sw.set_preemption_enabled(config.preemption_enabled);
        sw.set_min_preemption_interval(config.min_preemption_interval);
        sw.set_priority_threshold(config.priority_threshold);
        SwitchEntity::Preemptive(sw)
    }

    pub fn name(&self) -> &NodeName {
        match self {
            SwitchEntity::Basic(s) => s.name(),
            SwitchEntity::Preemptive(s) => s.name(),
        }
    }

    pub fn add_link(&mut self, port: impl Into<NodeName>, link: crate::link::Link) {
        match self {
            SwitchEntity::Basic(s) => s.add_link(port, link),
            SwitchEntity::Preemptive(s) => s.add_link(port, link),
        }
    }

    pub fn set_forwarding_entry(&mut self, dst: impl Into<NodeName>, port: impl Into<NodeName>) {
        match self {
            SwitchEntity::Basic(s) => s.set_forwarding_entry(dst, port),
            SwitchEntity::Preemptive(s) => s.set_forwarding_entry(dst, port),
        }
    }

    pub fn receive(
        &mut self,
        msg: Message,
        now: SimTime,
        scheduler: &mut Scheduler,
        dropped: &mut Vec<Message>,
    ) {
        match self {
            SwitchEntity::Basic(s) => s.receive(msg, now, scheduler, dropped),
            SwitchEntity::Preemptive(s) => s.receive(msg, now, scheduler, dropped),
        }
    }

    pub fn stats(&self) -> &crate::switch::SwitchStats {
        match self {
            SwitchEntity::Basic(s) => s.stats(),
            SwitchEntity::Preemptive(s) => s.stats(),
        }
    }

    pub fn as_preemptive(&self) -> Option<&PreemptiveSwitch> {
        match self {
            SwitchEntity::Preemptive(s) => Some(s),
            SwitchEntity::Basic(_) => None,
        }
    }
}

/// Top-level simulation state container: owns every node, switch, and link
/// (links live inside their owning node/switch), the event queue, and the
/// result sinks.
pub struct Network {
    sim_duration: SimTime,
    nodes: FxHashMap<NodeName, Node>,
    switches: FxHashMap<NodeName, SwitchEntity>,
    streams: FxHashMap<StreamId, Stream>,
    scheduler: Scheduler,
    id_gen: IdGen,
    completed_messages: Vec<Message>,
    completed_by_stream: FxHashMap<StreamId, Vec<Message>>,
    dropped_messages: Vec<Message>,
}

impl Network {
    pub fn new(sim_duration: SimTime) -> Self {
        Self {
            sim_duration,
            nodes: FxHashMap::default(),
            switches: FxHashMap::default(),
            streams: FxHashMap::default(),
            scheduler: Scheduler::new(),
            id_gen: IdGen::new(),
            completed_messages: Vec::new(),
            completed_by_stream: FxHashMap::default(),
            dropped_messages: Vec::new(),
        }
    }

    pub fn sim_duration(&self) -> SimTime {
        self.sim_duration
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn add_node(&mut self, name: impl Into<NodeName>) -> &mut Node {
        let name = name.into();
        self.nodes.entry(name.clone()).or_insert_with(|| Node::new(name))
    }

    pub fn node_mut(&mut self, name: &NodeName) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn node(&self, name: &NodeName) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Adds a basic (non-preemptive) strict-priority switch.
    pub fn add_switch(&mut self, name: impl Into<NodeName>, max_queue_size: Option<usize>) {
        let name = name.into();
        self.switches
            .insert(name.clone(), SwitchEntity::Basic(Switch::new(name, max_queue_size)));
    }

    /// Adds a `PreemptiveSwitch` configured with the given preemption policy.
    pub fn add_preemptive_switch(
        &mut self,
        name: impl Into<NodeName>,
        max_queue_size: Option<usize>,
        config: PreemptiveSwitchConfig,
    ) {
        let name = name.into();
        self.switches.insert(
            name.clone(),
            SwitchEntity::new_preemptive(name, max_queue_size, config),
        );
    }

    pub fn switch(&self, name: &NodeName) -> Option<&SwitchEntity> {
        self.switches.get(name)
    }

    pub fn switch_mut(&mut self, name: &NodeName) -> Option<&mut SwitchEntity> {
        self.switches.get_mut(name)
    }

    /// Registers `stream` with the network and with its source node,
    /// scheduling its first generation tick. Mirrors the source's
    /// `Network.add_stream` (registry) plus `Node.add_stream` (validation
    /// + scheduling), called together since both are the external entry
    /// points for wiring a stream in.
    pub fn add_stream(
        &mut self,
        stream: Stream,
        start_time: SimTime,
    ) -> Result<(), priosim_types::errors::ConfigError> {
        let stream_id = stream.stream_id;
        let node = self
            .nodes
            .get_mut(&stream.src)
            .unwrap_or_else(|| panic!("add_stream: unknown source node '{}'", stream.src));
        node.add_stream(stream.clone(), start_time, &mut self.scheduler)?;
        self.streams.insert(stream_id, stream);
        Ok(())
    }

    pub fn next_msg_id(&mut self) -> MsgId {
        self.id_gen.next_msg_id()
    }

    /// Total number of messages generated so far. A conservation check
    /// holds over the full run: this must equal `|completed| + |dropped|`.
    pub fn messages_generated(&self) -> u64 {
        self.id_gen.msg_count()
    }

    /// Runs the simulation to completion: pops the minimum `(time, seq)`
    /// event, stops once its time exceeds `sim_duration`, otherwise
    /// dispatches it (skipping cancelled events). Mirrors the source's
    /// `Network.run` loop exactly, including popping (and thereby advancing
    /// the clock to) the terminating out-of-range event before breaking.
    pub fn run(&mut self) {
        info!(sim_duration = self.sim_duration, "starting simulation");
        let mut events_processed: u64 = 0;
        loop {
            let Some(popped) = self.scheduler.pop() else {
                break;
            };
            if popped.time > self.sim_duration {
                break;
            }
            if !popped.valid {
                continue;
            }
            self.dispatch(popped.event, popped.time);
            events_processed += 1;
        }
        info!(
            events_processed,
            final_time = self.scheduler.now(),
            "simulation completed"
        );
    }

    fn dispatch(&mut self, event: Event, now: SimTime) {
        match event {
            Event::GenerateMessage { node, stream_id } => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.generate(stream_id, now, self.sim_duration, &mut self.id_gen, &mut self.scheduler);
                }
            }
            Event::Deliver { msg, dst } => self.deliver(msg, dst, now),
            Event::SwitchForward { switch } => {
                if let Some(SwitchEntity::Basic(sw)) = self.switches.get_mut(&switch) {
                    sw.forward_next(now, &mut self.scheduler);
                }
            }
            Event::SwitchCompletion { switch, msg_id, msg, dst } => {
                if let Some(SwitchEntity::Preemptive(sw)) = self.switches.get_mut(&switch) {
                    sw.clear_if_current(msg_id);
                }
                self.deliver(msg, dst, now);
            }
            Event::SwitchSlot { switch } => {
                if let Some(SwitchEntity::Preemptive(sw)) = self.switches.get_mut(&switch) {
                    sw.handle_slot(now, &mut self.scheduler);
                }
            }
        }
    }

    /// Dispatches `msg` to `dst` by entity kind: a `Node` records arrival
    /// and files it into the completed sinks; a `Switch`/`PreemptiveSwitch`
    /// re-enters its `receive` (enqueue + forwarding loop). An unknown
    /// destination is logged and the message is lost, matching the
    /// source's `deliver_message` "Warning: Unknown destination" branch —
    /// this should not occur with a well-formed forwarding table.
    fn deliver(&mut self, msg: Message, dst: NodeName, now: SimTime) {
        if let Some(node) = self.nodes.get_mut(&dst) {
            let stream_id = msg.stream_id;
            let delivered = node.receive(msg, now);
            metrics::counter!(
                metric_names::MET_MSG_DELIVERED,
                metric_names::LBL_STREAM => stream_id.to_string()
            )
            .increment(1);
            if let Some(delay_ms) = delivered.end_to_end_delay_ms() {
                metrics::histogram!(metric_names::MET_DELAY_HISTO).record(delay_ms);
            }
            self.completed_by_stream
                .entry(stream_id)
                .or_default()
                .push(delivered.clone());
            self.completed_messages.push(delivered);
            return;
        }
        if let Some(sw) = self.switches.get_mut(&dst) {
            let mut dropped = Vec::new();
            sw.receive(msg, now, &mut self.scheduler, &mut dropped);
            self.track_dropped_many(dropped);
            return;
        }
        warn!(dst = %dst, "unknown destination in deliver(); message lost");
    }

    fn track_dropped_many(&mut self, dropped: Vec<Message>) {
        for msg in dropped {
            self.track_dropped(msg);
        }
    }

    /// Files a terminally-dropped message into the dropped sink, emitting a
    /// `tracing::warn` and a `metrics::counter!` increment keyed by reason.
    pub fn track_dropped(&mut self, msg: Message) {
        let reason = msg.drop_reason.map(|r| r.as_str()).unwrap_or("");
        warn!(msg_id = msg.msg_id, stream_id = msg.stream_id, reason, "message dropped");
        metrics::counter!(
            metric_names::MET_MSG_DROPPED,
            metric_names::LBL_STREAM => msg.stream_id.to_string(),
            metric_names::LBL_REASON => reason.to_string()
        )
        .increment(1);
        self.dropped_messages.push(msg);
    }

    pub fn completed_messages(&self) -> &[Message] {
        &self.completed_messages
    }

    pub fn dropped_messages(&self) -> &[Message] {
        &self.dropped_messages
    }

    /// Per-stream statistics: delay mean/min/max, mean jitter, throughput
    /// in Mbps, delivered/dropped counts. Mirrors the source's
    /// `get_stream_statistics` exactly (including its early-return shapes
    /// for a stream with no completed messages).
    pub fn stream_statistics(&self, stream_id: StreamId) -> StreamStats {
        let priority = self.streams.get(&stream_id).map(|s| s.priority);
        let delivered = self
            .completed_by_stream
            .get(&stream_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let dropped = self
            .dropped_messages
            .iter()
            .filter(|m| m.stream_id == stream_id)
            .count() as u64;
        StreamStats::compute(stream_id, priority, delivered, dropped)
    }

    pub fn stream_ids(&self) -> Vec<StreamId> {
        let mut ids: Vec<StreamId> = self.streams.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Global statistics across all streams, mirroring the source's
    /// `get_global_statistics`.
    pub fn global_statistics(&self) -> GlobalStats {
        GlobalStats::compute(
            &self.completed_messages,
            self.dropped_messages.len() as u64,
            self.streams.len(),
        )
    }

    /// Writes the results CSV (one row per message, completed then
    /// dropped, in that order) to `path`. Field order and textual
    /// conventions (`True`/`False`, empty fields for dropped rows) follow
    /// the source's `export_to_csv` exactly, since this is a consumer-facing
    /// contract.
    pub fn export_csv(&self, path: impl AsRef<std::path::Path>) -> Result<(), std::io::Error> {
        crate::csv_export::export_csv(
            path,
            self.completed_messages.iter(),
            self.dropped_messages.iter(),
        )?;
        debug!(
            rows = self.completed_messages.len() + self.dropped_messages.len(),
            "exported results csv"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use priosim_types::stream::Stream;

    fn link(mbps: f64, ms: f64) -> crate::link::Link {
        crate::link::Link::new("l", mbps, ms).unwrap()
    }

    /// Single link serialization: a lone stream's delay is pure
    /// transmission-plus-propagation time, with zero jitter.
    #[test]
    fn s1_single_link_serialization() {
        let mut net = Network::new(1.0);
        net.add_node("A");
        net.add_node("B");
        net.node_mut(&"A".into()).unwrap().set_output_link(link(100.0, 1.0));
        net.node_mut(&"A".into()).unwrap().set_next_hop("B");

        let stream = Stream::new(1, 0, "A", "B", 0.1, 1500, "s1").unwrap();
        net.add_stream(stream, 0.0).unwrap();
        net.run();

        let stats = net.stream_statistics(1);
        assert_eq!(stats.total_messages, 10);
        assert_eq!(stats.dropped_messages, 0);
        let expected_delay_ms = (1500.0 * 8.0 / 100_000_000.0 + 0.001) * 1000.0;
        assert!((stats.mean_delay_ms.unwrap() - expected_delay_ms).abs() < 1e-6);
        assert_eq!(stats.mean_jitter_ms.unwrap(), 0.0);
    }

    #[test]
    fn unknown_destination_is_logged_and_lost() {
        let mut net = Network::new(1.0);
        net.add_node("A");
        let msg = Message::new(0, 1, 0, 3, "A".into(), "ghost".into(), 100, 0.0);
        net.deliver(msg, "ghost".into(), 0.0);
        assert!(net.completed_messages().is_empty());
        assert!(net.dropped_messages().is_empty());
    }

    /// Strict priority at a switch: a high-priority stream must never wait
    /// behind a low-priority one.
    #[test]
    fn s2_strict_priority_at_switch() {
        let mut net = Network::new(1.0);
        net.add_node("A");
        net.add_node("B");
        net.add_node("C");
        net.add_switch("SW", Some(1000));

        net.node_mut(&"A".into()).unwrap().set_output_link(link(100.0, 1.0));
        net.node_mut(&"A".into()).unwrap().set_next_hop("SW");
        net.node_mut(&"B".into()).unwrap().set_output_link(link(100.0, 1.0));
        net.node_mut(&"B".into()).unwrap().set_next_hop("SW");

        if let Some(SwitchEntity::Basic(sw)) = net.switch_mut(&"SW".into()) {
            sw.add_link("C", link(100.0, 1.0));
            sw.set_forwarding_entry("C", "C");
        } else {
            panic!("expected a basic switch");
        }

        let p7 = Stream::new(7, 7, "A", "C", 0.01, 1000, "high").unwrap();
        let p1 = Stream::new(1, 1, "B", "C", 0.005, 1000, "low").unwrap();
        net.add_stream(p7, 0.0).unwrap();
        net.add_stream(p1, 0.0).unwrap();
        net.run();

        let high = net.stream_statistics(7);
        let low = net.stream_statistics(1);
        assert_eq!(high.dropped_messages, 0);
        assert!(high.mean_delay_ms.unwrap() <= low.mean_delay_ms.unwrap());
    }

    /// Conservation: every generated message ends up in exactly one of the
    /// completed/dropped sinks, or is still in flight (queued or mid-link)
    /// at the moment `sim_duration` cuts the run off — spec invariant #5 is
    /// scoped to messages generated *within* `sim_duration`, and at a 1
    /// Mbps egress against a 1 ms generation interval this scenario
    /// guarantees backlog at the cutoff (the last forwarded frame's
    /// `Deliver` lands past `sim_duration` and is never dispatched, and at
    /// least one more sits unforwarded in the queue), so `generated` can
    /// exceed `completed + dropped`.
    #[test]
    fn conservation_completed_plus_dropped_equals_generated() {
        let mut net = Network::new(0.2);
        net.add_node("A");
        net.add_node("B");
        net.add_switch("SW", Some(1));

        net.node_mut(&"A".into()).unwrap().set_output_link(link(1000.0, 0.0));
        net.node_mut(&"A".into()).unwrap().set_next_hop("SW");
        if let Some(SwitchEntity::Basic(sw)) = net.switch_mut(&"SW".into()) {
            sw.add_link("B", link(1.0, 1.0));
            sw.set_forwarding_entry("B", "B");
        } else {
            panic!("expected a basic switch");
        }

        let stream = Stream::new(1, 0, "A", "B", 0.001, 1000, "congested").unwrap();
        net.add_stream(stream, 0.0).unwrap();
        net.run();

        let generated = net.messages_generated();
        let completed = net.completed_messages().len() as u64;
        let dropped = net.dropped_messages().len() as u64;
        assert!(generated >= completed + dropped);
        assert!(dropped > 0, "a tight queue should force at least one drop");
    }
}
