//! # priosim-core::node
//!
//! A `Node` is a stream-driven message generator and an arrival sink.
//! Grounded on the source simulator's `Node` class
//! (`add_stream`/`generate_message`/`receive_message`), stripped of the
//! protocol-SDK fields a reusable node runtime would carry (`proto`,
//! `store`, `byzantine`) — there is no pluggable protocol layer in this
//! domain.

use fxhash::FxHashMap;

use priosim_types::errors::ConfigError;
use priosim_types::id::{NodeName, StreamId};
use priosim_types::message::Message;
use priosim_types::stream::Stream;
use priosim_types::time::SimTime;

use crate::ids::IdGen;
use crate::link::Link;
use crate::scheduler::{Event, Scheduler};

pub struct Node {
    name: NodeName,
    output_link: Option<Link>,
    next_hop: Option<NodeName>,
    streams: FxHashMap<StreamId, Stream>,
    seq_counters: FxHashMap<StreamId, u64>,
    received: Vec<Message>,
}

impl Node {
    pub fn new(name: impl Into<NodeName>) -> Self {
        Self {
            name: name.into(),
            output_link: None,
            next_hop: None,
            streams: FxHashMap::default(),
            seq_counters: FxHashMap::default(),
            received: Vec::new(),
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn set_output_link(&mut self, link: Link) {
        self.output_link = Some(link);
    }

    pub fn output_link_configured(&self) -> bool {
        self.output_link.is_some()
    }

    pub fn set_next_hop(&mut self, hop: impl Into<NodeName>) {
        self.next_hop = Some(hop.into());
    }

    pub fn received(&self) -> &[Message] {
        &self.received
    }

    /// Registers `stream` (validating it actually originates here) and
    /// schedules its first generation tick at `start_time`.
    pub fn add_stream(
        &mut self,
        stream: Stream,
        start_time: SimTime,
        scheduler: &mut Scheduler,
    ) -> Result<(), ConfigError> {
        if stream.src != self.name {
            return Err(ConfigError::StreamSourceMismatch {
                stream_id: stream.stream_id,
                declared: stream.src.as_str().to_string(),
                node: self.name.as_str().to_string(),
            });
        }
        let stream_id = stream.stream_id;
        self.seq_counters.insert(stream_id, 0);
        self.streams.insert(stream_id, stream);
        scheduler.schedule(
            start_time,
            Event::GenerateMessage {
                node: self.name.clone(),
                stream_id,
            },
        );
        Ok(())
    }

    /// Handles a `GenerateMessage` tick for `stream_id` at time `now`.
    ///
    /// A `msg_id` is allocated from `id_gen` only once every other
    /// precondition (time bound, stream still registered, output link
    /// configured) has passed — mirroring spec step order ("if t >=
    /// sim_duration, stop" *before* "allocate msg_id from Network") so that
    /// a no-op tick never burns an id with no corresponding message.
    ///
    /// Edge cases: if `output_link` is missing, the generator no-ops and
    /// does *not* reschedule itself — the stream halts for good, matching
    /// the source's early return. If `next_hop` is unset, the message is
    /// still created and still consumes link bandwidth, but is silently not
    /// routed (no `Deliver` is scheduled); generation otherwise continues
    /// on its normal interval. Both match the source's current behavior and
    /// are left as-is rather than "fixed".
    pub fn generate(
        &mut self,
        stream_id: StreamId,
        now: SimTime,
        sim_duration: SimTime,
        id_gen: &mut IdGen,
        scheduler: &mut Scheduler,
    ) {
        if now >= sim_duration {
            return;
        }
        let Some(stream) = self.streams.get(&stream_id).cloned() else {
            return;
        };
        let Some(link) = self.output_link.as_mut() else {
            return;
        };

        let msg_id = id_gen.next_msg_id();
        let seq_num = *self.seq_counters.entry(stream_id).or_insert(0);
        *self.seq_counters.get_mut(&stream_id).unwrap() += 1;

        let msg = Message::new(
            msg_id,
            stream_id,
            seq_num,
            stream.priority,
            stream.src.clone(),
            stream.dst.clone(),
            stream.size_bytes,
            now,
        );

        let arrival = link.start_transmission(now, msg.size_bytes);

        if let Some(target) = self.next_hop.clone() {
            scheduler.schedule(arrival, Event::Deliver { msg, dst: target });
        }

        let next_time = now + stream.interval_sec;
        scheduler.schedule(
            next_time,
            Event::GenerateMessage {
                node: self.name.clone(),
                stream_id,
            },
        );
    }

    /// Records an arriving message: stamps `arrival_time` and appends to
    /// the receive log. The `Network` facade separately files it into the
    /// completed-messages sink.
    pub fn receive(&mut self, mut msg: Message, now: SimTime) -> Message {
        msg.arrival_time = Some(now);
        self.received.push(msg.clone());
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use priosim_types::stream::Stream;

    fn stream(id: StreamId) -> Stream {
        Stream::new(id, 3, "A", "B", 0.1, 1000, "test").unwrap()
    }

    #[test]
    fn add_stream_rejects_source_mismatch() {
        let mut node = Node::new("B");
        let mut sched = Scheduler::new();
        let err = node.add_stream(stream(1), 0.0, &mut sched).unwrap_err();
        matches!(err, ConfigError::StreamSourceMismatch { .. });
    }

    #[test]
    fn generate_without_output_link_halts_permanently() {
        let mut node = Node::new("A");
        let mut sched = Scheduler::new();
        node.add_stream(stream(1), 0.0, &mut sched).unwrap();
        let popped = sched.pop().unwrap();
        match popped.event {
            Event::GenerateMessage { stream_id, .. } => {
                node.generate(stream_id, 0.0, 10.0, &mut IdGen::new(), &mut sched);
            }
            _ => panic!("expected GenerateMessage"),
        }
        // No output_link was set: no further events, no message recorded.
        assert!(sched.is_empty());
        assert!(node.received().is_empty());
    }

    #[test]
    fn generate_reschedules_itself_on_its_interval() {
        let mut node = Node::new("A");
        node.set_output_link(Link::new("l", 100.0, 1.0).unwrap());
        node.set_next_hop("B");
        let mut sched = Scheduler::new();
        node.add_stream(stream(1), 0.0, &mut sched).unwrap();
        let popped = sched.pop().unwrap();
        let stream_id = match popped.event {
            Event::GenerateMessage { stream_id, .. } => stream_id,
            _ => panic!(),
        };
        let mut id_gen = IdGen::new();
        node.generate(stream_id, 0.0, 10.0, &mut id_gen, &mut sched);
        // A Deliver and the next GenerateMessage should both be queued.
        let mut saw_deliver = false;
        let mut saw_generate = false;
        while let Some(p) = sched.pop() {
            match p.event {
                Event::Deliver { .. } => saw_deliver = true,
                Event::GenerateMessage { .. } => saw_generate = true,
                _ => {}
            }
        }
        assert!(saw_deliver && saw_generate);
    }
}
