//! # priosim-core::scheduler
//!
//! Defines the `Event` enum, the cancellable `EventHandle`, and the
//! `Scheduler` itself: a time-ordered `BinaryHeap` with stable tie-breaking
//! by insertion sequence. Grounded on the source repo's `events.rs`
//! (`Queued<T>` with a hand-written reversed `Ord` to turn `BinaryHeap`
//! into a min-heap), simplified to the ordering this simulator actually
//! requires — `(time, seq)` only, no secondary discriminant tier.
//!
//! Closures capturing mutable simulator state are deliberately avoided here:
//! every event is a plain data variant naming the entities it concerns by
//! id, and `Network::dispatch` resolves those ids against its own arenas.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use priosim_types::id::{EventSeq, MsgId, NodeName, StreamId};
use priosim_types::message::Message;
use priosim_types::time::SimTime;

/// All events schedulable in the simulation. Dispatch on this is done by
/// `Network::step`, never inside the scheduler itself.
#[derive(Debug, Clone)]
pub enum Event {
    /// A node's stream generator fires, possibly emitting a `Message`.
    GenerateMessage { node: NodeName, stream_id: StreamId },
    /// A message arrives at its next hop (a `Node` or a `Switch`).
    Deliver { msg: Message, dst: NodeName },
    /// A basic switch's link has become free; re-enter the forwarding loop.
    SwitchForward { switch: NodeName },
    /// A preemptive switch's in-flight transmission has fully completed:
    /// clear `current_transmission` if it still names this message, then
    /// deliver it.
    SwitchCompletion {
        switch: NodeName,
        msg_id: MsgId,
        msg: Message,
        dst: NodeName,
    },
    /// A preemptive switch's link has become free; clear `is_transmitting`
    /// and re-enter the forwarding loop.
    SwitchSlot { switch: NodeName },
}

/// A handle to a scheduled event, usable to cancel it before it fires.
/// Cancellation is an `Rc<Cell<bool>>` flip rather than an atomic: the
/// engine is single-threaded and cooperative, so there is never a
/// concurrent writer to race with.
#[derive(Debug, Clone)]
pub struct EventHandle(Rc<Cell<bool>>);

impl EventHandle {
    /// Marks the event invalid. Idempotent; cancelling twice, or cancelling
    /// an event that has already fired, is a no-op.
    pub fn cancel(&self) {
        self.0.set(false);
    }

    pub fn is_valid(&self) -> bool {
        self.0.get()
    }
}

struct Queued {
    time: SimTime,
    seq: EventSeq,
    valid: Rc<Cell<bool>>,
    event: Event,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    /// `BinaryHeap` is a max-heap; reverse both keys so the heap pops the
    /// smallest `(time, seq)` pair first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// An event popped off the queue, carrying its validity at pop time. The
/// caller (`Network::run`) decides whether to dispatch it.
pub struct PoppedEvent {
    pub time: SimTime,
    pub valid: bool,
    pub event: Event,
}

/// The global discrete-event queue. Knows nothing about `sim_duration` or
/// about the entities named inside `Event` — that's `Network`'s job.
pub struct Scheduler {
    clock: SimTime,
    seq: EventSeq,
    queue: BinaryHeap<Queued>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.clock
    }

    /// Schedules `event` at `time`, returning a handle that can cancel it.
    /// `time` must not precede the current clock: a past-dated schedule is
    /// a programmer error, not a recoverable condition.
    pub fn schedule(&mut self, time: SimTime, event: Event) -> EventHandle {
        assert!(
            time >= self.clock,
            "cannot schedule event at {time} before current_time {}",
            self.clock
        );
        let valid = Rc::new(Cell::new(true));
        let seq = self.seq;
        self.seq = self.seq.checked_add(1).expect("EventSeq overflow");
        self.queue.push(Queued {
            time,
            seq,
            valid: valid.clone(),
            event,
        });
        EventHandle(valid)
    }

    /// Pops the minimum `(time, seq)` event, if any, advancing the clock to
    /// its time. Does not check validity or any `sim_duration` bound —
    /// `Network::run` does both, since the clock must still advance even
    /// past a cancelled event.
    pub fn pop(&mut self) -> Option<PoppedEvent> {
        let q = self.queue.pop()?;
        assert!(
            q.time >= self.clock,
            "scheduler popped event at {} before current_time {} (fatal: time went backwards)",
            q.time,
            self.clock
        );
        self.clock = q.time;
        Some(PoppedEvent {
            time: q.time,
            valid: q.valid.get(),
            event: q.event,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: MsgId) -> Message {
        Message::new(id, 0, 0, 0, "A".into(), "B".into(), 100, 0.0)
    }

    #[test]
    fn pops_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(2.0, Event::SwitchForward { switch: "X".into() });
        s.schedule(1.0, Event::SwitchForward { switch: "Y".into() });
        let first = s.pop().unwrap();
        assert_eq!(first.time, 1.0);
        let second = s.pop().unwrap();
        assert_eq!(second.time, 2.0);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(
            1.0,
            Event::Deliver {
                msg: msg(0),
                dst: "first".into(),
            },
        );
        s.schedule(
            1.0,
            Event::Deliver {
                msg: msg(1),
                dst: "second".into(),
            },
        );
        let a = s.pop().unwrap();
        let b = s.pop().unwrap();
        match (a.event, b.event) {
            (Event::Deliver { dst: d1, .. }, Event::Deliver { dst: d2, .. }) => {
                assert_eq!(d1.as_str(), "first");
                assert_eq!(d2.as_str(), "second");
            }
            _ => panic!("unexpected event variants"),
        }
    }

    #[test]
    fn cancelled_event_pops_invalid() {
        let mut s = Scheduler::new();
        let handle = s.schedule(1.0, Event::SwitchForward { switch: "X".into() });
        handle.cancel();
        let popped = s.pop().unwrap();
        assert!(!popped.valid);
    }

    #[test]
    #[should_panic(expected = "before current_time")]
    fn scheduling_in_the_past_panics() {
        let mut s = Scheduler::new();
        s.schedule(5.0, Event::SwitchForward { switch: "X".into() });
        s.pop();
        s.schedule(1.0, Event::SwitchForward { switch: "Y".into() });
    }
}
