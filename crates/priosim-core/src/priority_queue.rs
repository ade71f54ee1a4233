//! # priosim-core::priority_queue
//!
//! Eight strict-priority FIFO buckets with a cached total length and
//! priority-aware tail-drop support. Grounded on the source simulator's
//! `PriorityQueue` class (`enqueue`/`dequeue`/`get_lowest_priority_message`/
//! `drop_lowest_priority_message`), expressed as `[VecDeque<_>; 8]`.

use std::collections::VecDeque;

use priosim_types::id::PortId;
use priosim_types::message::Message;

/// Eight priority-indexed FIFO queues (0 lowest .. 7 highest), plus a
/// cached count so `len()`/`is_empty()` are O(1).
pub struct PriorityQueue {
    levels: [VecDeque<(Message, PortId)>; 8],
    total_size: usize,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self {
            levels: Default::default(),
            total_size: 0,
        }
    }

    /// O(1): appends to the bucket for `msg.priority`.
    pub fn enqueue(&mut self, msg: Message, port: PortId) {
        let p = msg.priority as usize;
        self.levels[p].push_back((msg, port));
        self.total_size += 1;
    }

    /// Scans priorities 7 down to 0, popping the front (oldest) of the
    /// first non-empty bucket. O(8) worst case.
    pub fn dequeue(&mut self) -> Option<(Message, PortId)> {
        for p in (0..8).rev() {
            if let Some(item) = self.levels[p].pop_front() {
                self.total_size -= 1;
                return Some(item);
            }
        }
        None
    }

    /// Scans priorities 0 up to 7, returning the tail entry of the first
    /// non-empty bucket — the eviction candidate when the queue is full
    /// and a higher-priority message arrives.
    pub fn peek_lowest(&self) -> Option<(u8, &Message, &PortId)> {
        for (p, level) in self.levels.iter().enumerate() {
            if let Some((msg, port)) = level.back() {
                return Some((p as u8, msg, port));
            }
        }
        None
    }

    /// Removes and returns the same tail entry `peek_lowest` would report.
    pub fn drop_lowest(&mut self) -> Option<Message> {
        for level in self.levels.iter_mut() {
            if let Some((msg, _port)) = level.pop_back() {
                self.total_size -= 1;
                return Some(msg);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.total_size
    }

    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }
}

impl Default for PriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: u64, priority: u8) -> Message {
        Message::new(id, 0, 0, priority, "A".into(), "B".into(), 100, 0.0)
    }

    #[test]
    fn dequeue_respects_strict_priority() {
        let mut q = PriorityQueue::new();
        q.enqueue(msg(1, 0), "p".into());
        q.enqueue(msg(2, 7), "p".into());
        q.enqueue(msg(3, 3), "p".into());
        let (first, _) = q.dequeue().unwrap();
        assert_eq!(first.priority, 7);
        let (second, _) = q.dequeue().unwrap();
        assert_eq!(second.priority, 3);
        let (third, _) = q.dequeue().unwrap();
        assert_eq!(third.priority, 0);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn fifo_within_a_priority() {
        let mut q = PriorityQueue::new();
        q.enqueue(msg(1, 4), "p".into());
        q.enqueue(msg(2, 4), "p".into());
        assert_eq!(q.dequeue().unwrap().0.msg_id, 1);
        assert_eq!(q.dequeue().unwrap().0.msg_id, 2);
    }

    #[test]
    fn peek_and_drop_lowest_target_lowest_nonempty_priority() {
        let mut q = PriorityQueue::new();
        q.enqueue(msg(1, 0), "p".into());
        q.enqueue(msg(2, 2), "p".into());
        let (priority, _, _) = q.peek_lowest().unwrap();
        assert_eq!(priority, 0);
        let dropped = q.drop_lowest().unwrap();
        assert_eq!(dropped.priority, 0);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn total_size_tracks_all_levels() {
        let mut q = PriorityQueue::new();
        assert!(q.is_empty());
        q.enqueue(msg(1, 0), "p".into());
        q.enqueue(msg(2, 7), "p".into());
        assert_eq!(q.len(), 2);
        q.dequeue();
        assert_eq!(q.len(), 1);
    }
}
