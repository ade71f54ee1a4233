//! # priosim-core::ids
//!
//! Provides a generator for unique, monotonic message IDs. Event insertion
//! sequence numbers are generated and owned by the `Scheduler` itself
//! (`scheduler.rs`'s own `seq` counter), not here.

use priosim_types::id::MsgId;

/// A generator for the simulation's monotonic message id counter.
pub struct IdGen {
    msg_id: MsgId,
}

impl IdGen {
    pub fn new() -> Self {
        Self { msg_id: 0 }
    }

    pub fn next_msg_id(&mut self) -> MsgId {
        let id = self.msg_id;
        self.msg_id = self.msg_id.checked_add(1).expect("MsgId overflow");
        id
    }

    /// Count of ids handed out so far, without allocating a new one.
    pub fn msg_count(&self) -> MsgId {
        self.msg_id
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}
