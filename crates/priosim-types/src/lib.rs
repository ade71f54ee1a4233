//! # priosim-types
//!
//! Foundational, shared data types for the priosim workspace: identifiers,
//! simulation time, messages and streams, configuration, and errors. Kept
//! dependency-light and `unsafe`-free so that `priosim-core` and
//! `priosim-cli` can share a stable vocabulary without pulling in the
//! engine's scheduling machinery.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod id;
pub mod message;
pub mod metrics;
pub mod stream;
pub mod time;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::errors::*;
    pub use crate::id::*;
    pub use crate::message::*;
    pub use crate::metrics;
    pub use crate::stream::*;
    pub use crate::time::*;
}
