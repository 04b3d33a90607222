//! File tailing subsystem.
//!
//! One [`TailSession`] follows one file from a background task, detecting
//! growth, truncation and in-place rewrites, and emitting decoded increments
//! onto a single event channel. The [`SessionRegistry`] owns every session,
//! enforces "one follower per file path", and coordinates start/stop/switch.

pub mod protocol;
pub mod registry;
pub mod session;

pub use protocol::{dispatch_events, ContentSink, TailEvent};
pub use registry::SessionRegistry;
pub use session::{load_full_content, TailSession};
