//! Event protocol between the tail followers and the presentation layer.
//!
//! Followers never mutate shared render state directly: every increment is
//! handed off on a channel and applied by a single consumer, keeping a
//! single-writer discipline over the rendered buffer.

use crate::error::TaillogError;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;

/// Content events emitted by tail sessions, FIFO per file.
#[derive(Debug)]
pub enum TailEvent {
    /// One-shot full read of a freshly opened file.
    InitialLoad { path: PathBuf, text: String },
    /// Newly appended content decoded from the followed byte range.
    Append { path: PathBuf, text: String },
    /// The file shrank or was rewritten in place; the display should reset
    /// before the rewritten content arrives as an append.
    TruncateReset { path: PathBuf },
    /// A non-fatal condition observed by a follower, surfaced for tests and
    /// UI notices rather than swallowed silently.
    Error { path: PathBuf, error: TaillogError },
}

impl TailEvent {
    /// The file this event belongs to.
    pub fn path(&self) -> &Path {
        match self {
            TailEvent::InitialLoad { path, .. }
            | TailEvent::Append { path, .. }
            | TailEvent::TruncateReset { path }
            | TailEvent::Error { path, .. } => path,
        }
    }
}

/// Presentation-side consumer of tail events. The core never assumes a
/// specific UI widget; implementors own rendering.
pub trait ContentSink: Send {
    fn on_initial_load(&mut self, path: &Path, text: &str);
    fn on_append(&mut self, path: &Path, text: &str);
    fn on_truncate_and_reset(&mut self, path: &Path);

    /// Non-fatal notices (missing file, skipped pattern). Default: ignore.
    fn on_error(&mut self, _path: &Path, _error: &TaillogError) {}
}

/// Drain the event channel into a sink. This is the single serialization
/// point: increments from all followers are applied here, in the order each
/// file produced them.
pub async fn dispatch_events(mut rx: UnboundedReceiver<TailEvent>, sink: &mut dyn ContentSink) {
    while let Some(event) = rx.recv().await {
        match event {
            TailEvent::InitialLoad { path, text } => sink.on_initial_load(&path, &text),
            TailEvent::Append { path, text } => sink.on_append(&path, &text),
            TailEvent::TruncateReset { path } => sink.on_truncate_and_reset(&path),
            TailEvent::Error { path, error } => sink.on_error(&path, &error),
        }
    }
}
