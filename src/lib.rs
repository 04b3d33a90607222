//! # taillog - Live Log File Viewer Core
//!
//! The tailing engine and incremental text-processing pipeline behind a live
//! log viewer: per-file background followers that detect appended, truncated
//! or rotated content, and regex-driven highlight/filter evaluation that
//! turns raw line text into styled, filtered output.
//!
//! ## Features
//!
//! - **Follow-on-write**: poll-based per-file followers with exact byte-range
//!   reads and truncate/rewrite detection
//! - **Highlighting**: built-in `ERROR`/`WARN`/`INFO` severity patterns plus
//!   user patterns with color-derived style classes and custom-beats-severity
//!   overlap resolution
//! - **Filtering**: AND-combined line filters preserving original line numbers
//! - **Settings**: JSON persistence of patterns, rules, per-file enabled
//!   states and bookmarks
//!
//! ## Architecture
//!
//! The library is organized into focused modules:
//!
//! - [`error`] - Centralized error types and handling
//! - [`pattern`] - Pattern compilation shared by both engines
//! - [`highlight`] / [`filter`] - The two text-processing engines
//! - [`tail`] - Follower sessions, registry and the event protocol
//! - [`pipeline`] - Filter→Highlight→Sink composition
//! - [`settings`] - Persistent preferences keyed by file

// Core modules
pub mod error;
pub mod model;
pub mod pattern;

// Text-processing engines
pub mod filter;
pub mod highlight;

// Tailing subsystem and its composition with the engines
pub mod pipeline;
pub mod tail;

// Collaborator-facing plumbing
pub mod discovery;
pub mod settings;

// Re-export commonly used types for convenience
pub use error::{Result, TaillogError};

// Public API surface for external usage
pub use filter::FilterEngine;
pub use highlight::{HighlightEngine, StyleSpan};
pub use model::{Bookmark, FilterRule, FilteredLine, HighlightPattern};
pub use pipeline::{RenderUpdate, ViewPipeline};
pub use tail::{ContentSink, SessionRegistry, TailEvent, TailSession};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
