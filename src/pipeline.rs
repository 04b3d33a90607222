//! Filter→Highlight→Sink composition.
//!
//! Tail events flow through an explicit pipeline stage instead of callbacks
//! threaded through layers: the pipeline owns the foreground file's raw text
//! buffer plus both engines, and turns each event into a render update the
//! presentation layer can apply directly.
//!
//! The engines' pattern/rule collections are mutated only by the foreground
//! caller; each applied increment re-evaluates them synchronously on that
//! same task.

use crate::filter::FilterEngine;
use crate::highlight::{HighlightEngine, StyleSpan};
use crate::model::FilteredLine;
use crate::tail::protocol::TailEvent;

/// What the presentation layer should do with its text widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderUpdate {
    /// Replace the whole visible text (initial load, truncate, or any change
    /// while filters are active).
    Replace {
        text: String,
        spans: Vec<StyleSpan>,
        lines: Vec<FilteredLine>,
    },
    /// Append an increment to the visible text. `spans` cover the whole
    /// visible text after the append, since new matches can extend into it.
    Append {
        text: String,
        spans: Vec<StyleSpan>,
    },
}

/// Incremental view computation for the foreground file.
#[derive(Debug, Default)]
pub struct ViewPipeline {
    highlight: HighlightEngine,
    filter: FilterEngine,
    buffer: String,
}

impl ViewPipeline {
    pub fn new(highlight: HighlightEngine, filter: FilterEngine) -> Self {
        Self {
            highlight,
            filter,
            buffer: String::new(),
        }
    }

    pub fn highlight_engine(&self) -> &HighlightEngine {
        &self.highlight
    }

    pub fn highlight_engine_mut(&mut self) -> &mut HighlightEngine {
        &mut self.highlight
    }

    pub fn filter_engine(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn filter_engine_mut(&mut self) -> &mut FilterEngine {
        &mut self.filter
    }

    /// The full raw text accumulated for the foreground file.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Apply one tail event. Error events carry no content and yield no
    /// update; the sink's error hook handles them.
    pub fn apply(&mut self, event: &TailEvent) -> Option<RenderUpdate> {
        match event {
            TailEvent::InitialLoad { text, .. } => {
                self.buffer = text.clone();
                Some(self.rebuild())
            }
            TailEvent::Append { text, .. } => {
                self.buffer.push_str(text);
                if self.filter.has_active_rules() {
                    Some(self.rebuild())
                } else {
                    Some(RenderUpdate::Append {
                        text: text.clone(),
                        spans: self.highlight.highlight(&self.buffer),
                    })
                }
            }
            TailEvent::TruncateReset { .. } => {
                self.buffer.clear();
                Some(self.rebuild())
            }
            TailEvent::Error { .. } => None,
        }
    }

    /// Recompute the full view, e.g. after a pattern or rule was toggled.
    pub fn refresh(&mut self) -> RenderUpdate {
        self.rebuild()
    }

    fn rebuild(&self) -> RenderUpdate {
        let lines = self.filter.filter_content(&self.buffer);
        let text = if self.filter.has_active_rules() {
            let mut joined = lines
                .iter()
                .map(|l| l.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            if !joined.is_empty() {
                joined.push('\n');
            }
            joined
        } else {
            self.buffer.clone()
        };
        let spans = self.highlight.highlight(&text);

        RenderUpdate::Replace { text, spans, lines }
    }
}
