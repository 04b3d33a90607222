//! Highlight evaluation: turns raw text plus the enabled highlight patterns
//! into an ordered, non-overlapping list of styled spans.
//!
//! Three built-in severity patterns (`ERROR`, `WARN`, `INFO`) are always
//! evaluated case-insensitively in addition to the user's custom patterns.
//! Overlaps resolve by tier: custom beats severity, and within a tier the
//! match that starts first wins. The output spans partition `[0, len)` of the
//! input text exactly; unstyled gaps carry no style class.
//!
//! The engine is case-insensitive for both literal and regex patterns.

use crate::error::Result;
use crate::model::HighlightPattern;
use crate::pattern::CompiledMatcher;
use log::warn;
use std::collections::HashMap;

/// Built-in log-level markers, always highlighted regardless of configuration.
const SEVERITY_PATTERNS: [(&str, &str); 3] = [("ERROR", "error"), ("WARN", "warn"), ("INFO", "info")];

/// Priority class of a match used to resolve overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Built-in severity pattern (lower priority).
    Severity,
    /// User-defined pattern (higher priority).
    Custom,
}

/// A single pattern match in the text. Transient: produced fresh on every
/// highlight pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMatch {
    pub start: usize,
    pub end: usize,
    pub style_class: String,
    pub tier: MatchTier,
}

/// One styled (or unstyled) run of text. Spans are emitted in order, do not
/// overlap, and their lengths sum to the length of the highlighted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    /// Style class for this run, or `None` for an unstyled gap.
    pub style_class: Option<String>,
}

impl StyleSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Normalize a color specification to lowercase `#rrggbb`.
///
/// Accepts `#rrggbb`, `#rrggbbaa`, and `0xrrggbbaa` (the formats the original
/// color pickers produce); anything else is cleaned up best-effort. Empty
/// input falls back to red.
pub fn normalize_color(color: &str) -> String {
    if color.is_empty() {
        return "#ff0000".to_string();
    }

    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() == 6 {
            return format!("#{}", hex.to_lowercase());
        }
        if hex.len() == 8 {
            // Drop the alpha channel
            return format!("#{}", hex[..6].to_lowercase());
        }
    }

    if let Some(hex) = color.strip_prefix("0x") {
        if hex.len() == 8 {
            return format!("#{}", hex[..6].to_lowercase());
        }
    }

    let mut cleaned = color.replace("0x", "#");
    cleaned.retain(|c| c.is_ascii());
    if !cleaned.starts_with('#') {
        cleaned.insert(0, '#');
    }
    cleaned.truncate(7);
    cleaned.to_lowercase()
}

/// Derive the style class for a custom pattern from its normalized color.
pub fn style_class_for_color(color: &str) -> String {
    let normalized = normalize_color(color);
    format!("highlight-{}", &normalized[1..])
}

/// Evaluates highlight patterns over full text and produces the merged span
/// list. Owns the mutable custom-pattern collection; the collection is only
/// mutated by the foreground caller, never from follower tasks.
#[derive(Debug, Default)]
pub struct HighlightEngine {
    patterns: Vec<HighlightPattern>,
}

impl HighlightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole pattern collection (used at file-switch time).
    pub fn set_patterns(&mut self, patterns: Vec<HighlightPattern>) {
        self.patterns = patterns;
    }

    pub fn patterns(&self) -> &[HighlightPattern] {
        &self.patterns
    }

    pub fn add_pattern(&mut self, pattern: HighlightPattern) {
        self.patterns.push(pattern);
    }

    /// Remove a pattern by id. Returns true if a pattern was removed.
    pub fn remove_pattern(&mut self, pattern_id: &str) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.id != pattern_id);
        self.patterns.len() != before
    }

    /// Flip a pattern's enabled flag. Returns the new state if the id exists.
    pub fn toggle_pattern(&mut self, pattern_id: &str) -> Option<bool> {
        let pattern = self.patterns.iter_mut().find(|p| p.id == pattern_id)?;
        pattern.enabled = !pattern.enabled;
        Some(pattern.enabled)
    }

    /// Update pattern text, color and regex flag in place, keyed by id.
    pub fn update_pattern(&mut self, updated: &HighlightPattern) -> bool {
        match self.patterns.iter_mut().find(|p| p.id == updated.id) {
            Some(pattern) => {
                pattern.pattern = updated.pattern.clone();
                pattern.color = updated.color.clone();
                pattern.is_regex = updated.is_regex;
                true
            }
            None => false,
        }
    }

    pub fn clear_patterns(&mut self) {
        self.patterns.clear();
    }

    /// Apply a per-file enabled-state override map keyed by pattern id.
    /// Patterns without an entry keep their current (project default) state.
    pub fn apply_enabled_states(&mut self, states: &HashMap<String, bool>) {
        for pattern in &mut self.patterns {
            if let Some(enabled) = states.get(&pattern.id) {
                pattern.enabled = *enabled;
            }
        }
    }

    /// Snapshot the current enabled states for persistence.
    pub fn enabled_states(&self) -> HashMap<String, bool> {
        self.patterns
            .iter()
            .map(|p| (p.id.clone(), p.enabled))
            .collect()
    }

    /// Produce the merged, gap-filled span list for `text`.
    ///
    /// Deterministic for a fixed text and pattern set. An invalid custom
    /// pattern is skipped for this pass with a warning; it never aborts the
    /// pass or affects other patterns.
    pub fn highlight(&self, text: &str) -> Vec<StyleSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut all_matches = self.collect_matches(text);

        // Stable order: by start position, custom before severity on ties.
        all_matches.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| match (a.tier, b.tier) {
                    (MatchTier::Custom, MatchTier::Severity) => std::cmp::Ordering::Less,
                    (MatchTier::Severity, MatchTier::Custom) => std::cmp::Ordering::Greater,
                    _ => std::cmp::Ordering::Equal,
                })
        });

        let accepted = resolve_overlaps(&all_matches, text.len());
        build_spans(accepted, text.len())
    }

    fn collect_matches(&self, text: &str) -> Vec<HighlightMatch> {
        let mut matches = Vec::new();

        for (pattern, style_class) in SEVERITY_PATTERNS {
            // Built-in literals always compile
            if let Ok(matcher) = CompiledMatcher::compile(pattern, false) {
                for (start, end) in matcher.find_ranges(text) {
                    matches.push(HighlightMatch {
                        start,
                        end,
                        style_class: style_class.to_string(),
                        tier: MatchTier::Severity,
                    });
                }
            }
        }

        for pattern in self.patterns.iter().filter(|p| p.enabled) {
            match CompiledMatcher::compile(&pattern.pattern, pattern.is_regex) {
                Ok(matcher) => {
                    let style_class = style_class_for_color(&pattern.color);
                    for (start, end) in matcher.find_ranges(text) {
                        matches.push(HighlightMatch {
                            start,
                            end,
                            style_class: style_class.clone(),
                            tier: MatchTier::Custom,
                        });
                    }
                }
                Err(e) => {
                    warn!("skipping invalid highlight pattern: {}", e);
                }
            }
        }

        matches
    }
}

/// Two-pass greedy overlap resolution over a coverage bitmap: custom matches
/// first in start order, then severity matches that touch no covered position.
fn resolve_overlaps(sorted: &[HighlightMatch], text_len: usize) -> Vec<HighlightMatch> {
    let mut covered = vec![false; text_len];
    let mut accepted: Vec<HighlightMatch> = Vec::new();

    for tier in [MatchTier::Custom, MatchTier::Severity] {
        for m in sorted.iter().filter(|m| m.tier == tier) {
            let end = m.end.min(text_len);
            if m.start >= end {
                continue;
            }
            if covered[m.start..end].iter().any(|c| *c) {
                continue;
            }
            for slot in &mut covered[m.start..end] {
                *slot = true;
            }
            accepted.push(m.clone());
        }
    }

    accepted.sort_by_key(|m| m.start);
    accepted
}

/// Merge accepted matches into a contiguous span list covering `[0, text_len)`.
fn build_spans(accepted: Vec<HighlightMatch>, text_len: usize) -> Vec<StyleSpan> {
    let mut spans = Vec::with_capacity(accepted.len() * 2 + 1);
    let mut last_end = 0;

    for m in accepted {
        if m.start > last_end {
            spans.push(StyleSpan {
                start: last_end,
                end: m.start,
                style_class: None,
            });
        }
        let end = m.end.min(text_len);
        spans.push(StyleSpan {
            start: m.start,
            end,
            style_class: Some(m.style_class),
        });
        last_end = end;
    }

    if last_end < text_len {
        spans.push(StyleSpan {
            start: last_end,
            end: text_len,
            style_class: None,
        });
    }

    spans
}

/// Convenience wrapper matching the sink-facing contract: highlight `text`
/// with `patterns` without constructing a long-lived engine.
pub fn highlight_text(text: &str, patterns: &[HighlightPattern]) -> Result<Vec<StyleSpan>> {
    let mut engine = HighlightEngine::new();
    engine.set_patterns(patterns.to_vec());
    Ok(engine.highlight(text))
}
