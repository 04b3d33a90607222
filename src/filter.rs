//! Line filtering: reduces full text to the subset of lines satisfying every
//! enabled filter rule (AND semantics), preserving original line numbers.
//!
//! With zero enabled rules filtering is the identity, not "filter everything
//! out". The engine is uniformly case-sensitive: literal rules use substring
//! containment, regex rules a non-anchored find with no case folding. (The
//! highlight engine is the case-insensitive one; each engine documents its
//! own policy.)

use crate::model::{FilterRule, FilteredLine};
use crate::pattern::CompiledMatcher;
use log::warn;
use std::collections::HashMap;

/// Evaluates filter rules over full text. Owns the mutable rule collection;
/// mutation happens only from the foreground caller.
#[derive(Debug, Default)]
pub struct FilterEngine {
    rules: Vec<FilterRule>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole rule collection (used at file-switch time).
    pub fn set_rules(&mut self, rules: Vec<FilterRule>) {
        self.rules = rules;
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn add_rule(&mut self, rule: FilterRule) {
        self.rules.push(rule);
    }

    /// Remove a rule by id. Returns true if a rule was removed.
    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != rule_id);
        self.rules.len() != before
    }

    /// Flip a rule's enabled flag. Returns the new state if the id exists.
    pub fn toggle_rule(&mut self, rule_id: &str) -> Option<bool> {
        let rule = self.rules.iter_mut().find(|r| r.id == rule_id)?;
        rule.enabled = !rule.enabled;
        Some(rule.enabled)
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    /// Apply a per-file enabled-state override map keyed by rule id.
    pub fn apply_enabled_states(&mut self, states: &HashMap<String, bool>) {
        for rule in &mut self.rules {
            if let Some(enabled) = states.get(&rule.id) {
                rule.enabled = *enabled;
            }
        }
    }

    /// Snapshot the current enabled states for persistence.
    pub fn enabled_states(&self) -> HashMap<String, bool> {
        self.rules
            .iter()
            .map(|r| (r.id.clone(), r.enabled))
            .collect()
    }

    /// Number of currently enabled rules.
    pub fn active_rule_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }

    pub fn has_active_rules(&self) -> bool {
        self.active_rule_count() > 0
    }

    /// Whether a single line satisfies every enabled rule.
    pub fn matches_filters(&self, line: &str) -> bool {
        let matchers = self.compile_enabled();
        matchers.iter().all(|m| m.is_match(line))
    }

    /// Filter `text` into the lines satisfying every enabled rule, tagged with
    /// their original 1-based line numbers.
    ///
    /// An invalid regex rule is excluded from evaluation for this call with a
    /// warning; it never causes the pass to reject everything.
    pub fn filter_content(&self, text: &str) -> Vec<FilteredLine> {
        if text.is_empty() {
            return Vec::new();
        }

        let matchers = self.compile_enabled();

        split_lines(text)
            .enumerate()
            .filter(|(_, line)| matchers.iter().all(|m| m.is_match(line)))
            .map(|(idx, line)| FilteredLine::new(idx + 1, line))
            .collect()
    }

    fn compile_enabled(&self) -> Vec<CompiledMatcher> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .filter_map(
                |r| match CompiledMatcher::compile_with_case(&r.pattern, r.is_regex, false) {
                    Ok(matcher) => Some(matcher),
                    Err(e) => {
                        warn!("skipping invalid filter rule: {}", e);
                        None
                    }
                },
            )
            .collect()
    }
}

/// Split text into lines: a line is a run of characters up to and including a
/// terminator, with the terminator stripped from the yielded content. A
/// trailing unterminated fragment is a line; a trailing terminator does not
/// produce an empty final line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
        .map(|line| line.trim_end_matches('\n').trim_end_matches('\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_LINES: &str = "starting up\nERROR boom\nshutting down\n";

    #[test]
    fn empty_rule_set_is_identity() {
        let engine = FilterEngine::new();
        let lines = engine.filter_content(THREE_LINES);

        assert_eq!(
            lines,
            vec![
                FilteredLine::new(1, "starting up"),
                FilteredLine::new(2, "ERROR boom"),
                FilteredLine::new(3, "shutting down"),
            ]
        );
    }

    #[test]
    fn literal_rule_keeps_matching_lines_only() {
        let mut engine = FilterEngine::new();
        engine.add_rule(FilterRule::new("ERROR"));

        let lines = engine.filter_content(THREE_LINES);
        assert_eq!(lines, vec![FilteredLine::new(2, "ERROR boom")]);
    }

    #[test]
    fn literal_rules_are_case_sensitive() {
        let mut engine = FilterEngine::new();
        engine.add_rule(FilterRule::new("error"));

        assert!(engine.filter_content(THREE_LINES).is_empty());
    }

    #[test]
    fn and_semantics_across_rules() {
        let mut engine = FilterEngine::new();
        engine.add_rule(FilterRule::new("ERROR"));
        engine.add_rule(FilterRule::new_regex(r"b\w+m"));

        let text = "ERROR only\nboom only\nERROR boom\n";
        let lines = engine.filter_content(text);
        assert_eq!(lines, vec![FilteredLine::new(3, "ERROR boom")]);

        // Every output line satisfies every enabled rule
        for line in &lines {
            assert!(engine.matches_filters(&line.content));
        }
    }

    #[test]
    fn disabled_rules_do_not_participate() {
        let mut engine = FilterEngine::new();
        let mut rule = FilterRule::new("ERROR");
        rule.enabled = false;
        engine.add_rule(rule);

        assert_eq!(engine.filter_content(THREE_LINES).len(), 3);
        assert_eq!(engine.active_rule_count(), 0);
        assert!(!engine.has_active_rules());
    }

    #[test]
    fn invalid_regex_rule_is_excluded_for_the_call() {
        let mut engine = FilterEngine::new();
        engine.add_rule(FilterRule::new_regex("["));
        engine.add_rule(FilterRule::new("ERROR"));

        let lines = engine.filter_content(THREE_LINES);
        assert_eq!(lines, vec![FilteredLine::new(2, "ERROR boom")]);
    }

    #[test]
    fn trailing_fragment_is_a_line() {
        let engine = FilterEngine::new();
        let lines = engine.filter_content("complete\npartial");

        assert_eq!(
            lines,
            vec![
                FilteredLine::new(1, "complete"),
                FilteredLine::new(2, "partial"),
            ]
        );
    }

    #[test]
    fn trailing_terminator_creates_no_empty_line() {
        let engine = FilterEngine::new();
        assert_eq!(engine.filter_content("one\n").len(), 1);
        assert!(engine.filter_content("").is_empty());
    }

    #[test]
    fn crlf_terminators_are_stripped() {
        let engine = FilterEngine::new();
        let lines = engine.filter_content("a\r\nb\r\n");
        assert_eq!(
            lines,
            vec![FilteredLine::new(1, "a"), FilteredLine::new(2, "b")]
        );
    }

    #[test]
    fn interior_empty_lines_keep_their_numbers() {
        let mut engine = FilterEngine::new();
        engine.add_rule(FilterRule::new("x"));

        let lines = engine.filter_content("x\n\nx\n");
        assert_eq!(
            lines,
            vec![FilteredLine::new(1, "x"), FilteredLine::new(3, "x")]
        );
    }

    #[test]
    fn toggle_and_enabled_states() {
        let mut engine = FilterEngine::new();
        let rule = FilterRule::new("keep");
        let id = rule.id.clone();
        engine.add_rule(rule);

        assert_eq!(engine.toggle_rule(&id), Some(false));
        let states = engine.enabled_states();
        assert_eq!(states.get(&id), Some(&false));

        engine.apply_enabled_states(&HashMap::from([(id.clone(), true)]));
        assert!(engine.rules()[0].enabled);

        assert!(engine.remove_rule(&id));
        assert!(engine.rules().is_empty());
    }
}
