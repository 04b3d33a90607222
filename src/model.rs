//! Persistent data model shared by the highlight/filter engines and the
//! settings store.
//!
//! Ids are assigned once at construction and never change afterwards; the
//! per-file enabled-state maps in the settings store are keyed by them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined highlight pattern with an associated color.
///
/// `color` is normalized to `#rrggbb` before a style class is derived from it;
/// see [`crate::highlight::normalize_color`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightPattern {
    pub id: String,
    pub pattern: String,
    pub color: String,
    #[serde(rename = "isRegex")]
    pub is_regex: bool,
    pub enabled: bool,
}

impl HighlightPattern {
    /// Create a new enabled literal pattern with a fresh id.
    pub fn new(pattern: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pattern: pattern.into(),
            color: color.into(),
            is_regex: false,
            enabled: true,
        }
    }

    /// Create a new enabled regex pattern with a fresh id.
    pub fn new_regex(pattern: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            ..Self::new(pattern, color)
        }
    }
}

/// A line filter rule. Enabled rules combine with AND semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: String,
    pub pattern: String,
    #[serde(rename = "isRegex")]
    pub is_regex: bool,
    pub enabled: bool,
}

impl FilterRule {
    /// Create a new enabled literal rule with a fresh id.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pattern: pattern.into(),
            is_regex: false,
            enabled: true,
        }
    }

    /// Create a new enabled regex rule with a fresh id.
    pub fn new_regex(pattern: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            ..Self::new(pattern)
        }
    }
}

/// A line that survived filtering, tagged with its position in the unfiltered
/// text so downstream features (bookmarks, "go to line") keep working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredLine {
    /// 1-based line number in the original text.
    pub line_number: usize,
    pub content: String,
}

impl FilteredLine {
    pub fn new(line_number: usize, content: impl Into<String>) -> Self {
        Self {
            line_number,
            content: content.into(),
        }
    }
}

/// A bookmarked line, persisted per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    #[serde(rename = "lineNumber")]
    pub line_number: usize,
    #[serde(rename = "linePreview")]
    pub line_preview: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Bookmark {
    pub fn new(line_number: usize, line_preview: impl Into<String>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            id: Uuid::new_v4().to_string(),
            line_number,
            line_preview: line_preview.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_patterns_get_unique_ids() {
        let a = HighlightPattern::new("ERROR", "#ff0000");
        let b = HighlightPattern::new("ERROR", "#ff0000");
        assert_ne!(a.id, b.id);
        assert!(a.enabled);
        assert!(!a.is_regex);
    }

    #[test]
    fn regex_constructors_set_flag() {
        assert!(HighlightPattern::new_regex(r"\d+", "#00ff00").is_regex);
        assert!(FilterRule::new_regex(r"\d+").is_regex);
        assert!(!FilterRule::new("plain").is_regex);
    }

    #[test]
    fn serde_round_trip_uses_original_field_names() {
        let rule = FilterRule::new_regex("foo.*bar");
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"isRegex\":true"));

        let back: FilterRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
