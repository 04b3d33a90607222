//! Pattern compilation shared by the highlight and filter engines.
//!
//! A pattern specification is either a literal substring or a regular
//! expression. Compilation is pure: a malformed regex yields
//! [`TaillogError::InvalidPattern`] and the caller skips that one pattern,
//! never the whole pass.

use crate::error::{Result, TaillogError};
use regex::{Regex, RegexBuilder};

/// An executable matcher compiled from a pattern specification.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: Regex,
}

impl CompiledMatcher {
    /// Compile a pattern case-insensitively (the highlight engine's policy).
    ///
    /// Literal patterns are escaped so regex metacharacters match themselves.
    pub fn compile(pattern: &str, is_regex: bool) -> Result<Self> {
        Self::compile_with_case(pattern, is_regex, true)
    }

    /// Compile with an explicit case-sensitivity choice.
    ///
    /// The filter engine compiles its rules with `case_insensitive = false`.
    pub fn compile_with_case(pattern: &str, is_regex: bool, case_insensitive: bool) -> Result<Self> {
        let source = if is_regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| TaillogError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self { regex })
    }

    /// Whether the pattern matches anywhere in `text` (non-anchored).
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// All non-overlapping match ranges in `text`, as byte offsets.
    pub fn find_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}
