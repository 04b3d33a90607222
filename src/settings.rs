//! Settings persistence: highlight patterns, filter rules, per-file
//! enabled-state overrides and bookmarks.
//!
//! Patterns and rules live at a project-default level; each file additionally
//! carries an enabled/disabled override map keyed by pattern/rule id, plus
//! optional file-specific filter rules and bookmarks. Per-file data is
//! namespaced by [`file_key`], a stable opaque derivation from the absolute
//! path.
//!
//! Loading is forgiving: a missing or corrupt settings file yields defaults
//! with a log line, never an error — one broken JSON file must not take the
//! viewer down.

use crate::error::{Result, TaillogError};
use crate::filter::FilterEngine;
use crate::highlight::HighlightEngine;
use crate::model::{Bookmark, FilterRule, HighlightPattern};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Project-level (file-independent) defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub highlights: Vec<HighlightPattern>,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
}

/// Persistence interface the core depends on. The JSON implementation below
/// is the default; tests and embedders may substitute their own.
pub trait SettingsStore {
    fn load_project_settings(&self) -> ProjectSettings;
    fn save_project_settings(&self, settings: &ProjectSettings) -> Result<()>;

    /// File-specific highlight patterns; empty means "use project defaults".
    fn load_highlight_patterns(&self, file: &Path) -> Vec<HighlightPattern>;
    fn save_highlight_patterns(&self, file: &Path, patterns: &[HighlightPattern]) -> Result<()>;

    /// File-specific filter rules; empty means "use project defaults".
    fn load_filter_rules(&self, file: &Path) -> Vec<FilterRule>;
    fn save_filter_rules(&self, file: &Path, rules: &[FilterRule]) -> Result<()>;

    fn load_highlight_states(&self, file: &Path) -> HashMap<String, bool>;
    fn save_highlight_states(&self, file: &Path, states: &HashMap<String, bool>) -> Result<()>;

    fn load_filter_states(&self, file: &Path) -> HashMap<String, bool>;
    fn save_filter_states(&self, file: &Path, states: &HashMap<String, bool>) -> Result<()>;

    fn load_bookmarks(&self, file: &Path) -> Vec<Bookmark>;
    fn save_bookmarks(&self, file: &Path, bookmarks: &[Bookmark]) -> Result<()>;
}

/// Stable, collision-resistant key for per-file settings files (FNV-1a over
/// the path bytes, hex-encoded).
pub fn file_key(path: &Path) -> String {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in path.as_os_str().as_encoded_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:016x}")
}

/// JSON-on-disk settings store rooted at `~/.taillog` by default.
pub struct JsonSettingsStore {
    root: PathBuf,
}

impl JsonSettingsStore {
    /// Store rooted under the user's home directory.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| TaillogError::settings("cannot determine home directory"))?;
        Ok(Self::with_root(home.join(".taillog")))
    }

    /// Store rooted at an explicit directory (used by tests).
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn per_file(&self, prefix: &str, file: &Path) -> PathBuf {
        self.path_for(&format!("{prefix}_{}.json", file_key(file)))
    }

    fn load_json<T: DeserializeOwned + Default>(&self, path: &Path) -> T {
        if !path.exists() {
            return T::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(e) => {
                    warn!("ignoring corrupt settings file {}: {e}", path.display());
                    T::default()
                }
            },
            Err(e) => {
                warn!("failed to read settings file {}: {e}", path.display());
                T::default()
            }
        }
    }

    fn save_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| TaillogError::file_error("Failed to create settings directory", e))?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| TaillogError::settings(format!("serialization failed: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| TaillogError::file_error("Failed to write settings file", e))?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load_project_settings(&self) -> ProjectSettings {
        self.load_json(&self.path_for("project.json"))
    }

    fn save_project_settings(&self, settings: &ProjectSettings) -> Result<()> {
        self.save_json(&self.path_for("project.json"), settings)
    }

    fn load_highlight_patterns(&self, file: &Path) -> Vec<HighlightPattern> {
        self.load_json(&self.per_file("highlights", file))
    }

    fn save_highlight_patterns(&self, file: &Path, patterns: &[HighlightPattern]) -> Result<()> {
        self.save_json(&self.per_file("highlights", file), &patterns)
    }

    fn load_filter_rules(&self, file: &Path) -> Vec<FilterRule> {
        self.load_json(&self.per_file("filters", file))
    }

    fn save_filter_rules(&self, file: &Path, rules: &[FilterRule]) -> Result<()> {
        self.save_json(&self.per_file("filters", file), &rules)
    }

    fn load_highlight_states(&self, file: &Path) -> HashMap<String, bool> {
        self.load_json(&self.per_file("highlight_states", file))
    }

    fn save_highlight_states(&self, file: &Path, states: &HashMap<String, bool>) -> Result<()> {
        self.save_json(&self.per_file("highlight_states", file), states)
    }

    fn load_filter_states(&self, file: &Path) -> HashMap<String, bool> {
        self.load_json(&self.per_file("filter_states", file))
    }

    fn save_filter_states(&self, file: &Path, states: &HashMap<String, bool>) -> Result<()> {
        self.save_json(&self.per_file("filter_states", file), states)
    }

    fn load_bookmarks(&self, file: &Path) -> Vec<Bookmark> {
        self.load_json(&self.per_file("bookmarks", file))
    }

    fn save_bookmarks(&self, file: &Path, bookmarks: &[Bookmark]) -> Result<()> {
        self.save_json(&self.per_file("bookmarks", file), &bookmarks)
    }
}

/// Inject stored settings into the engines at file-switch time: project
/// defaults first, then file-specific filter rules if any exist, then the
/// per-file enabled-state overrides.
pub fn configure_engines(
    store: &dyn SettingsStore,
    file: &Path,
    highlight: &mut HighlightEngine,
    filter: &mut FilterEngine,
) {
    let project = store.load_project_settings();

    let file_patterns = store.load_highlight_patterns(file);
    highlight.set_patterns(if file_patterns.is_empty() {
        project.highlights
    } else {
        file_patterns
    });
    highlight.apply_enabled_states(&store.load_highlight_states(file));

    let file_rules = store.load_filter_rules(file);
    filter.set_rules(if file_rules.is_empty() {
        project.filters
    } else {
        file_rules
    });
    filter.apply_enabled_states(&store.load_filter_states(file));
}
