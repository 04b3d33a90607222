//! Candidate log file discovery for a folder.
//!
//! Thin collaborator-facing helper: lists regular `.log`/`.txt` files one
//! level deep, sorted by name. A missing or non-directory path yields an
//! empty list rather than an error.

use std::path::{Path, PathBuf};

const LOG_EXTENSIONS: [&str; 2] = ["log", "txt"];

fn is_log_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            LOG_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

/// File names of log candidates directly inside `folder`, sorted.
pub fn log_files(folder: &Path) -> Vec<String> {
    log_files_full_paths(folder)
        .into_iter()
        .filter_map(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .collect()
}

/// Full paths of log candidates directly inside `folder`, sorted.
pub fn log_files_full_paths(folder: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_log_file(path))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_log_and_txt_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.log"), "").unwrap();
        std::fs::write(dir.path().join("a.TXT"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub.log")).unwrap();

        assert_eq!(log_files(dir.path()), vec!["a.TXT", "b.log"]);
    }

    #[test]
    fn missing_folder_yields_empty_list() {
        assert!(log_files(Path::new("/no/such/folder")).is_empty());
    }

    #[test]
    fn extension_matching_ignores_case() {
        assert!(is_log_file(Path::new("a.LOG")));
        assert!(is_log_file(Path::new("a.txt")));
        assert!(!is_log_file(Path::new("a.logx")));
        assert!(!is_log_file(Path::new("noext")));
    }
}
