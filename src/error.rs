//! Error types and handling infrastructure for taillog.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types and `anyhow` for application-level error handling with context.
//!
//! ## Design Principles
//!
//! - **Isolation**: one bad pattern never aborts a highlight/filter pass, and one
//!   follower's I/O trouble never affects other followers
//! - **User-friendly messages**: errors surfaced for explicit user actions should
//!   provide actionable feedback
//! - **Consistency**: standardized Result type across all modules

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for taillog operations.
///
/// This enum covers all error conditions that can occur during file tailing,
/// pattern compilation, and settings persistence.
#[derive(Error, Debug)]
pub enum TaillogError {
    /// File system related errors (permission denied, locked file, etc.)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Path is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// A highlight or filter pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Settings persistence errors (unreadable store directory, bad JSON, etc.)
    #[error("Settings error: {message}")]
    SettingsError { message: String },

    /// Tail session lifecycle errors (double start, unknown path, etc.)
    #[error("Session error: {message}")]
    SessionError { message: String },

    /// Invalid command line arguments
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for taillog operations.
pub type Result<T> = std::result::Result<T, TaillogError>;

impl TaillogError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create an InvalidPattern error for a pattern that failed to compile
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a SettingsError with a descriptive message
    pub fn settings(message: impl Into<String>) -> Self {
        Self::SettingsError {
            message: message.into(),
        }
    }

    /// Create a SessionError with a descriptive message
    pub fn session(message: impl Into<String>) -> Self {
        Self::SessionError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the error is a transient I/O condition a follower should retry
    /// on its next poll tick rather than escalate.
    pub fn is_transient_io(&self) -> bool {
        matches!(self, Self::FileError { .. })
    }
}

// Automatic conversion from io::Error to TaillogError
impl From<std::io::Error> for TaillogError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                // For NotFound, we lose the specific path context here,
                // but it can be added at the call site using FileNotFound
                Self::FileError {
                    message: "File not found".to_string(),
                    source: err,
                }
            }
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_messages() {
        let path = PathBuf::from("/test/file.log");

        let file_not_found = TaillogError::FileNotFound { path: path.clone() };
        assert_eq!(file_not_found.to_string(), "File not found: /test/file.log");

        let not_a_file = TaillogError::NotAFile { path };
        assert_eq!(
            not_a_file.to_string(),
            "Path is not a regular file: /test/file.log"
        );

        let bad_pattern = TaillogError::invalid_pattern("[", "unclosed character class");
        assert_eq!(
            bad_pattern.to_string(),
            "Invalid pattern '[': unclosed character class"
        );
    }

    #[test]
    fn test_error_constructors() {
        let settings_err = TaillogError::settings("store directory unwritable");
        assert!(matches!(settings_err, TaillogError::SettingsError { .. }));

        let session_err = TaillogError::session("no foreground session");
        assert!(matches!(session_err, TaillogError::SessionError { .. }));

        let other_err = TaillogError::other("Unknown error");
        assert!(matches!(other_err, TaillogError::Other { .. }));
    }

    #[test]
    fn test_io_error_conversion_is_transient() {
        let io_err = std::io::Error::new(std::io::ErrorKind::WouldBlock, "locked");
        let err: TaillogError = io_err.into();

        assert!(err.is_transient_io());
        match err {
            TaillogError::FileError { message, .. } => {
                assert_eq!(message, "IO operation failed");
            }
            _ => panic!("Expected FileError variant"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<String> {
            Ok("success".to_string())
        }

        assert_eq!(returns_result().unwrap(), "success");
    }
}
