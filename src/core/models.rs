//! Core data models for the download and tagging pipeline

use serde::{Deserialize, Serialize};

/// Descriptive tag values applied to every matched audio file.
///
/// The artist value is also written as the album artist, matching the
/// batch-edit contract: one set of values for the whole directory, no
/// per-file overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagFields {
    pub artist: String,

    pub album: String,

    pub genre: String,
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resolution error: {0}")]
    Resolve(String),

    #[error("Metadata unavailable: {0}")]
    Metadata(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("{tool} not found on PATH")]
    ToolMissing { tool: String },

    #[error("{tool} exited with {code:?}: {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Usage error: {0}")]
    Usage(String),
}

impl AppError {
    /// Whether this error means the external executable could not be
    /// spawned at all, as opposed to running and failing.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, Self::ToolMissing { .. })
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_missing_classification() {
        let missing = AppError::ToolMissing {
            tool: "ffmpeg".to_string(),
        };
        assert!(missing.is_tool_missing());

        let failed = AppError::ToolFailed {
            tool: "ffmpeg".to_string(),
            code: Some(1),
            stdout: String::new(),
            stderr: "boom".to_string(),
        };
        assert!(!failed.is_tool_missing());
    }

    #[test]
    fn test_tool_failed_display_includes_code_and_stderr() {
        let failed = AppError::ToolFailed {
            tool: "ffmpeg".to_string(),
            code: Some(187),
            stdout: String::new(),
            stderr: "unknown codec".to_string(),
        };
        let message = failed.to_string();
        assert!(message.contains("ffmpeg"));
        assert!(message.contains("187"));
        assert!(message.contains("unknown codec"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
