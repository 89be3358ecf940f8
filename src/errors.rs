/*!
 * Error types for the subcondense application.
 *
 * The condensing core reports typed errors through `CondenseError`, built with the
 * thiserror crate. The application layer wraps them in `anyhow` with extra context.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while condensing a video
#[derive(Error, Debug)]
pub enum CondenseError {
    /// A caption or source violates its structural contract
    #[error("Validation error: {0}")]
    Validation(String),

    /// The subtitle source format is not recognized
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// A required input file or working directory is missing
    #[error("Resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// ffmpeg/ffprobe (or another media tool) reported a failure
    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool {
        /// Name of the tool that failed
        tool: String,
        /// Filtered diagnostic output
        message: String,
    },

    /// An internal contract between grouping and rebasing was broken
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),
}

impl CondenseError {
    /// Shorthand for an external tool failure
    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CondenseError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Result alias used throughout the condensing core
pub type CondenseResult<T> = std::result::Result<T, CondenseError>;
