//! Error types for PacketPress.
//!
//! Library crates use [`PacketPressError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PacketPress operations.
#[derive(Debug, thiserror::Error)]
pub enum PacketPressError {
    /// Malformed manifest: empty slot collection, duplicate slot ids.
    /// Raised at construction time, never during a run.
    #[error("manifest error: {message}")]
    Manifest { message: String },

    /// Invalid filename pattern (e.g. a bad `regex:` expression) for one
    /// slot. Recovered locally: the slot degrades to `Missing`.
    #[error("pattern error: {message}")]
    Pattern { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The file index for the source root could not be obtained.
    #[error("index error: {0}")]
    Index(String),

    /// An external fetch failed for a matched path.
    #[error("retrieval error for slot '{slot}' ({path}): {message}")]
    Retrieval {
        slot: String,
        path: String,
        message: String,
    },

    /// Fatal merge failure (no valid inputs remained).
    #[error("assembly error: {0}")]
    Assembly(String),

    /// A content generator failed to produce its output.
    #[error("generator '{name}' failed: {message}")]
    Generator { name: String, message: String },

    /// Progress sink failure. Logged by the pipeline, never escalated.
    #[error("progress sink error: {0}")]
    Progress(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PacketPressError>;

impl PacketPressError {
    /// Create a manifest error from any displayable message.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest {
            message: msg.into(),
        }
    }

    /// Create a pattern error from any displayable message.
    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::Pattern {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
