//! Error types shared across subfeed crates.

use std::path::PathBuf;

/// Top-level error type for subfeed operations.
#[derive(Debug, thiserror::Error)]
pub enum SubfeedError {
    #[error("Engine error: {message}")]
    Engine { message: String },

    #[error("Event source error: {message}")]
    Source { message: String },

    #[error("Sink backpressure: {message}")]
    Backpressure { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SubfeedError.
pub type SubfeedResult<T> = Result<T, SubfeedError>;

impl SubfeedError {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn backpressure(msg: impl Into<String>) -> Self {
        Self::Backpressure {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is the recoverable backpressure signal from a
    /// downstream sink, which the caller may retry.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::Backpressure { .. })
    }
}
