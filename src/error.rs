//! Error types for organize runs.
//!
//! `OrganizeError` is fatal for a whole run (bad config, uncreatable output
//! root, unreadable manifest). `PlacementError` is scoped to one file and is
//! recorded in that file's outcome while the batch continues.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot create output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock output directory {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OrganizeError>;

/// Failure of a single file placement
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free name for {} after {attempts} attempts", .path.display())]
    NamesExhausted { path: PathBuf, attempts: u32 },
}

impl PlacementError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
