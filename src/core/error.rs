//! Error types for the streaming world.
//!
//! Missing chunks are never errors (lookups return `None`). What remains are the
//! recoverable failures a caller can act on: bad configuration and persistence I/O.

use std::path::PathBuf;

/// Failures raised by a `ChunkStore` while saving or loading a chunk.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error for chunk {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Corrupted snapshot for chunk {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

/// Failures raised while loading or validating a `WorldConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level error returned by `run()` and session construction.
#[derive(Debug, thiserror::Error)]
pub enum VoxelError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
